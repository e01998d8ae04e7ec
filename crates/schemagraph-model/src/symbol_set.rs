//! Set of definition names seen during a recursive walk

use ahash::AHashSet;

/// Accumulates symbol names so recursive resolution can stop on cycles.
///
/// Callers check membership before descending into a symbol and add it
/// afterwards; `A -> B -> A` then terminates at the second `A`. Iteration
/// order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    symbols: AHashSet<String>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns `true` if the symbol was not present before.
    pub fn add(&mut self, symbol: impl Into<String>) -> bool {
        self.symbols.insert(symbol.into())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Union `other` into this set; `None` leaves it untouched.
    pub fn merge(&mut self, other: Option<&SymbolSet>) {
        if let Some(other) = other {
            self.symbols.extend(other.symbols.iter().cloned());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.iter().map(String::as_str)
    }

    /// Members in lexical order, for stable output.
    pub fn sorted(&self) -> Vec<String> {
        let mut out: Vec<String> = self.symbols.iter().cloned().collect();
        out.sort();
        out
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SymbolSet::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for SymbolSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for symbol in iter {
            self.add(symbol);
        }
    }
}
