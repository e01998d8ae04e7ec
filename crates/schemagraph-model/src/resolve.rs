//! Reference resolution and cycle-safe dependency walks

use crate::error::Result;
use crate::options::ResolveOptions;
use crate::reference::RefTarget;
use crate::symbol_set::SymbolSet;
use crate::{Corpus, NodeId, ObjectType};

fn kind_matches(wanted: Option<ObjectType>, found: ObjectType) -> bool {
    wanted.map_or(true, |wanted| wanted == found)
}

impl Corpus {
    fn find_in_document(&self, doc: NodeId, name: &str, wanted: Option<ObjectType>) -> Option<NodeId> {
        let document = self.get(doc)?.kind().document()?;
        document.definitions.iter().copied().find(|&def| {
            self.name_of(def) == Some(name) && self.get(def).is_some_and(|n| kind_matches(wanted, n.object_type()))
        })
    }

    /// Documents searched for a plain name, in order: the referencing
    /// document, `wrt_doc`, then the referencing document's imports.
    fn search_documents(&self, reference: NodeId, res_opt: &ResolveOptions) -> Vec<NodeId> {
        let mut docs = Vec::new();
        let home = self.in_document(reference);
        docs.extend(home);
        docs.extend(res_opt.wrt_doc);

        if let Some(home) = home.and_then(|doc| self.get(doc)).and_then(|n| n.kind().document()) {
            let base = home.corpus_path();
            for import in &home.imports {
                let resolved = self
                    .context()
                    .storage
                    .create_absolute_corpus_path(&import.corpus_path, Some(&base))
                    .and_then(|path| self.document_by_path(&path));
                docs.extend(resolved);
            }
        }
        docs.dedup();
        docs
    }

    /// The definition a reference points at.
    ///
    /// Definitions resolve to themselves and explicit references to their
    /// inline definition. Named references accept `Doc.cdm.json/Name`
    /// (relative to the referencing document) or a bare name, which is
    /// looked up in the search documents and then across every registered
    /// document. A miss is `Ok(None)`.
    pub fn fetch_object_definition(&self, reference: NodeId, res_opt: &ResolveOptions) -> Result<Option<NodeId>> {
        let node = self.node(reference)?;
        let Some(r) = node.as_reference() else {
            return Ok(Some(reference));
        };
        let name = match &r.target {
            RefTarget::Explicit(def) => return Ok(Some(*def)),
            RefTarget::Named(name) => name.as_str(),
        };
        let wanted = r.object_type().definition_for_reference();

        let found = match name.rsplit_once('/') {
            Some((doc_part, symbol)) => {
                let base = self.document_path(reference);
                self.context()
                    .storage
                    .create_absolute_corpus_path(doc_part, base.as_deref())
                    .and_then(|path| self.document_by_path(&path))
                    .and_then(|doc| self.find_in_document(doc, symbol, wanted))
            }
            None => self
                .search_documents(reference, res_opt)
                .into_iter()
                .find_map(|doc| self.find_in_document(doc, name, wanted))
                .or_else(|| {
                    self.definitions_named(name)
                        .iter()
                        .copied()
                        .find(|&def| kind_matches(wanted, self.node_unchecked(def).object_type()))
                }),
        };

        if found.is_none() {
            tracing::debug!(reference = %reference, name, "unable to resolve reference");
        }
        Ok(found)
    }

    /// Whether `def` is `base` or extends it, directly or transitively.
    /// Extension cycles end the search.
    pub fn is_derived_from(&self, def: NodeId, base: &str, res_opt: &ResolveOptions) -> Result<bool> {
        let mut seen = SymbolSet::new();
        let mut current = self.fetch_object_definition(def, res_opt)?;

        while let Some(id) = current {
            let Some(name) = self.name_of(id) else {
                break;
            };
            if name == base {
                return Ok(true);
            }
            if !seen.add(name) {
                tracing::debug!(symbol = name, "extension cycle");
                break;
            }
            current = match self.node(id)?.kind().extends() {
                Some(extends) if self.name_of(extends) == Some(base) => return Ok(true),
                Some(extends) => self.fetch_object_definition(extends, res_opt)?,
                None => None,
            };
        }
        Ok(false)
    }

    /// Add every symbol `id` depends on to `symbols`, following resolved
    /// definitions. Symbols already present are neither resolved nor
    /// descended into again.
    pub fn collect_symbol_dependencies(
        &self,
        id: NodeId,
        res_opt: &ResolveOptions,
        symbols: &mut SymbolSet,
    ) -> Result<()> {
        for node_id in self.subtree(id)? {
            let Some(name) = self
                .node_unchecked(node_id)
                .as_reference()
                .and_then(|r| r.named_reference())
            else {
                continue;
            };
            if !symbols.add(name) {
                continue;
            }
            if let Some(def) = self.fetch_object_definition(node_id, res_opt)? {
                self.collect_symbol_dependencies(def, res_opt, symbols)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{EntityDef, EntityAttributeDef, TraitDef};
    use crate::document::{DocumentDef, ImportDef};
    use crate::node::NodeKind;
    use schemagraph_storage::StorageManager;

    fn corpus() -> Corpus {
        let storage = StorageManager::new();
        storage.set_default_namespace("local");
        Corpus::with_storage(storage)
    }

    fn document(corpus: &mut Corpus, name: &str) -> NodeId {
        corpus.make_object(NodeKind::Document(DocumentDef::new(name, "local:/")))
    }

    fn entity(corpus: &mut Corpus, doc: NodeId, name: &str, extends: Option<&str>) -> NodeId {
        let mut def = EntityDef::new(name);
        def.extends_entity = extends.map(|e| corpus.make_ref(ObjectType::EntityRef, e, true));
        let id = corpus.make_object(NodeKind::Entity(def));
        corpus.add_definition(doc, id).unwrap();
        id
    }

    /// Entity attribute of type `target` on `entity`; returns the reference.
    fn points_at(corpus: &mut Corpus, entity: NodeId, attr_name: &str, target: &str) -> NodeId {
        let reference = corpus.make_ref(ObjectType::EntityRef, target, true);
        let mut attr = EntityAttributeDef::new(attr_name);
        attr.entity = Some(reference);
        let attr = corpus.make_object(NodeKind::EntityAttribute(attr));
        corpus.add_attribute(entity, attr).unwrap();
        reference
    }

    #[test]
    fn named_reference_resolves_in_its_document() {
        let mut corpus = corpus();
        let doc = document(&mut corpus, "Sales.cdm.json");
        let customer = entity(&mut corpus, doc, "Customer", None);
        let order = entity(&mut corpus, doc, "Order", None);
        let reference = points_at(&mut corpus, order, "customer", "Customer");

        let found = corpus.fetch_object_definition(reference, &ResolveOptions::default()).unwrap();
        assert_eq!(found, Some(customer));
    }

    #[test]
    fn kind_filter_skips_same_named_definitions_of_other_kinds() {
        let mut corpus = corpus();
        let doc = document(&mut corpus, "Mixed.cdm.json");
        let trait_def = corpus.make_object(NodeKind::Trait(TraitDef::new("Customer")));
        corpus.add_definition(doc, trait_def).unwrap();
        let customer = entity(&mut corpus, doc, "Customer", None);
        let order = entity(&mut corpus, doc, "Order", None);
        let reference = points_at(&mut corpus, order, "customer", "Customer");

        let found = corpus.fetch_object_definition(reference, &ResolveOptions::default()).unwrap();
        assert_eq!(found, Some(customer));
    }

    #[test]
    fn document_qualified_names_and_imports() {
        let mut corpus = corpus();
        let customer_doc = document(&mut corpus, "Customer.cdm.json");
        let customer = entity(&mut corpus, customer_doc, "Customer", None);
        corpus.register_document(customer_doc).unwrap();

        let order_doc = document(&mut corpus, "Order.cdm.json");
        let order = entity(&mut corpus, order_doc, "Order", None);
        let qualified = points_at(&mut corpus, order, "billTo", "Customer.cdm.json/Customer");
        let plain = points_at(&mut corpus, order, "shipTo", "Customer");

        let res_opt = ResolveOptions::default();
        assert_eq!(corpus.fetch_object_definition(qualified, &res_opt).unwrap(), Some(customer));

        if let Some(doc) = corpus.get_mut(order_doc).and_then(|n| n.as_document_mut()) {
            doc.imports.push(ImportDef {
                corpus_path: "Customer.cdm.json".into(),
                moniker: None,
            });
        }
        assert_eq!(corpus.fetch_object_definition(plain, &res_opt).unwrap(), Some(customer));
    }

    #[test]
    fn wrt_doc_is_searched_before_global_index() {
        let mut corpus = corpus();
        let first = document(&mut corpus, "First.cdm.json");
        let first_customer = entity(&mut corpus, first, "Customer", None);
        corpus.register_document(first).unwrap();
        let second = document(&mut corpus, "Second.cdm.json");
        let second_customer = entity(&mut corpus, second, "Customer", None);
        corpus.register_document(second).unwrap();

        let loose = corpus.make_ref(ObjectType::EntityRef, "Customer", true);
        let global = corpus.fetch_object_definition(loose, &ResolveOptions::default()).unwrap();
        assert_eq!(global, Some(first_customer));

        let scoped = corpus
            .fetch_object_definition(loose, &ResolveOptions::with_wrt_doc(second))
            .unwrap();
        assert_eq!(scoped, Some(second_customer));
    }

    #[test]
    fn unresolved_reference_is_none() {
        let mut corpus = corpus();
        let reference = corpus.make_ref(ObjectType::EntityRef, "Nowhere", true);
        assert_eq!(
            corpus.fetch_object_definition(reference, &ResolveOptions::default()).unwrap(),
            None
        );
    }

    #[test]
    fn derivation_follows_extends_and_stops_on_cycles() {
        let mut corpus = corpus();
        let doc = document(&mut corpus, "Base.cdm.json");
        entity(&mut corpus, doc, "Thing", None);
        entity(&mut corpus, doc, "Party", Some("Thing"));
        let customer = entity(&mut corpus, doc, "Customer", Some("Party"));
        let a = entity(&mut corpus, doc, "A", Some("B"));
        entity(&mut corpus, doc, "B", Some("A"));

        let res_opt = ResolveOptions::default();
        assert!(corpus.is_derived_from(customer, "Thing", &res_opt).unwrap());
        assert!(corpus.is_derived_from(customer, "Customer", &res_opt).unwrap());
        assert!(!corpus.is_derived_from(customer, "Order", &res_opt).unwrap());
        assert!(!corpus.is_derived_from(a, "C", &res_opt).unwrap());
    }

    #[test]
    fn mutual_references_terminate() {
        let mut corpus = corpus();
        let doc = document(&mut corpus, "Loop.cdm.json");
        let a = entity(&mut corpus, doc, "A", None);
        let b = entity(&mut corpus, doc, "B", None);
        points_at(&mut corpus, a, "b", "B");
        points_at(&mut corpus, b, "a", "A");
        points_at(&mut corpus, b, "missing", "Ghost");

        let mut symbols = SymbolSet::new();
        corpus
            .collect_symbol_dependencies(a, &ResolveOptions::default(), &mut symbols)
            .unwrap();
        assert_eq!(symbols.sorted(), vec!["A", "B", "Ghost"]);
    }
}
