//! Plain properties stored as traits with a single argument
//!
//! `description` on a partition is really the `is.localized.describedAs`
//! trait with the text as its first argument. The map reads and writes those
//! traits so callers can treat them as ordinary optional strings.

use crate::error::{ModelError, Result};
use crate::node::NodeKind;
use crate::reference::{ArgumentDef, ArgumentValue};
use crate::{Corpus, NodeId, ObjectType};

/// Properties backed by a trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitProperty {
    Description,
    DisplayName,
    SourceName,
    Version,
}

impl TraitProperty {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "description" => Some(TraitProperty::Description),
            "displayName" => Some(TraitProperty::DisplayName),
            "sourceName" => Some(TraitProperty::SourceName),
            "version" => Some(TraitProperty::Version),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TraitProperty::Description => "description",
            TraitProperty::DisplayName => "displayName",
            TraitProperty::SourceName => "sourceName",
            TraitProperty::Version => "version",
        }
    }

    pub fn trait_name(self) -> &'static str {
        match self {
            TraitProperty::Description => "is.localized.describedAs",
            TraitProperty::DisplayName => "is.localized.displayedAs",
            TraitProperty::SourceName => "is.CDS.sourceNamed",
            TraitProperty::Version => "is.CDM.entityVersion",
        }
    }
}

/// Trait-backed property accessors for one host node.
#[derive(Debug, Clone, Copy)]
pub struct TraitToPropertyMap {
    host: NodeId,
}

impl TraitToPropertyMap {
    pub fn new(host: NodeId) -> Self {
        Self { host }
    }

    fn property(name: &str) -> Result<TraitProperty> {
        TraitProperty::from_name(name).ok_or_else(|| ModelError::UnknownProperty(name.to_string()))
    }

    fn traits(&self, corpus: &Corpus) -> Result<Vec<NodeId>> {
        let node = corpus.node(self.host)?;
        node.kind()
            .traits()
            .cloned()
            .ok_or(ModelError::MissingCapability {
                id: self.host,
                object_type: node.object_type(),
                capability: "trait-backed properties",
            })
    }

    fn find_trait(&self, corpus: &Corpus, trait_name: &str) -> Result<Option<NodeId>> {
        Ok(self
            .traits(corpus)?
            .into_iter()
            .find(|&t| corpus.name_of(t) == Some(trait_name)))
    }

    /// Current value, or `None` when the trait or its argument is absent.
    pub fn fetch_property_value(&self, corpus: &Corpus, property: &str) -> Result<Option<String>> {
        let property = Self::property(property)?;
        let Some(trait_ref) = self.find_trait(corpus, property.trait_name())? else {
            return Ok(None);
        };
        let Some(reference) = corpus.node(trait_ref)?.as_reference() else {
            return Ok(None);
        };
        let value = reference
            .arguments
            .first()
            .and_then(|&arg| corpus.get(arg))
            .and_then(|node| node.as_argument())
            .and_then(|arg| arg.value.as_ref())
            .and_then(ArgumentValue::as_literal)
            .map(str::to_string);
        Ok(value)
    }

    /// Set the property. `None` removes the backing trait.
    pub fn update_property_value(&self, corpus: &mut Corpus, property: &str, value: Option<&str>) -> Result<()> {
        let property = Self::property(property)?;
        let existing = self.find_trait(corpus, property.trait_name())?;

        let Some(value) = value else {
            if let Some(trait_ref) = existing {
                if let Some(traits) = corpus.node_mut(self.host)?.kind.traits_mut() {
                    traits.retain(|&t| t != trait_ref);
                }
                corpus.detach(trait_ref)?;
            }
            return Ok(());
        };

        let literal = Some(ArgumentValue::Literal(value.to_string()));
        let trait_ref = match existing {
            Some(trait_ref) => trait_ref,
            None => {
                let trait_ref = corpus.make_ref(ObjectType::TraitRef, property.trait_name(), false);
                corpus.add_trait(self.host, trait_ref)?;
                trait_ref
            }
        };

        let first = corpus.reference(trait_ref)?.arguments.first().copied();
        match first.and_then(|arg| corpus.get(arg)).map(|n| n.object_type()) {
            Some(ObjectType::ArgumentDef) => {
                if let Some(arg) = first.and_then(|arg| corpus.get_mut(arg)).and_then(|n| n.as_argument_mut()) {
                    arg.value = literal;
                }
            }
            _ => {
                let arg = corpus.make_object(NodeKind::Argument(ArgumentDef::new(None, literal)));
                corpus.reference_mut(trait_ref)?.arguments.insert(0, arg);
                corpus.adopt(trait_ref, arg)?;
            }
        }
        tracing::trace!(node = %self.host, trait_name = property.trait_name(), "updated trait-backed property");
        Ok(())
    }
}

impl Corpus {
    pub fn description(&self, id: NodeId) -> Result<Option<String>> {
        TraitToPropertyMap::new(id).fetch_property_value(self, "description")
    }

    pub fn set_description(&mut self, id: NodeId, description: Option<&str>) -> Result<()> {
        TraitToPropertyMap::new(id).update_property_value(self, "description", description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::EntityDef;
    use crate::partition::DataPartitionDef;
    use schemagraph_storage::StorageManager;

    fn partition() -> (Corpus, NodeId) {
        let mut corpus = Corpus::with_storage(StorageManager::new());
        let id = corpus.make_object(NodeKind::DataPartition(DataPartitionDef::new("part1")));
        (corpus, id)
    }

    #[test]
    fn description_round_trips_through_trait() {
        let (mut corpus, id) = partition();
        assert_eq!(corpus.description(id).unwrap(), None);

        corpus.set_description(id, Some("daily extract")).unwrap();
        assert_eq!(corpus.description(id).unwrap().as_deref(), Some("daily extract"));

        let traits = &corpus.partition(id).unwrap().exhibits_traits;
        assert_eq!(traits.len(), 1);
        assert_eq!(corpus.name_of(traits[0]), Some("is.localized.describedAs"));
    }

    #[test]
    fn update_rewrites_existing_argument() {
        let (mut corpus, id) = partition();
        corpus.set_description(id, Some("first")).unwrap();
        corpus.set_description(id, Some("second")).unwrap();

        assert_eq!(corpus.description(id).unwrap().as_deref(), Some("second"));
        let trait_ref = corpus.partition(id).unwrap().exhibits_traits[0];
        assert_eq!(corpus.reference(trait_ref).unwrap().arguments.len(), 1);
    }

    #[test]
    fn none_removes_the_trait() {
        let (mut corpus, id) = partition();
        corpus.set_description(id, Some("gone soon")).unwrap();
        corpus.set_description(id, None).unwrap();

        assert!(corpus.partition(id).unwrap().exhibits_traits.is_empty());
        assert_eq!(corpus.description(id).unwrap(), None);
    }

    #[test]
    fn properties_map_to_distinct_traits() {
        let mut corpus = Corpus::with_storage(StorageManager::new());
        let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Customer")));
        let map = TraitToPropertyMap::new(entity);
        map.update_property_value(&mut corpus, "displayName", Some("Customer")).unwrap();
        map.update_property_value(&mut corpus, "version", Some("1.2")).unwrap();

        assert_eq!(map.fetch_property_value(&corpus, "version").unwrap().as_deref(), Some("1.2"));
        assert_eq!(map.fetch_property_value(&corpus, "sourceName").unwrap(), None);
        let names: Vec<_> = corpus
            .entity(entity)
            .unwrap()
            .exhibits_traits
            .iter()
            .filter_map(|&t| corpus.name_of(t))
            .collect();
        assert_eq!(names, vec!["is.localized.displayedAs", "is.CDM.entityVersion"]);
    }

    #[test]
    fn unknown_property_is_an_error() {
        let (corpus, id) = partition();
        let err = TraitToPropertyMap::new(id)
            .fetch_property_value(&corpus, "colour")
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownProperty(p) if p == "colour"));
    }
}
