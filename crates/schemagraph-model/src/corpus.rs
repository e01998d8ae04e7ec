//! The corpus: node arena, document registry and shared context

use crate::context::CorpusContext;
use crate::declaration::{LocalEntityDeclarationDef, ManifestDeclarationDef};
use crate::definition::EntityDef;
use crate::document::{DocumentDef, ManifestDef};
use crate::error::{ModelError, Result};
use crate::node::{Node, NodeKind};
use crate::partition::DataPartitionDef;
use crate::reference::{ObjectReference, RefTarget};
use crate::{NodeId, ObjectType};
use ahash::{AHashMap, AHashSet};
use schemagraph_storage::StorageManager;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Prefix used for corpus paths of nodes that sit outside any document.
const DETACHED_PREFIX: &str = "NULL:/NULL/";

/// Owns every node of a schema corpus.
///
/// Nodes are never removed; detaching a node only clears its owner.
#[derive(Debug)]
pub struct Corpus {
    ctx: Arc<CorpusContext>,
    nodes: Vec<Node>,
    /// Absolute document path -> document (or manifest) node.
    documents: BTreeMap<String, NodeId>,
    /// Top-level definition name -> definitions carrying it, across documents.
    symbols: AHashMap<String, Vec<NodeId>>,
    pub(crate) paths_computed: usize,
}

macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $as_ref:ident, $as_mut:ident, $ty:ty, $expected:literal) => {
        pub fn $get(&self, id: NodeId) -> Result<&$ty> {
            let node = self.node(id)?;
            node.$as_ref().ok_or(ModelError::WrongKind {
                id,
                expected: $expected,
                found: node.object_type(),
            })
        }

        pub fn $get_mut(&mut self, id: NodeId) -> Result<&mut $ty> {
            let node = self.node_mut(id)?;
            let found = node.object_type();
            node.$as_mut().ok_or(ModelError::WrongKind {
                id,
                expected: $expected,
                found,
            })
        }
    };
}

impl Corpus {
    pub fn new(ctx: Arc<CorpusContext>) -> Self {
        Self {
            ctx,
            nodes: Vec::new(),
            documents: BTreeMap::new(),
            symbols: AHashMap::new(),
            paths_computed: 0,
        }
    }

    /// Corpus over `storage` with default options and the system clock.
    pub fn with_storage(storage: StorageManager) -> Self {
        Self::new(Arc::new(CorpusContext::new(storage)))
    }

    pub fn context(&self) -> &Arc<CorpusContext> {
        &self.ctx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node; children already listed in `kind` are adopted.
    pub fn make_object(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let children = kind.child_ids();
        self.nodes.push(Node::new(kind));
        for child in children {
            if let Some(node) = self.nodes.get_mut(child.index()) {
                node.owner = Some(id);
            }
        }
        id
    }

    pub fn make_ref(&mut self, object_type: ObjectType, name: impl Into<String>, simple: bool) -> NodeId {
        let reference = ObjectReference::new(object_type, RefTarget::Named(name.into()), simple);
        self.make_object(NodeKind::Reference(reference))
    }

    /// Reference owning an inline definition.
    pub fn make_explicit_ref(&mut self, object_type: ObjectType, definition: NodeId) -> NodeId {
        let reference = ObjectReference::new(object_type, RefTarget::Explicit(definition), false);
        self.make_object(NodeKind::Reference(reference))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(ModelError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(ModelError::UnknownNode(id))
    }

    pub(crate) fn node_unchecked(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn replace_node(&mut self, id: NodeId, node: Node) {
        self.nodes[id.index()] = node;
    }

    typed_access!(partition, partition_mut, as_partition, as_partition_mut, DataPartitionDef, "data partition");
    typed_access!(
        local_entity_declaration,
        local_entity_declaration_mut,
        as_local_entity_declaration,
        as_local_entity_declaration_mut,
        LocalEntityDeclarationDef,
        "local entity declaration"
    );
    typed_access!(
        manifest_declaration,
        manifest_declaration_mut,
        as_manifest_declaration,
        as_manifest_declaration_mut,
        ManifestDeclarationDef,
        "manifest declaration"
    );
    typed_access!(manifest, manifest_mut, as_manifest, as_manifest_mut, ManifestDef, "manifest");
    typed_access!(entity, entity_mut, as_entity, as_entity_mut, EntityDef, "entity");
    typed_access!(reference, reference_mut, as_reference, as_reference_mut, ObjectReference, "reference");

    /// The document payload of a document or manifest node.
    pub fn document(&self, id: NodeId) -> Result<&DocumentDef> {
        let node = self.node(id)?;
        node.kind().document().ok_or(ModelError::WrongKind {
            id,
            expected: "document",
            found: node.object_type(),
        })
    }

    /// Make `child` owned by `parent`.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node_mut(child)?.owner = Some(parent);
        Ok(())
    }

    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        self.node_mut(id)?.owner = None;
        Ok(())
    }

    pub fn add_definition(&mut self, doc: NodeId, definition: NodeId) -> Result<()> {
        self.node(definition)?;
        let node = self.node_mut(doc)?;
        let found = node.object_type();
        node.kind
            .document_mut()
            .ok_or(ModelError::WrongKind {
                id: doc,
                expected: "document",
                found,
            })?
            .definitions
            .push(definition);
        self.adopt(doc, definition)
    }

    pub fn add_data_partition(&mut self, declaration: NodeId, partition: NodeId) -> Result<()> {
        self.partition(partition)?;
        self.local_entity_declaration_mut(declaration)?.data_partitions.push(partition);
        self.adopt(declaration, partition)
    }

    pub fn add_entity_declaration(&mut self, manifest: NodeId, declaration: NodeId) -> Result<()> {
        match self.node(declaration)?.object_type() {
            ObjectType::LocalEntityDeclarationDef | ObjectType::ReferencedEntityDeclarationDef => {}
            found => {
                return Err(ModelError::WrongKind {
                    id: declaration,
                    expected: "entity declaration",
                    found,
                })
            }
        }
        self.manifest_mut(manifest)?.entities.push(declaration);
        self.adopt(manifest, declaration)
    }

    pub fn add_sub_manifest(&mut self, manifest: NodeId, declaration: NodeId) -> Result<()> {
        self.manifest_declaration(declaration)?;
        self.manifest_mut(manifest)?.sub_manifests.push(declaration);
        self.adopt(manifest, declaration)
    }

    pub fn add_attribute(&mut self, entity: NodeId, attribute: NodeId) -> Result<()> {
        self.node(attribute)?;
        self.entity_mut(entity)?.attributes.push(attribute);
        self.adopt(entity, attribute)
    }

    /// Append to the node's exhibited (or applied) traits.
    pub fn add_trait(&mut self, id: NodeId, trait_ref: NodeId) -> Result<()> {
        self.node(trait_ref)?;
        let node = self.node_mut(id)?;
        let object_type = node.object_type();
        node.kind
            .traits_mut()
            .ok_or(ModelError::MissingCapability {
                id,
                object_type,
                capability: "traits",
            })?
            .push(trait_ref);
        self.adopt(id, trait_ref)
    }

    /// Children in declared order.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.node(id)?.kind().child_ids())
    }

    /// `id` and all its descendants, pre-order. Each node appears once;
    /// child ids that name no node are skipped.
    pub fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;
        let mut order = Vec::new();
        let mut seen = AHashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                tracing::warn!(node = %current, "skipping child that is not in the corpus");
                continue;
            };
            if !seen.insert(current) {
                continue;
            }
            order.push(current);
            stack.extend(node.kind().child_ids().into_iter().rev());
        }
        Ok(order)
    }

    /// Name of the node; explicit references report their inline definition.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        let node = self.get(id)?;
        match node.kind() {
            NodeKind::Reference(r) => match r.target {
                RefTarget::Named(ref name) => Some(name),
                RefTarget::Explicit(def) => self.name_of(def),
            },
            kind => kind.name(),
        }
    }

    /// Nearest document or manifest at or above `id`.
    pub fn in_document(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            if node.object_type().is_document() {
                return Some(node_id);
            }
            current = node.owner();
        }
        None
    }

    /// Absolute path of the document containing `id`.
    pub fn document_path(&self, id: NodeId) -> Option<String> {
        let doc = self.in_document(id)?;
        self.get(doc)?.kind().document().map(DocumentDef::corpus_path)
    }

    /// Index a document by path and its top-level definitions by name.
    pub fn register_document(&mut self, doc: NodeId) -> Result<()> {
        let document = self.document(doc)?;
        let path = document.corpus_path();
        let definitions = document.definitions.clone();

        for definition in definitions {
            if let Some(name) = self.name_of(definition).map(str::to_string) {
                let entry = self.symbols.entry(name).or_default();
                if !entry.contains(&definition) {
                    entry.push(definition);
                }
            }
        }
        tracing::debug!(document = %path, node = %doc, "registered document");
        self.documents.insert(path, doc);
        Ok(())
    }

    pub fn document_by_path(&self, path: &str) -> Option<NodeId> {
        self.documents.get(path).copied()
    }

    pub fn documents(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.documents.iter().map(|(path, id)| (path.as_str(), *id))
    }

    pub(crate) fn definitions_named(&self, name: &str) -> &[NodeId] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declared path of `id`: the cached value, or one derived from the owner
    /// chain without touching any cache.
    pub fn declared_path_of(&self, id: NodeId) -> Result<String> {
        let node = self.node(id)?;
        if let Some(path) = node.declared_path() {
            return Ok(path.to_string());
        }
        let path_from = match node.owner() {
            Some(owner) => {
                let owner_path = self.declared_path_of(owner)?;
                self.node(owner)?
                    .kind()
                    .child_groups()
                    .into_iter()
                    .find(|group| group.ids.contains(&id))
                    .map(|group| group.prefix.apply(&owner_path))
                    .unwrap_or_default()
            }
            None => String::new(),
        };
        Ok(format!("{path_from}{}", self.path_segment(id)))
    }

    /// Absolute corpus path: the document path joined with the declared path.
    pub fn at_corpus_path(&self, id: NodeId) -> Result<String> {
        let declared = self.declared_path_of(id)?;
        Ok(match self.in_document(id) {
            Some(doc) if doc == id => self.document(doc)?.corpus_path(),
            Some(doc) => format!("{}/{declared}", self.document(doc)?.corpus_path()),
            None => format!("{DETACHED_PREFIX}{declared}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TypeAttributeDef;

    fn corpus() -> Corpus {
        Corpus::with_storage(StorageManager::new())
    }

    #[test]
    fn make_object_adopts_listed_children() {
        let mut corpus = corpus();
        let attr = corpus.make_object(NodeKind::TypeAttribute(TypeAttributeDef::new("id")));
        let mut entity = EntityDef::new("Customer");
        entity.attributes.push(attr);
        let entity = corpus.make_object(NodeKind::Entity(entity));

        assert_eq!(corpus.node(attr).unwrap().owner(), Some(entity));
        assert_eq!(corpus.children(entity).unwrap(), vec![attr]);
    }

    #[test]
    fn typed_access_reports_wrong_kind() {
        let mut corpus = corpus();
        let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Customer")));
        let err = corpus.partition(entity).unwrap_err();
        assert!(matches!(
            err,
            ModelError::WrongKind {
                found: ObjectType::EntityDef,
                ..
            }
        ));
        assert!(matches!(
            corpus.node(NodeId(99)).unwrap_err(),
            ModelError::UnknownNode(NodeId(99))
        ));
    }

    #[test]
    fn corpus_paths_follow_the_document() {
        let mut corpus = corpus();
        let doc = corpus.make_object(NodeKind::Document(DocumentDef::new("Customer.cdm.json", "local:/sales")));
        let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Customer")));
        let attr = corpus.make_object(NodeKind::TypeAttribute(TypeAttributeDef::new("id")));
        corpus.add_attribute(entity, attr).unwrap();
        corpus.add_definition(doc, entity).unwrap();

        assert_eq!(corpus.in_document(attr), Some(doc));
        assert_eq!(corpus.document_path(attr).as_deref(), Some("local:/sales/Customer.cdm.json"));
        assert_eq!(corpus.at_corpus_path(entity).unwrap(), "local:/sales/Customer.cdm.json/Customer");
        assert_eq!(
            corpus.at_corpus_path(attr).unwrap(),
            "local:/sales/Customer.cdm.json/Customer/hasAttributes/id"
        );
    }

    #[test]
    fn detached_nodes_use_placeholder_prefix() {
        let mut corpus = corpus();
        let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Loose")));
        assert_eq!(corpus.at_corpus_path(entity).unwrap(), "NULL:/NULL/Loose");
    }

    #[test]
    fn register_document_indexes_definitions() {
        let mut corpus = corpus();
        let doc = corpus.make_object(NodeKind::Document(DocumentDef::new("Customer.cdm.json", "local:/")));
        let entity = corpus.make_object(NodeKind::Entity(EntityDef::new("Customer")));
        corpus.add_definition(doc, entity).unwrap();
        corpus.register_document(doc).unwrap();
        corpus.register_document(doc).unwrap();

        assert_eq!(corpus.document_by_path("local:/Customer.cdm.json"), Some(doc));
        assert_eq!(corpus.definitions_named("Customer"), &[entity]);
        assert!(corpus.definitions_named("Missing").is_empty());
    }
}
