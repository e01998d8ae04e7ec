//! Nodes of the ownership tree
//!
//! Every node lives in the corpus arena and is addressed by a [`NodeId`].
//! Parents list their children in their kind-specific fields; the `owner`
//! back-reference is a plain id used only for upward reporting.

use crate::declaration::{LocalEntityDeclarationDef, ManifestDeclarationDef, ReferencedEntityDeclarationDef};
use crate::definition::{
    AttributeGroupDef, DataTypeDef, EntityAttributeDef, EntityDef, ParameterDef, PurposeDef, TraitDef,
    TypeAttributeDef,
};
use crate::document::{DocumentDef, FolderDef, ImportDef, ManifestDef};
use crate::file_status::FileStatus;
use crate::partition::DataPartitionDef;
use crate::reference::{ArgumentDef, ArgumentValue, ObjectReference, RefTarget};
use crate::ObjectType;
use serde::{Deserialize, Serialize};
use ahash::AHashMap;
use std::fmt;

/// Handle to a node inside a [`crate::Corpus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Folder(FolderDef),
    Document(DocumentDef),
    Manifest(ManifestDef),
    Import(ImportDef),
    LocalEntityDeclaration(LocalEntityDeclarationDef),
    ReferencedEntityDeclaration(ReferencedEntityDeclarationDef),
    ManifestDeclaration(ManifestDeclarationDef),
    DataPartition(DataPartitionDef),
    Entity(EntityDef),
    TypeAttribute(TypeAttributeDef),
    EntityAttribute(EntityAttributeDef),
    AttributeGroup(AttributeGroupDef),
    Trait(TraitDef),
    Parameter(ParameterDef),
    DataType(DataTypeDef),
    Purpose(PurposeDef),
    Argument(ArgumentDef),
    Reference(ObjectReference),
}

/// How a group of children derives its `path_from` from the parent's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPrefix {
    /// `{path}/{label}/`
    Nested(&'static str),
    /// `{label}`; definitions inside a document are rooted at the document.
    DocumentRoot(&'static str),
    /// `{path}/`
    Inline,
}

impl ChildPrefix {
    pub fn apply(self, path: &str) -> String {
        match self {
            ChildPrefix::Nested(label) => format!("{path}/{label}/"),
            ChildPrefix::DocumentRoot(label) => label.to_string(),
            ChildPrefix::Inline => format!("{path}/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildGroup {
    pub prefix: ChildPrefix,
    pub ids: Vec<NodeId>,
}

fn group(prefix: ChildPrefix, ids: &[NodeId]) -> Option<ChildGroup> {
    (!ids.is_empty()).then(|| ChildGroup {
        prefix,
        ids: ids.to_vec(),
    })
}

fn single(prefix: ChildPrefix, id: Option<NodeId>) -> Option<ChildGroup> {
    id.map(|id| ChildGroup { prefix, ids: vec![id] })
}

fn value_node(value: &Option<ArgumentValue>) -> Option<NodeId> {
    match value {
        Some(ArgumentValue::Node(id)) => Some(*id),
        _ => None,
    }
}

fn remap(slot: &mut NodeId, map: &AHashMap<NodeId, NodeId>) {
    if let Some(new) = map.get(slot) {
        *slot = *new;
    }
}

fn remap_all(slots: &mut [NodeId], map: &AHashMap<NodeId, NodeId>) {
    for slot in slots {
        remap(slot, map);
    }
}

fn remap_opt(slot: &mut Option<NodeId>, map: &AHashMap<NodeId, NodeId>) {
    if let Some(slot) = slot {
        remap(slot, map);
    }
}

fn remap_value(value: &mut Option<ArgumentValue>, map: &AHashMap<NodeId, NodeId>) {
    if let Some(ArgumentValue::Node(id)) = value {
        remap(id, map);
    }
}

use ChildPrefix::{DocumentRoot, Inline, Nested};

impl NodeKind {
    pub fn object_type(&self) -> ObjectType {
        match self {
            NodeKind::Folder(_) => ObjectType::FolderDef,
            NodeKind::Document(_) => ObjectType::DocumentDef,
            NodeKind::Manifest(_) => ObjectType::ManifestDef,
            NodeKind::Import(_) => ObjectType::Import,
            NodeKind::LocalEntityDeclaration(_) => ObjectType::LocalEntityDeclarationDef,
            NodeKind::ReferencedEntityDeclaration(_) => ObjectType::ReferencedEntityDeclarationDef,
            NodeKind::ManifestDeclaration(_) => ObjectType::ManifestDeclarationDef,
            NodeKind::DataPartition(_) => ObjectType::DataPartitionDef,
            NodeKind::Entity(_) => ObjectType::EntityDef,
            NodeKind::TypeAttribute(_) => ObjectType::TypeAttributeDef,
            NodeKind::EntityAttribute(_) => ObjectType::EntityAttributeDef,
            NodeKind::AttributeGroup(_) => ObjectType::AttributeGroupDef,
            NodeKind::Trait(_) => ObjectType::TraitDef,
            NodeKind::Parameter(_) => ObjectType::ParameterDef,
            NodeKind::DataType(_) => ObjectType::DataTypeDef,
            NodeKind::Purpose(_) => ObjectType::PurposeDef,
            NodeKind::Argument(_) => ObjectType::ArgumentDef,
            NodeKind::Reference(r) => r.object_type(),
        }
    }

    /// Own name, if the kind carries one. Explicit references return `None`;
    /// the corpus looks through them to the inline definition.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Folder(f) => Some(&f.name),
            NodeKind::Document(d) => Some(&d.name),
            NodeKind::Manifest(m) => Some(&m.manifest_name),
            NodeKind::Import(i) => Some(i.moniker.as_deref().unwrap_or(&i.corpus_path)),
            NodeKind::LocalEntityDeclaration(d) => Some(&d.entity_name),
            NodeKind::ReferencedEntityDeclaration(d) => Some(&d.entity_name),
            NodeKind::ManifestDeclaration(d) => Some(&d.manifest_name),
            NodeKind::DataPartition(p) => Some(&p.name),
            NodeKind::Entity(e) => Some(&e.entity_name),
            NodeKind::TypeAttribute(a) => Some(&a.name),
            NodeKind::EntityAttribute(a) => Some(&a.name),
            NodeKind::AttributeGroup(g) => Some(&g.attribute_group_name),
            NodeKind::Trait(t) => Some(&t.trait_name),
            NodeKind::Parameter(p) => Some(&p.name),
            NodeKind::DataType(d) => Some(&d.data_type_name),
            NodeKind::Purpose(p) => Some(&p.purpose_name),
            NodeKind::Argument(a) => a.name.as_deref(),
            NodeKind::Reference(r) => match &r.target {
                RefTarget::Named(name) => Some(name),
                RefTarget::Explicit(_) => None,
            },
        }
    }

    /// Children in visiting order, grouped by the collection they sit in.
    pub fn child_groups(&self) -> Vec<ChildGroup> {
        let groups = match self {
            NodeKind::Folder(f) => vec![group(Inline, &f.child_folders), group(Inline, &f.documents)],
            NodeKind::Document(d) => vec![group(DocumentRoot(""), &d.definitions)],
            NodeKind::Manifest(m) => vec![
                group(DocumentRoot(""), &m.document.definitions),
                group(DocumentRoot("exhibitsTraits/"), &m.exhibits_traits),
                group(DocumentRoot("entities/"), &m.entities),
                group(DocumentRoot("subManifests/"), &m.sub_manifests),
            ],
            NodeKind::Import(_) | NodeKind::ManifestDeclaration(_) => vec![],
            NodeKind::LocalEntityDeclaration(d) => vec![
                group(Nested("exhibitsTraits"), &d.exhibits_traits),
                group(Nested("dataPartitions"), &d.data_partitions),
            ],
            NodeKind::ReferencedEntityDeclaration(d) => {
                vec![group(Nested("exhibitsTraits"), &d.exhibits_traits)]
            }
            NodeKind::DataPartition(p) => vec![group(Nested("exhibitsTraits"), &p.exhibits_traits)],
            NodeKind::Entity(e) => vec![
                single(Nested("extendsEntity"), e.extends_entity),
                group(Nested("exhibitsTraits"), &e.exhibits_traits),
                group(Nested("hasAttributes"), &e.attributes),
            ],
            NodeKind::TypeAttribute(a) => vec![
                single(Nested("purpose"), a.purpose),
                single(Nested("dataType"), a.data_type),
                group(Nested("appliedTraits"), &a.applied_traits),
            ],
            NodeKind::EntityAttribute(a) => vec![
                single(Nested("purpose"), a.purpose),
                single(Nested("entity"), a.entity),
                group(Nested("appliedTraits"), &a.applied_traits),
            ],
            NodeKind::AttributeGroup(g) => vec![
                group(Nested("exhibitsTraits"), &g.exhibits_traits),
                group(Nested("members"), &g.members),
            ],
            NodeKind::Trait(t) => vec![
                single(Nested("extendsTrait"), t.extends_trait),
                group(Nested("hasParameters"), &t.parameters),
            ],
            NodeKind::Parameter(p) => vec![
                single(Nested("dataType"), p.data_type),
                single(Nested("defaultValue"), value_node(&p.default_value)),
            ],
            NodeKind::DataType(d) => vec![
                single(Nested("extendsDataType"), d.extends_data_type),
                group(Nested("exhibitsTraits"), &d.exhibits_traits),
            ],
            NodeKind::Purpose(p) => vec![
                single(Nested("extendsPurpose"), p.extends_purpose),
                group(Nested("exhibitsTraits"), &p.exhibits_traits),
            ],
            NodeKind::Argument(a) => vec![single(Nested("value"), value_node(&a.value))],
            NodeKind::Reference(r) => {
                let explicit = match r.target {
                    RefTarget::Explicit(id) => Some(id),
                    RefTarget::Named(_) => None,
                };
                vec![
                    single(Inline, explicit),
                    group(Nested("appliedTraits"), &r.applied_traits),
                    group(Nested("arguments"), &r.arguments),
                ]
            }
        };
        groups.into_iter().flatten().collect()
    }

    pub fn child_ids(&self) -> Vec<NodeId> {
        self.child_groups().into_iter().flat_map(|g| g.ids).collect()
    }

    /// Rewrite child ids through `map`; ids missing from the map are kept.
    pub(crate) fn remap_children(&mut self, map: &AHashMap<NodeId, NodeId>) {
        match self {
            NodeKind::Folder(f) => {
                remap_all(&mut f.child_folders, map);
                remap_all(&mut f.documents, map);
            }
            NodeKind::Document(d) => remap_all(&mut d.definitions, map),
            NodeKind::Manifest(m) => {
                remap_all(&mut m.document.definitions, map);
                remap_all(&mut m.exhibits_traits, map);
                remap_all(&mut m.entities, map);
                remap_all(&mut m.sub_manifests, map);
            }
            NodeKind::Import(_) | NodeKind::ManifestDeclaration(_) => {}
            NodeKind::LocalEntityDeclaration(d) => {
                remap_all(&mut d.exhibits_traits, map);
                remap_all(&mut d.data_partitions, map);
            }
            NodeKind::ReferencedEntityDeclaration(d) => remap_all(&mut d.exhibits_traits, map),
            NodeKind::DataPartition(p) => remap_all(&mut p.exhibits_traits, map),
            NodeKind::Entity(e) => {
                remap_opt(&mut e.extends_entity, map);
                remap_all(&mut e.exhibits_traits, map);
                remap_all(&mut e.attributes, map);
            }
            NodeKind::TypeAttribute(a) => {
                remap_opt(&mut a.purpose, map);
                remap_opt(&mut a.data_type, map);
                remap_all(&mut a.applied_traits, map);
            }
            NodeKind::EntityAttribute(a) => {
                remap_opt(&mut a.purpose, map);
                remap_opt(&mut a.entity, map);
                remap_all(&mut a.applied_traits, map);
            }
            NodeKind::AttributeGroup(g) => {
                remap_all(&mut g.exhibits_traits, map);
                remap_all(&mut g.members, map);
            }
            NodeKind::Trait(t) => {
                remap_opt(&mut t.extends_trait, map);
                remap_all(&mut t.parameters, map);
            }
            NodeKind::Parameter(p) => {
                remap_opt(&mut p.data_type, map);
                remap_value(&mut p.default_value, map);
            }
            NodeKind::DataType(d) => {
                remap_opt(&mut d.extends_data_type, map);
                remap_all(&mut d.exhibits_traits, map);
            }
            NodeKind::Purpose(p) => {
                remap_opt(&mut p.extends_purpose, map);
                remap_all(&mut p.exhibits_traits, map);
            }
            NodeKind::Argument(a) => remap_value(&mut a.value, map),
            NodeKind::Reference(r) => {
                if let RefTarget::Explicit(id) = &mut r.target {
                    remap(id, map);
                }
                remap_all(&mut r.applied_traits, map);
                remap_all(&mut r.arguments, map);
            }
        }
    }

    /// The trait list that backs trait-to-property accessors: exhibited
    /// traits on definitions, applied traits on attributes and references.
    pub fn traits(&self) -> Option<&Vec<NodeId>> {
        match self {
            NodeKind::Manifest(m) => Some(&m.exhibits_traits),
            NodeKind::LocalEntityDeclaration(d) => Some(&d.exhibits_traits),
            NodeKind::ReferencedEntityDeclaration(d) => Some(&d.exhibits_traits),
            NodeKind::DataPartition(p) => Some(&p.exhibits_traits),
            NodeKind::Entity(e) => Some(&e.exhibits_traits),
            NodeKind::AttributeGroup(g) => Some(&g.exhibits_traits),
            NodeKind::DataType(d) => Some(&d.exhibits_traits),
            NodeKind::Purpose(p) => Some(&p.exhibits_traits),
            NodeKind::TypeAttribute(a) => Some(&a.applied_traits),
            NodeKind::EntityAttribute(a) => Some(&a.applied_traits),
            NodeKind::Reference(r) => Some(&r.applied_traits),
            _ => None,
        }
    }

    pub fn traits_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeKind::Manifest(m) => Some(&mut m.exhibits_traits),
            NodeKind::LocalEntityDeclaration(d) => Some(&mut d.exhibits_traits),
            NodeKind::ReferencedEntityDeclaration(d) => Some(&mut d.exhibits_traits),
            NodeKind::DataPartition(p) => Some(&mut p.exhibits_traits),
            NodeKind::Entity(e) => Some(&mut e.exhibits_traits),
            NodeKind::AttributeGroup(g) => Some(&mut g.exhibits_traits),
            NodeKind::DataType(d) => Some(&mut d.exhibits_traits),
            NodeKind::Purpose(p) => Some(&mut p.exhibits_traits),
            NodeKind::TypeAttribute(a) => Some(&mut a.applied_traits),
            NodeKind::EntityAttribute(a) => Some(&mut a.applied_traits),
            NodeKind::Reference(r) => Some(&mut r.applied_traits),
            _ => None,
        }
    }

    /// The `extends` reference of definitions that can derive from another.
    pub fn extends(&self) -> Option<NodeId> {
        match self {
            NodeKind::Entity(e) => e.extends_entity,
            NodeKind::Trait(t) => t.extends_trait,
            NodeKind::DataType(d) => d.extends_data_type,
            NodeKind::Purpose(p) => p.extends_purpose,
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&DocumentDef> {
        match self {
            NodeKind::Document(d) => Some(d),
            NodeKind::Manifest(m) => Some(&m.document),
            _ => None,
        }
    }

    pub fn document_mut(&mut self) -> Option<&mut DocumentDef> {
        match self {
            NodeKind::Document(d) => Some(d),
            NodeKind::Manifest(m) => Some(&mut m.document),
            _ => None,
        }
    }
}

/// A node in the ownership tree.
#[derive(Debug, Clone)]
pub struct Node {
    object_type: ObjectType,
    pub(crate) owner: Option<NodeId>,
    pub(crate) declared_path: Option<String>,
    pub(crate) kind: NodeKind,
}

macro_rules! downcast {
    ($as_ref:ident, $as_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $as_ref(&self) -> Option<&$ty> {
            match &self.kind {
                NodeKind::$variant(inner) => Some(inner),
                _ => None,
            }
        }

        pub fn $as_mut(&mut self) -> Option<&mut $ty> {
            match &mut self.kind {
                NodeKind::$variant(inner) => Some(inner),
                _ => None,
            }
        }
    };
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            object_type: kind.object_type(),
            owner: None,
            declared_path: None,
            kind,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Cached declared path; `None` until the first visit computes it.
    pub fn declared_path(&self) -> Option<&str> {
        self.declared_path.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.kind.name()
    }

    pub fn as_file_status(&self) -> Option<&dyn FileStatus> {
        match &self.kind {
            NodeKind::DataPartition(p) => Some(p),
            NodeKind::LocalEntityDeclaration(d) => Some(d),
            NodeKind::ManifestDeclaration(d) => Some(d),
            NodeKind::Manifest(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_file_status_mut(&mut self) -> Option<&mut dyn FileStatus> {
        match &mut self.kind {
            NodeKind::DataPartition(p) => Some(p),
            NodeKind::LocalEntityDeclaration(d) => Some(d),
            NodeKind::ManifestDeclaration(d) => Some(d),
            NodeKind::Manifest(m) => Some(m),
            _ => None,
        }
    }

    downcast!(as_folder, as_folder_mut, Folder, FolderDef);
    downcast!(as_document, as_document_mut, Document, DocumentDef);
    downcast!(as_manifest, as_manifest_mut, Manifest, ManifestDef);
    downcast!(as_import, as_import_mut, Import, ImportDef);
    downcast!(
        as_local_entity_declaration,
        as_local_entity_declaration_mut,
        LocalEntityDeclaration,
        LocalEntityDeclarationDef
    );
    downcast!(
        as_referenced_entity_declaration,
        as_referenced_entity_declaration_mut,
        ReferencedEntityDeclaration,
        ReferencedEntityDeclarationDef
    );
    downcast!(
        as_manifest_declaration,
        as_manifest_declaration_mut,
        ManifestDeclaration,
        ManifestDeclarationDef
    );
    downcast!(as_partition, as_partition_mut, DataPartition, DataPartitionDef);
    downcast!(as_entity, as_entity_mut, Entity, EntityDef);
    downcast!(as_type_attribute, as_type_attribute_mut, TypeAttribute, TypeAttributeDef);
    downcast!(as_entity_attribute, as_entity_attribute_mut, EntityAttribute, EntityAttributeDef);
    downcast!(as_attribute_group, as_attribute_group_mut, AttributeGroup, AttributeGroupDef);
    downcast!(as_trait, as_trait_mut, Trait, TraitDef);
    downcast!(as_parameter, as_parameter_mut, Parameter, ParameterDef);
    downcast!(as_data_type, as_data_type_mut, DataType, DataTypeDef);
    downcast!(as_purpose, as_purpose_mut, Purpose, PurposeDef);
    downcast!(as_argument, as_argument_mut, Argument, ArgumentDef);
    downcast!(as_reference, as_reference_mut, Reference, ObjectReference);
}
