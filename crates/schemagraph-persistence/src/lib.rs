//! Schemagraph persistence
//!
//! Converts between schema-document JSON and the object model:
//!
//! ```text
//!   *.cdm.json ──serde──> types::* ──from_data──> Corpus nodes
//!                                   <──to_data───
//! ```
//!
//! Documents carry no type tags below the top level, so [`utils`] decides
//! what an untyped value is from the keys it carries. Per-kind modules hold
//! the `from_data`/`to_data` pairs; [`to_data`] dispatches on the node kind.

pub mod attribute;
pub mod declaration;
pub mod definition;
pub mod document;
pub mod error;
pub mod partition;
pub mod reference;
pub mod types;
pub mod utils;

pub use document::{
    definition_from_data, load_document, load_from_storage, load_imports, load_manifest, MANIFEST_EXTENSION,
};
pub use error::{PersistenceError, Result};
pub use reference::ReferenceKind;
pub use types::{IdentifierData, IdentifierRef};
pub use utils::{
    classify_constant, copy_identifier_ref, create_attribute, create_attribute_array, create_constant,
    create_trait_reference_array, ConstantShape,
};

use schemagraph_model::{CopyOptions, Corpus, NodeId, NodeKind, ResolveOptions};
use serde_json::Value;

/// Write any persistable node back to its JSON shape.
pub fn to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    match corpus.node(id)?.kind() {
        NodeKind::Reference(_) => reference::to_data(corpus, id, res_opt, options),
        NodeKind::Argument(_) => reference::argument_to_data(corpus, id, res_opt, options),
        NodeKind::Entity(_) => definition::entity_to_data(corpus, id, res_opt, options),
        NodeKind::Trait(_) => definition::trait_to_data(corpus, id, res_opt, options),
        NodeKind::Parameter(_) => definition::parameter_to_data(corpus, id, res_opt, options),
        NodeKind::DataType(_) => definition::data_type_to_data(corpus, id, res_opt, options),
        NodeKind::Purpose(_) => definition::purpose_to_data(corpus, id, res_opt, options),
        NodeKind::TypeAttribute(_) => attribute::type_attribute_to_data(corpus, id, res_opt, options),
        NodeKind::EntityAttribute(_) => attribute::entity_attribute_to_data(corpus, id, res_opt, options),
        NodeKind::AttributeGroup(_) => attribute::attribute_group_to_data(corpus, id, res_opt, options),
        NodeKind::DataPartition(_) => partition::to_data(corpus, id, res_opt, options),
        NodeKind::LocalEntityDeclaration(_) => declaration::local_entity_to_data(corpus, id, res_opt, options),
        NodeKind::ReferencedEntityDeclaration(_) => {
            declaration::referenced_entity_to_data(corpus, id, res_opt, options)
        }
        NodeKind::ManifestDeclaration(_) => Ok(serde_json::to_value(declaration::manifest_declaration_data(
            corpus, id,
        )?)?),
        NodeKind::Document(_) => document::document_to_data(corpus, id, res_opt, options),
        NodeKind::Manifest(_) => document::manifest_to_data(corpus, id, res_opt, options),
        NodeKind::Import(import) => Ok(serde_json::to_value(types::Import {
            corpus_path: import.corpus_path.clone(),
            moniker: import.moniker.clone(),
        })?),
        NodeKind::Folder(_) => Err(PersistenceError::NotA {
            path: corpus.at_corpus_path(id)?,
            expected: "persistable object",
        }),
    }
}

/// [`to_data`] over a list, in order.
pub fn list_to_data(
    corpus: &Corpus,
    ids: &[NodeId],
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Vec<Value>> {
    ids.iter().map(|&id| to_data(corpus, id, res_opt, options)).collect()
}
