//! Entity declarations and sub-manifest declarations of a manifest

use crate::error::Result;
use crate::partition;
use crate::types::{EntityDeclaration, LocalEntityDeclaration, ManifestDeclaration, ReferencedEntityDeclaration};
use crate::utils::{expect_kind, parse, trait_list, traits_to_data};
use schemagraph_model::{
    CopyOptions, Corpus, LocalEntityDeclarationDef, ManifestDeclarationDef, Node, NodeId, NodeKind,
    ReferencedEntityDeclarationDef, ResolveOptions,
};
use serde_json::Value;

/// One entry of a manifest's `entities`.
///
/// The `type` tag picks the kind. Untagged entries are referenced
/// declarations when they carry `entityDeclaration`, local otherwise.
pub fn entity_declaration_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Value::Object(obj) = value else {
        return Ok(None);
    };
    let referenced = match obj.get("type").and_then(Value::as_str) {
        Some("LocalEntity") => false,
        Some("ReferencedEntity") => true,
        Some(other) => {
            tracing::warn!(declaration_type = other, "unknown entity declaration type");
            return Ok(None);
        }
        None => obj.contains_key("entityDeclaration"),
    };
    if referenced {
        referenced_entity_from_data(corpus, value)
    } else {
        local_entity_from_data(corpus, value)
    }
}

pub fn local_entity_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<LocalEntityDeclaration>(value, "local entity declaration") else {
        return Ok(None);
    };

    let mut def = LocalEntityDeclarationDef::new(data.entity_name, data.entity_path);
    def.explanation = data.explanation;
    def.last_file_status_check_time = data.last_file_status_check_time;
    def.last_file_modified_time = data.last_file_modified_time;
    def.last_child_file_modified_time = data.last_child_file_modified_time;
    def.exhibits_traits = trait_list(corpus, data.exhibits_traits.as_ref())?;
    for (index, item) in data.data_partitions.iter().flatten().enumerate() {
        match partition::from_data(corpus, item)? {
            Some(partition) => def.data_partitions.push(partition),
            None => tracing::warn!(index, entity = %def.entity_name, "skipping unreadable data partition"),
        }
    }
    Ok(Some(corpus.make_object(NodeKind::LocalEntityDeclaration(def))))
}

pub fn local_entity_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let decl = expect_kind(corpus, id, Node::as_local_entity_declaration, "local entity declaration")?;
    let partitions = crate::list_to_data(corpus, &decl.data_partitions, res_opt, options)?;
    let data = LocalEntityDeclaration {
        entity_name: decl.entity_name.clone(),
        entity_path: decl.entity_path.clone(),
        explanation: decl.explanation.clone(),
        exhibits_traits: traits_to_data(corpus, &decl.exhibits_traits, &[], res_opt, options)?,
        data_partitions: (!partitions.is_empty()).then_some(partitions),
        last_file_status_check_time: decl.last_file_status_check_time,
        last_file_modified_time: decl.last_file_modified_time,
        last_child_file_modified_time: decl.last_child_file_modified_time,
    };
    Ok(serde_json::to_value(EntityDeclaration::LocalEntity(data))?)
}

pub fn referenced_entity_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<ReferencedEntityDeclaration>(value, "referenced entity declaration") else {
        return Ok(None);
    };
    let def = ReferencedEntityDeclarationDef {
        entity_name: data.entity_name,
        entity_path: data.entity_declaration,
        explanation: data.explanation,
        exhibits_traits: trait_list(corpus, data.exhibits_traits.as_ref())?,
    };
    Ok(Some(corpus.make_object(NodeKind::ReferencedEntityDeclaration(def))))
}

pub fn referenced_entity_to_data(
    corpus: &Corpus,
    id: NodeId,
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Value> {
    let decl = expect_kind(corpus, id, Node::as_referenced_entity_declaration, "referenced entity declaration")?;
    let data = ReferencedEntityDeclaration {
        entity_name: decl.entity_name.clone(),
        entity_declaration: decl.entity_path.clone(),
        explanation: decl.explanation.clone(),
        exhibits_traits: traits_to_data(corpus, &decl.exhibits_traits, &[], res_opt, options)?,
    };
    Ok(serde_json::to_value(EntityDeclaration::ReferencedEntity(data))?)
}

pub fn manifest_declaration_from_data(corpus: &mut Corpus, data: ManifestDeclaration) -> NodeId {
    let mut def = ManifestDeclarationDef::new(data.manifest_name, data.definition);
    def.explanation = data.explanation;
    def.last_file_status_check_time = data.last_file_status_check_time;
    def.last_file_modified_time = data.last_file_modified_time;
    corpus.make_object(NodeKind::ManifestDeclaration(def))
}

pub fn manifest_declaration_data(corpus: &Corpus, id: NodeId) -> Result<ManifestDeclaration> {
    let decl = expect_kind(corpus, id, Node::as_manifest_declaration, "manifest declaration")?;
    Ok(ManifestDeclaration {
        manifest_name: decl.manifest_name.clone(),
        definition: decl.definition.clone(),
        explanation: decl.explanation.clone(),
        last_file_status_check_time: decl.last_file_status_check_time,
        last_file_modified_time: decl.last_file_modified_time,
    })
}
