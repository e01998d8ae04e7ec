//! Type attributes, entity attributes and attribute groups

use crate::error::Result;
use crate::reference::{self, ReferenceKind};
use crate::types::{AttributeGroup, EntityAttribute, TypeAttribute};
use crate::utils::{
    apply_properties, create_attribute, expect_kind, parse, property, trait_list, traits_to_data,
};
use schemagraph_model::{
    AttributeGroupDef, CopyOptions, Corpus, EntityAttributeDef, Node, NodeId, NodeKind, ResolveOptions,
    TraitProperty, TypeAttributeDef,
};
use serde_json::Value;

const TYPE_ATTRIBUTE_PROPERTIES: [TraitProperty; 2] = [TraitProperty::DisplayName, TraitProperty::Description];
const ENTITY_ATTRIBUTE_PROPERTIES: [TraitProperty; 1] = [TraitProperty::Description];

/// `entity_name` records which entity declared the attribute.
pub fn type_attribute_from_data(corpus: &mut Corpus, value: &Value, entity_name: Option<&str>) -> Result<Option<NodeId>> {
    let Some(data) = parse::<TypeAttribute>(value, "type attribute") else {
        return Ok(None);
    };

    let mut def = TypeAttributeDef::new(data.name.unwrap_or_default());
    def.explanation = data.explanation;
    def.purpose = reference::from_optional(corpus, ReferenceKind::Purpose, data.purpose.as_ref())?;
    def.data_type = reference::from_optional(corpus, ReferenceKind::DataType, data.data_type.as_ref())?;
    def.applied_traits = trait_list(corpus, data.applied_traits.as_ref())?;
    def.is_nullable = data.is_nullable;
    def.owning_entity_name = entity_name.map(str::to_string);

    let id = corpus.make_object(NodeKind::TypeAttribute(def));
    apply_properties(
        corpus,
        id,
        &[
            (TraitProperty::DisplayName, data.display_name.as_deref()),
            (TraitProperty::Description, data.description.as_deref()),
        ],
    )?;
    Ok(Some(id))
}

pub fn type_attribute_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let attr = expect_kind(corpus, id, Node::as_type_attribute, "type attribute")?;
    let data = TypeAttribute {
        name: (!attr.name.is_empty()).then(|| attr.name.clone()),
        explanation: attr.explanation.clone(),
        purpose: reference::to_optional(corpus, attr.purpose, res_opt, options)?,
        data_type: reference::to_optional(corpus, attr.data_type, res_opt, options)?,
        applied_traits: traits_to_data(corpus, &attr.applied_traits, &TYPE_ATTRIBUTE_PROPERTIES, res_opt, options)?,
        is_nullable: attr.is_nullable,
        display_name: property(corpus, id, TraitProperty::DisplayName)?,
        description: property(corpus, id, TraitProperty::Description)?,
    };
    Ok(serde_json::to_value(data)?)
}

pub fn entity_attribute_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<EntityAttribute>(value, "entity attribute") else {
        return Ok(None);
    };

    let mut def = EntityAttributeDef::new(data.name.unwrap_or_default());
    def.explanation = data.explanation;
    def.purpose = reference::from_optional(corpus, ReferenceKind::Purpose, data.purpose.as_ref())?;
    def.entity = reference::from_optional(corpus, ReferenceKind::Entity, data.entity.as_ref())?;
    def.applied_traits = trait_list(corpus, data.applied_traits.as_ref())?;

    let id = corpus.make_object(NodeKind::EntityAttribute(def));
    apply_properties(corpus, id, &[(TraitProperty::Description, data.description.as_deref())])?;
    Ok(Some(id))
}

pub fn entity_attribute_to_data(
    corpus: &Corpus,
    id: NodeId,
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Value> {
    let attr = expect_kind(corpus, id, Node::as_entity_attribute, "entity attribute")?;
    let data = EntityAttribute {
        name: (!attr.name.is_empty()).then(|| attr.name.clone()),
        explanation: attr.explanation.clone(),
        purpose: reference::to_optional(corpus, attr.purpose, res_opt, options)?,
        entity: reference::to_optional(corpus, attr.entity, res_opt, options)?,
        applied_traits: traits_to_data(corpus, &attr.applied_traits, &ENTITY_ATTRIBUTE_PROPERTIES, res_opt, options)?,
        description: property(corpus, id, TraitProperty::Description)?,
    };
    Ok(serde_json::to_value(data)?)
}

/// Group members use the same shapes as an entity's `hasAttributes`.
pub fn attribute_group_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<AttributeGroup>(value, "attribute group") else {
        return Ok(None);
    };

    let mut def = AttributeGroupDef::new(data.attribute_group_name);
    def.explanation = data.explanation;
    for (index, member) in data.members.iter().flatten().enumerate() {
        match create_attribute(corpus, member, None)? {
            Some(member) => def.members.push(member),
            None => tracing::warn!(
                index,
                group = %def.attribute_group_name,
                "skipping group member with unrecognised shape"
            ),
        }
    }
    def.exhibits_traits = trait_list(corpus, data.exhibits_traits.as_ref())?;
    Ok(Some(corpus.make_object(NodeKind::AttributeGroup(def))))
}

pub fn attribute_group_to_data(
    corpus: &Corpus,
    id: NodeId,
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Value> {
    let group = expect_kind(corpus, id, Node::as_attribute_group, "attribute group")?;
    let data = AttributeGroup {
        attribute_group_name: group.attribute_group_name.clone(),
        explanation: group.explanation.clone(),
        members: Some(crate::list_to_data(corpus, &group.members, res_opt, options)?),
        exhibits_traits: traits_to_data(corpus, &group.exhibits_traits, &[], res_opt, options)?,
    };
    Ok(serde_json::to_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemagraph_model::{ObjectType, TraitToPropertyMap};
    use schemagraph_storage::StorageManager;
    use serde_json::json;

    fn corpus() -> Corpus {
        Corpus::with_storage(StorageManager::new())
    }

    #[test]
    fn type_attribute_properties_live_in_traits() {
        let mut corpus = corpus();
        let value = json!({
            "name": "email",
            "purpose": "hasA",
            "dataType": "string",
            "appliedTraits": ["is.dataFormat.character"],
            "isNullable": true,
            "displayName": "Email",
            "description": "Primary contact address"
        });
        let id = type_attribute_from_data(&mut corpus, &value, Some("Customer")).unwrap().unwrap();
        let attr = corpus.node(id).unwrap().as_type_attribute().unwrap();
        assert_eq!(attr.applied_traits.len(), 3);
        assert_eq!(corpus.name_of(attr.data_type.unwrap()), Some("string"));

        let properties = TraitToPropertyMap::new(id);
        assert_eq!(
            properties.fetch_property_value(&corpus, "displayName").unwrap().as_deref(),
            Some("Email")
        );

        let out = type_attribute_to_data(&corpus, id, &ResolveOptions::default(), &CopyOptions::default()).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn entity_attribute_with_inline_entity() {
        let mut corpus = corpus();
        let value = json!({
            "name": "address",
            "entity": {"entityReference": {"entityName": "Address", "hasAttributes": []}}
        });
        let id = entity_attribute_from_data(&mut corpus, &value).unwrap().unwrap();
        let attr = corpus.node(id).unwrap().as_entity_attribute().unwrap();
        let entity_ref = attr.entity.unwrap();
        let reference = corpus.reference(entity_ref).unwrap();
        let inline = reference.explicit_reference().unwrap();
        assert_eq!(corpus.node(inline).unwrap().object_type(), ObjectType::EntityDef);
        assert_eq!(corpus.name_of(entity_ref), Some("Address"));
    }

    #[test]
    fn group_members_skip_unrecognised_shapes() {
        let mut corpus = corpus();
        let value = json!({
            "attributeGroupName": "Audit",
            "members": [
                {"name": "createdOn", "dataType": "dateTime"},
                7,
                "Tracking"
            ]
        });
        let id = attribute_group_from_data(&mut corpus, &value).unwrap().unwrap();
        let group = corpus.node(id).unwrap().as_attribute_group().unwrap();
        assert_eq!(group.members.len(), 2);
        for &member in &group.members {
            assert_eq!(corpus.node(member).unwrap().owner(), Some(id));
        }

        let out = attribute_group_to_data(&corpus, id, &ResolveOptions::default(), &CopyOptions::default()).unwrap();
        assert_eq!(
            out,
            json!({
                "attributeGroupName": "Audit",
                "members": [{"name": "createdOn", "dataType": "dateTime"}, "Tracking"]
            })
        );
    }

    #[test]
    fn nameless_attributes_still_build() {
        let mut corpus = corpus();
        let id = entity_attribute_from_data(&mut corpus, &json!({"entity": "Person"})).unwrap().unwrap();
        let attr = corpus.node(id).unwrap().as_entity_attribute().unwrap();
        assert_eq!(attr.name, "");
        assert_eq!(corpus.name_of(attr.entity.unwrap()), Some("Person"));

        let id = type_attribute_from_data(&mut corpus, &json!({"dataType": "string"}), None).unwrap().unwrap();
        let out = type_attribute_to_data(&corpus, id, &ResolveOptions::default(), &CopyOptions::default()).unwrap();
        assert_eq!(out, json!({"dataType": "string"}));
    }

    #[test]
    fn mistyped_name_is_not_an_attribute() {
        let mut corpus = corpus();
        assert_eq!(type_attribute_from_data(&mut corpus, &json!({"name": 3}), None).unwrap(), None);
        assert_eq!(entity_attribute_from_data(&mut corpus, &json!({"name": ["a"], "entity": "Person"})).unwrap(), None);
    }
}
