//! Entities, traits, parameters, data types and purposes

use crate::error::Result;
use crate::reference::{self, value_to_data, ReferenceKind};
use crate::types::{DataType, Entity, Parameter, Purpose, Trait};
use crate::utils::{
    apply_properties, create_attribute_array, create_constant, expect_kind, parse, property, trait_list,
    traits_to_data,
};
use schemagraph_model::{
    CopyOptions, Corpus, DataTypeDef, EntityDef, Node, NodeId, NodeKind, ParameterDef, PurposeDef, ResolveOptions,
    TraitDef, TraitProperty,
};
use serde_json::Value;

const ENTITY_PROPERTIES: [TraitProperty; 4] = [
    TraitProperty::SourceName,
    TraitProperty::DisplayName,
    TraitProperty::Description,
    TraitProperty::Version,
];

pub fn entity_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<Entity>(value, "entity") else {
        return Ok(None);
    };

    let mut def = EntityDef::new(data.entity_name);
    def.explanation = data.explanation;
    def.extends_entity = reference::from_optional(corpus, ReferenceKind::Entity, data.extends_entity.as_ref())?;
    def.exhibits_traits = trait_list(corpus, data.exhibits_traits.as_ref())?;
    def.attributes =
        create_attribute_array(corpus, data.has_attributes.as_ref(), Some(&def.entity_name))?.unwrap_or_default();
    def.cdm_schemas = data.cdm_schemas.unwrap_or_default();

    let id = corpus.make_object(NodeKind::Entity(def));
    apply_properties(
        corpus,
        id,
        &[
            (TraitProperty::SourceName, data.source_name.as_deref()),
            (TraitProperty::DisplayName, data.display_name.as_deref()),
            (TraitProperty::Description, data.description.as_deref()),
            (TraitProperty::Version, data.version.as_deref()),
        ],
    )?;
    Ok(Some(id))
}

pub fn entity_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let entity = expect_kind(corpus, id, Node::as_entity, "entity")?;
    let attributes = crate::list_to_data(corpus, &entity.attributes, res_opt, options)?;
    let data = Entity {
        entity_name: entity.entity_name.clone(),
        explanation: entity.explanation.clone(),
        extends_entity: reference::to_optional(corpus, entity.extends_entity, res_opt, options)?,
        exhibits_traits: traits_to_data(corpus, &entity.exhibits_traits, &ENTITY_PROPERTIES, res_opt, options)?,
        has_attributes: (!attributes.is_empty()).then_some(Value::Array(attributes)),
        source_name: property(corpus, id, TraitProperty::SourceName)?,
        display_name: property(corpus, id, TraitProperty::DisplayName)?,
        description: property(corpus, id, TraitProperty::Description)?,
        version: property(corpus, id, TraitProperty::Version)?,
        cdm_schemas: (!entity.cdm_schemas.is_empty()).then(|| entity.cdm_schemas.clone()),
    };
    Ok(serde_json::to_value(data)?)
}

pub fn trait_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<Trait>(value, "trait") else {
        return Ok(None);
    };

    let mut def = TraitDef::new(data.trait_name);
    def.explanation = data.explanation;
    def.extends_trait = reference::from_optional(corpus, ReferenceKind::Trait, data.extends_trait.as_ref())?;
    for parameter in data.has_parameters.unwrap_or_default() {
        def.parameters.push(parameter_from_data(corpus, parameter)?);
    }
    def.elevated = data.elevated;
    def.ugly = data.ugly;
    def.associated_properties = data.associated_properties.unwrap_or_default();
    Ok(Some(corpus.make_object(NodeKind::Trait(def))))
}

pub fn trait_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let def = expect_kind(corpus, id, Node::as_trait, "trait")?;
    let mut parameters = Vec::with_capacity(def.parameters.len());
    for &parameter in &def.parameters {
        parameters.push(parameter_data(corpus, parameter, res_opt, options)?);
    }
    let data = Trait {
        trait_name: def.trait_name.clone(),
        explanation: def.explanation.clone(),
        extends_trait: reference::to_optional(corpus, def.extends_trait, res_opt, options)?,
        has_parameters: (!parameters.is_empty()).then_some(parameters),
        elevated: def.elevated,
        ugly: def.ugly,
        associated_properties: (!def.associated_properties.is_empty()).then(|| def.associated_properties.clone()),
    };
    Ok(serde_json::to_value(data)?)
}

fn parameter_from_data(corpus: &mut Corpus, data: Parameter) -> Result<NodeId> {
    let mut def = ParameterDef::new(data.name);
    def.explanation = data.explanation;
    def.default_value = create_constant(corpus, data.default_value.as_ref())?;
    def.required = data.required.unwrap_or(false);
    def.data_type = reference::from_optional(corpus, ReferenceKind::DataType, data.data_type.as_ref())?;
    Ok(corpus.make_object(NodeKind::Parameter(def)))
}

fn parameter_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Parameter> {
    let def = expect_kind(corpus, id, Node::as_parameter, "parameter")?;
    Ok(Parameter {
        name: def.name.clone(),
        explanation: def.explanation.clone(),
        default_value: def
            .default_value
            .as_ref()
            .map(|value| value_to_data(corpus, value, res_opt, options))
            .transpose()?,
        required: def.required.then_some(true),
        data_type: reference::to_optional(corpus, def.data_type, res_opt, options)?,
    })
}

pub fn parameter_to_data(
    corpus: &Corpus,
    id: NodeId,
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Value> {
    Ok(serde_json::to_value(parameter_data(corpus, id, res_opt, options)?)?)
}

pub fn data_type_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<DataType>(value, "data type") else {
        return Ok(None);
    };

    let mut def = DataTypeDef::new(data.data_type_name);
    def.explanation = data.explanation;
    def.extends_data_type =
        reference::from_optional(corpus, ReferenceKind::DataType, data.extends_data_type.as_ref())?;
    def.exhibits_traits = trait_list(corpus, data.exhibits_traits.as_ref())?;
    Ok(Some(corpus.make_object(NodeKind::DataType(def))))
}

pub fn data_type_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let def = expect_kind(corpus, id, Node::as_data_type, "data type")?;
    let data = DataType {
        data_type_name: def.data_type_name.clone(),
        explanation: def.explanation.clone(),
        extends_data_type: reference::to_optional(corpus, def.extends_data_type, res_opt, options)?,
        exhibits_traits: traits_to_data(corpus, &def.exhibits_traits, &[], res_opt, options)?,
    };
    Ok(serde_json::to_value(data)?)
}

pub fn purpose_from_data(corpus: &mut Corpus, value: &Value) -> Result<Option<NodeId>> {
    let Some(data) = parse::<Purpose>(value, "purpose") else {
        return Ok(None);
    };

    let mut def = PurposeDef::new(data.purpose_name);
    def.explanation = data.explanation;
    def.extends_purpose = reference::from_optional(corpus, ReferenceKind::Purpose, data.extends_purpose.as_ref())?;
    def.exhibits_traits = trait_list(corpus, data.exhibits_traits.as_ref())?;
    Ok(Some(corpus.make_object(NodeKind::Purpose(def))))
}

pub fn purpose_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let def = expect_kind(corpus, id, Node::as_purpose, "purpose")?;
    let data = Purpose {
        purpose_name: def.purpose_name.clone(),
        explanation: def.explanation.clone(),
        extends_purpose: reference::to_optional(corpus, def.extends_purpose, res_opt, options)?,
        exhibits_traits: traits_to_data(corpus, &def.exhibits_traits, &[], res_opt, options)?,
    };
    Ok(serde_json::to_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemagraph_model::{ArgumentValue, ObjectType, TraitToPropertyMap};
    use schemagraph_storage::StorageManager;
    use serde_json::json;

    fn corpus() -> Corpus {
        Corpus::with_storage(StorageManager::new())
    }

    #[test]
    fn entity_round_trip_keeps_trait_backed_fields() {
        let mut corpus = corpus();
        let value = json!({
            "entityName": "Customer",
            "extendsEntity": "CdmEntity",
            "exhibitsTraits": [{"traitReference": "is.identifiedBy", "arguments": ["Customer/(resolvedAttributes)/id"]}],
            "hasAttributes": [
                {"name": "id", "dataType": "entityId"},
                {"name": "primaryContact", "entity": "Contact"}
            ],
            "sourceName": "cust",
            "displayName": "Customer",
            "description": "A person or company that buys goods",
            "version": "1.2"
        });
        let id = entity_from_data(&mut corpus, &value).unwrap().unwrap();

        let entity = corpus.entity(id).unwrap();
        assert_eq!(entity.attributes.len(), 2);
        assert_eq!(entity.exhibits_traits.len(), 5);
        let first = corpus.node(entity.attributes[0]).unwrap().as_type_attribute().unwrap();
        assert_eq!(first.owning_entity_name.as_deref(), Some("Customer"));
        assert_eq!(
            TraitToPropertyMap::new(id).fetch_property_value(&corpus, "version").unwrap().as_deref(),
            Some("1.2")
        );

        let out = entity_to_data(&corpus, id, &ResolveOptions::default(), &CopyOptions::default()).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn trait_parameters_and_defaults() {
        let mut corpus = corpus();
        let value = json!({
            "traitName": "is.constrained",
            "extendsTrait": "is",
            "hasParameters": [
                {"name": "maximumLength", "dataType": "integer", "required": true},
                {"name": "defaultCase", "defaultValue": "lower"},
                {"name": "lookup", "defaultValue": {"entityReference": "Codes"}}
            ],
            "elevated": true,
            "associatedProperties": ["maximumLength"]
        });
        let id = trait_from_data(&mut corpus, &value).unwrap().unwrap();
        let def = corpus.node(id).unwrap().as_trait().unwrap();
        assert_eq!(def.parameters.len(), 3);

        let required = corpus.node(def.parameters[0]).unwrap().as_parameter().unwrap();
        assert!(required.required);
        let literal = corpus.node(def.parameters[1]).unwrap().as_parameter().unwrap();
        assert_eq!(literal.default_value, Some(ArgumentValue::Literal("lower".into())));
        let lookup = corpus.node(def.parameters[2]).unwrap().as_parameter().unwrap();
        let Some(ArgumentValue::Node(entity_ref)) = lookup.default_value else {
            panic!("expected a reference default");
        };
        assert_eq!(corpus.node(entity_ref).unwrap().object_type(), ObjectType::EntityRef);
        assert_eq!(corpus.node(entity_ref).unwrap().owner(), Some(def.parameters[2]));

        let out = trait_to_data(&corpus, id, &ResolveOptions::default(), &CopyOptions::default()).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn data_types_and_purposes_extend_their_own_kind() {
        let mut corpus = corpus();
        let data_type = data_type_from_data(&mut corpus, &json!({"dataTypeName": "email", "extendsDataType": "string"}))
            .unwrap()
            .unwrap();
        let extends = corpus.node(data_type).unwrap().as_data_type().unwrap().extends_data_type.unwrap();
        assert_eq!(corpus.node(extends).unwrap().object_type(), ObjectType::DataTypeRef);

        let purpose = purpose_from_data(&mut corpus, &json!({"purposeName": "identifiedBy", "extendsPurpose": "hasA"}))
            .unwrap()
            .unwrap();
        let extends = corpus.node(purpose).unwrap().as_purpose().unwrap().extends_purpose.unwrap();
        assert_eq!(corpus.node(extends).unwrap().object_type(), ObjectType::PurposeRef);
    }

    #[test]
    fn wrong_shapes_are_not_definitions() {
        let mut corpus = corpus();
        assert_eq!(entity_from_data(&mut corpus, &json!({"name": "x"})).unwrap(), None);
        assert_eq!(trait_from_data(&mut corpus, &json!("is.required")).unwrap(), None);
        assert!(corpus.is_empty());
    }
}
