//! References and trait arguments
//!
//! A reference is written either as a bare name (`"Customer"`) or as an
//! object keyed by its kind (`{"entityReference": ..., "appliedTraits": [...]}`)
//! whose target is a name or an inline definition.

use crate::attribute::attribute_group_from_data;
use crate::definition::{data_type_from_data, entity_from_data, purpose_from_data, trait_from_data};
use crate::error::Result;
use crate::utils::{copy_identifier_ref, create_constant, create_trait_reference_array};
use schemagraph_model::{
    ArgumentDef, ArgumentValue, CopyOptions, Corpus, ModelError, NodeId, NodeKind, ObjectReference, ObjectType,
    RefTarget, ResolveOptions,
};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Trait,
    Purpose,
    DataType,
    Entity,
    AttributeGroup,
}

impl ReferenceKind {
    /// Key holding the target in the object form.
    pub fn key(self) -> &'static str {
        match self {
            ReferenceKind::Trait => "traitReference",
            ReferenceKind::Purpose => "purposeReference",
            ReferenceKind::DataType => "dataTypeReference",
            ReferenceKind::Entity => "entityReference",
            ReferenceKind::AttributeGroup => "attributeGroupReference",
        }
    }

    pub fn object_type(self) -> ObjectType {
        match self {
            ReferenceKind::Trait => ObjectType::TraitRef,
            ReferenceKind::Purpose => ObjectType::PurposeRef,
            ReferenceKind::DataType => ObjectType::DataTypeRef,
            ReferenceKind::Entity => ObjectType::EntityRef,
            ReferenceKind::AttributeGroup => ObjectType::AttributeGroupRef,
        }
    }

    pub fn from_object_type(object_type: ObjectType) -> Option<Self> {
        match object_type {
            ObjectType::TraitRef => Some(ReferenceKind::Trait),
            ObjectType::PurposeRef => Some(ReferenceKind::Purpose),
            ObjectType::DataTypeRef => Some(ReferenceKind::DataType),
            ObjectType::EntityRef => Some(ReferenceKind::Entity),
            ObjectType::AttributeGroupRef => Some(ReferenceKind::AttributeGroup),
            _ => None,
        }
    }
}

fn inline_definition(corpus: &mut Corpus, kind: ReferenceKind, value: &Value) -> Result<Option<NodeId>> {
    match kind {
        ReferenceKind::Trait => trait_from_data(corpus, value),
        ReferenceKind::Purpose => purpose_from_data(corpus, value),
        ReferenceKind::DataType => data_type_from_data(corpus, value),
        ReferenceKind::Entity => entity_from_data(corpus, value),
        ReferenceKind::AttributeGroup => attribute_group_from_data(corpus, value),
    }
}

/// Build a reference of `kind` from its string or object form.
pub fn from_data(corpus: &mut Corpus, kind: ReferenceKind, value: &Value) -> Result<Option<NodeId>> {
    let obj = match value {
        Value::String(name) => return Ok(Some(corpus.make_ref(kind.object_type(), name.clone(), true))),
        Value::Object(obj) => obj,
        _ => return Ok(None),
    };

    let target = match obj.get(kind.key()) {
        Some(Value::String(name)) => RefTarget::Named(name.clone()),
        Some(definition @ Value::Object(_)) => match inline_definition(corpus, kind, definition)? {
            Some(definition) => RefTarget::Explicit(definition),
            None => return Ok(None),
        },
        _ => {
            tracing::warn!(key = kind.key(), "reference object without a usable target");
            return Ok(None);
        }
    };

    let mut reference = ObjectReference::new(kind.object_type(), target, false);
    reference.applied_traits = create_trait_reference_array(corpus, obj.get("appliedTraits"))?.unwrap_or_default();
    if kind == ReferenceKind::Trait {
        if let Some(Value::Array(arguments)) = obj.get("arguments") {
            for argument in arguments {
                reference.arguments.push(argument_from_data(corpus, argument)?);
            }
        }
    }
    Ok(Some(corpus.make_object(NodeKind::Reference(reference))))
}

/// [`from_data`] for an optional field.
pub(crate) fn from_optional(corpus: &mut Corpus, kind: ReferenceKind, value: Option<&Value>) -> Result<Option<NodeId>> {
    match value {
        Some(value) => from_data(corpus, kind, value),
        None => Ok(None),
    }
}

/// [`to_data`] for an optional slot.
pub(crate) fn to_optional(
    corpus: &Corpus,
    id: Option<NodeId>,
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Option<Value>> {
    id.map(|id| to_data(corpus, id, res_opt, options)).transpose()
}

/// An argument is either `{name?, explanation?, value}` or the bare value.
pub fn argument_from_data(corpus: &mut Corpus, value: &Value) -> Result<NodeId> {
    let (name, explanation, raw) = match value {
        Value::Object(obj) if obj.get("value").is_some_and(|v| !v.is_null()) => (
            obj.get("name").and_then(Value::as_str).map(str::to_string),
            obj.get("explanation").and_then(Value::as_str).map(str::to_string),
            obj.get("value"),
        ),
        other => (None, None, Some(other)),
    };
    let mut argument = ArgumentDef::new(name, create_constant(corpus, raw)?);
    argument.explanation = explanation;
    Ok(corpus.make_object(NodeKind::Argument(argument)))
}

pub fn to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let node = corpus.node(id)?;
    let reference = corpus.reference(id)?;
    let kind = ReferenceKind::from_object_type(reference.object_type()).ok_or(ModelError::WrongKind {
        id,
        expected: "persistable reference",
        found: node.object_type(),
    })?;

    let target = match reference.target {
        RefTarget::Named(_) => serde_json::to_value(copy_identifier_ref(corpus, id, res_opt, Some(options))?)?,
        RefTarget::Explicit(definition) => crate::to_data(corpus, definition, res_opt, options)?,
    };
    let bare = reference.simple_named_reference
        && reference.applied_traits.is_empty()
        && reference.arguments.is_empty()
        && matches!(reference.target, RefTarget::Named(_));
    if bare {
        return Ok(target);
    }

    let mut obj = Map::new();
    obj.insert(kind.key().to_string(), target);
    if !reference.applied_traits.is_empty() {
        let traits = crate::list_to_data(corpus, &reference.applied_traits, res_opt, options)?;
        obj.insert("appliedTraits".into(), Value::Array(traits));
    }
    if !reference.arguments.is_empty() {
        let arguments = crate::list_to_data(corpus, &reference.arguments, res_opt, options)?;
        obj.insert("arguments".into(), Value::Array(arguments));
    }
    Ok(Value::Object(obj))
}

/// Inverse of [`create_constant`].
pub fn value_to_data(
    corpus: &Corpus,
    value: &ArgumentValue,
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Value> {
    match value {
        ArgumentValue::Literal(s) => Ok(Value::String(s.clone())),
        ArgumentValue::Opaque(v) => Ok(v.clone()),
        ArgumentValue::Node(inner) => crate::to_data(corpus, *inner, res_opt, options),
    }
}

pub fn argument_to_data(corpus: &Corpus, id: NodeId, res_opt: &ResolveOptions, options: &CopyOptions) -> Result<Value> {
    let node = corpus.node(id)?;
    let argument = node.as_argument().ok_or(ModelError::WrongKind {
        id,
        expected: "argument",
        found: node.object_type(),
    })?;

    let value = match &argument.value {
        Some(value) => value_to_data(corpus, value, res_opt, options)?,
        None => Value::Null,
    };
    if argument.name.is_none() && argument.explanation.is_none() {
        return Ok(value);
    }

    let mut obj = Map::new();
    if let Some(name) = &argument.name {
        obj.insert("name".into(), Value::String(name.clone()));
    }
    if let Some(explanation) = &argument.explanation {
        obj.insert("explanation".into(), Value::String(explanation.clone()));
    }
    obj.insert("value".into(), value);
    Ok(Value::Object(obj))
}
