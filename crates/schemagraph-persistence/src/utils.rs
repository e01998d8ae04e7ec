//! Shape dispatch: pick a node kind from the keys a JSON value carries
//!
//! Schema documents carry no explicit type tag. An attribute is told apart
//! from a reference, and one reference kind from another, by which keys are
//! present:
//!
//! | check (in order)                        | result                  |
//! |-----------------------------------------|-------------------------|
//! | `purpose`, `dataType` or `entity` set   | attribute branch        |
//! | ↳ `dataType`                            | type attribute          |
//! | ↳ `entity`                              | entity attribute        |
//! | ↳ neither                               | opaque value            |
//! | `purposeReference`                      | purpose reference       |
//! | `traitReference`                        | trait reference         |
//! | `dataTypeReference`                     | data type reference     |
//! | `entityReference`                       | entity reference        |
//! | `attributeGroupReference`               | attribute group ref     |
//! | anything else                           | opaque value            |
//!
//! Nothing here fails on an unrecognised shape; callers get `None` (or an
//! opaque value) and decide for themselves.

use crate::attribute::{entity_attribute_from_data, type_attribute_from_data};
use crate::error::Result;
use crate::reference::{self, ReferenceKind};
use crate::types::{IdentifierData, IdentifierRef};
use schemagraph_model::{
    ArgumentValue, CopyOptions, Corpus, ModelError, Node, NodeId, ResolveOptions, TraitProperty, TraitToPropertyMap,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Read `value` as one of the typed shapes in [`crate::types`]; a mismatch is
/// logged and reported as `None`.
pub(crate) fn parse<T: DeserializeOwned>(value: &Value, shape: &'static str) -> Option<T> {
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(shape, error = %err, "value does not match the expected shape");
            None
        }
    }
}

/// JSON truthiness of `obj[key]`: present and not null, false, zero or empty.
pub(crate) fn truthy(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Bool(true)) => true,
    }
}

/// Which row of the dispatch table an object matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantShape {
    TypeAttribute,
    EntityAttribute,
    Reference(ReferenceKind),
    Opaque,
}

const REFERENCE_PROBES: [ReferenceKind; 5] = [
    ReferenceKind::Purpose,
    ReferenceKind::Trait,
    ReferenceKind::DataType,
    ReferenceKind::Entity,
    ReferenceKind::AttributeGroup,
];

pub fn classify_constant(obj: &Map<String, Value>) -> ConstantShape {
    if truthy(obj, "purpose") || truthy(obj, "dataType") || truthy(obj, "entity") {
        return if truthy(obj, "dataType") {
            ConstantShape::TypeAttribute
        } else if truthy(obj, "entity") {
            ConstantShape::EntityAttribute
        } else {
            ConstantShape::Opaque
        };
    }
    REFERENCE_PROBES
        .into_iter()
        .find(|kind| truthy(obj, kind.key()))
        .map_or(ConstantShape::Opaque, ConstantShape::Reference)
}

/// Argument values: strings stay literals, recognised objects become nodes,
/// everything else is kept as an opaque value.
pub fn create_constant(corpus: &mut Corpus, value: Option<&Value>) -> Result<Option<ArgumentValue>> {
    let obj = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => return Ok(Some(ArgumentValue::Literal(s.clone()))),
        Some(Value::Object(obj)) => obj,
        Some(other) => return Ok(Some(ArgumentValue::Opaque(other.clone()))),
    };
    let value = Value::Object(obj.clone());

    let node = match classify_constant(obj) {
        ConstantShape::TypeAttribute => type_attribute_from_data(corpus, &value, None)?,
        ConstantShape::EntityAttribute => entity_attribute_from_data(corpus, &value)?,
        ConstantShape::Reference(kind) => reference::from_data(corpus, kind, &value)?,
        ConstantShape::Opaque => return Ok(Some(ArgumentValue::Opaque(value))),
    };
    Ok(Some(node.map_or(ArgumentValue::Opaque(value), ArgumentValue::Node)))
}

/// One member of an entity's `hasAttributes`; `None` for shapes that are not
/// attributes.
pub fn create_attribute(corpus: &mut Corpus, value: &Value, entity_name: Option<&str>) -> Result<Option<NodeId>> {
    match value {
        Value::String(_) => reference::from_data(corpus, ReferenceKind::AttributeGroup, value),
        Value::Object(obj) if obj.contains_key("attributeGroupReference") => {
            reference::from_data(corpus, ReferenceKind::AttributeGroup, value)
        }
        Value::Object(obj) if obj.contains_key("entity") => entity_attribute_from_data(corpus, value),
        Value::Object(obj) if obj.contains_key("name") => type_attribute_from_data(corpus, value, entity_name),
        _ => Ok(None),
    }
}

/// `None` when the input is absent or not an array; an empty array gives an
/// empty list. Unrecognised members are skipped with a warning.
pub fn create_attribute_array(
    corpus: &mut Corpus,
    value: Option<&Value>,
    entity_name: Option<&str>,
) -> Result<Option<Vec<NodeId>>> {
    let Some(Value::Array(items)) = value else {
        return Ok(None);
    };
    let mut attributes = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match create_attribute(corpus, item, entity_name)? {
            Some(attribute) => attributes.push(attribute),
            None => tracing::warn!(
                index,
                entity = entity_name.unwrap_or("<unknown>"),
                "skipping attribute with unrecognised shape"
            ),
        }
    }
    Ok(Some(attributes))
}

/// Same absent/empty rules as [`create_attribute_array`], for trait lists.
pub fn create_trait_reference_array(corpus: &mut Corpus, value: Option<&Value>) -> Result<Option<Vec<NodeId>>> {
    match value {
        Some(Value::Array(items)) => trait_refs_from(corpus, items).map(Some),
        _ => Ok(None),
    }
}

fn trait_refs_from(corpus: &mut Corpus, items: &[Value]) -> Result<Vec<NodeId>> {
    let mut traits = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match reference::from_data(corpus, ReferenceKind::Trait, item)? {
            Some(trait_ref) => traits.push(trait_ref),
            None => tracing::warn!(index, "skipping trait reference with unrecognised shape"),
        }
    }
    Ok(traits)
}

/// Trait list of a typed JSON struct; absent reads as empty.
pub(crate) fn trait_list(corpus: &mut Corpus, items: Option<&Vec<Value>>) -> Result<Vec<NodeId>> {
    match items {
        Some(items) => trait_refs_from(corpus, items),
        None => Ok(Vec::new()),
    }
}

/// Downcast `id` with `get`, or fail with the kind that was expected.
pub(crate) fn expect_kind<'a, T: 'a>(
    corpus: &'a Corpus,
    id: NodeId,
    get: impl Fn(&'a Node) -> Option<&'a T>,
    expected: &'static str,
) -> Result<&'a T> {
    let node = corpus.node(id)?;
    get(node).ok_or_else(|| {
        ModelError::WrongKind {
            id,
            expected,
            found: node.object_type(),
        }
        .into()
    })
}

/// Write each trait-backed property present in `values` onto `host`.
pub(crate) fn apply_properties(corpus: &mut Corpus, host: NodeId, values: &[(TraitProperty, Option<&str>)]) -> Result<()> {
    let properties = TraitToPropertyMap::new(host);
    for &(property, value) in values {
        if let Some(value) = value {
            properties.update_property_value(corpus, property.name(), Some(value))?;
        }
    }
    Ok(())
}

pub(crate) fn property(corpus: &Corpus, host: NodeId, property: TraitProperty) -> Result<Option<String>> {
    Ok(TraitToPropertyMap::new(host).fetch_property_value(corpus, property.name())?)
}

/// Trait list for output, leaving out the traits that back `properties`;
/// those are written as plain fields. `None` when nothing remains.
pub(crate) fn traits_to_data(
    corpus: &Corpus,
    traits: &[NodeId],
    properties: &[TraitProperty],
    res_opt: &ResolveOptions,
    options: &CopyOptions,
) -> Result<Option<Vec<Value>>> {
    let mut out = Vec::with_capacity(traits.len());
    for &trait_ref in traits {
        let backs_property = corpus
            .name_of(trait_ref)
            .is_some_and(|name| properties.iter().any(|p| p.trait_name() == name));
        if !backs_property {
            out.push(reference::to_data(corpus, trait_ref, res_opt, options)?);
        }
    }
    Ok((!out.is_empty()).then_some(out))
}

/// How a reference is written back out.
///
/// The bare identifier unless `string_refs` is requested and the reference
/// resolves, in which case the identifier travels with the definition's
/// absolute corpus path.
pub fn copy_identifier_ref(
    corpus: &Corpus,
    reference: NodeId,
    res_opt: &ResolveOptions,
    options: Option<&CopyOptions>,
) -> Result<IdentifierData> {
    let identifier = corpus.name_of(reference).unwrap_or_default().to_string();
    if !options.is_some_and(|o| o.string_refs) {
        return Ok(IdentifierData::Identifier(identifier));
    }

    let Some(definition) = corpus.fetch_object_definition(reference, res_opt)? else {
        return Ok(IdentifierData::Identifier(identifier));
    };
    Ok(IdentifierData::Ref(IdentifierRef {
        identifier,
        corpus_path: corpus.at_corpus_path(definition)?,
    }))
}
