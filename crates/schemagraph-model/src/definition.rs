//! Named definitions: entities, attributes, traits, data types, purposes

use crate::reference::ArgumentValue;
use crate::NodeId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDef {
    pub entity_name: String,
    pub explanation: Option<String>,
    /// Entity reference this entity extends.
    pub extends_entity: Option<NodeId>,
    pub exhibits_traits: Vec<NodeId>,
    /// Type attributes, entity attributes and attribute group references.
    pub attributes: Vec<NodeId>,
    pub cdm_schemas: Vec<String>,
}

impl EntityDef {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }
}

/// Attribute typed by a data type reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAttributeDef {
    pub name: String,
    pub explanation: Option<String>,
    pub purpose: Option<NodeId>,
    pub data_type: Option<NodeId>,
    pub applied_traits: Vec<NodeId>,
    pub is_nullable: Option<bool>,
    /// Entity that declared the attribute, kept for diagnostics.
    pub owning_entity_name: Option<String>,
}

impl TypeAttributeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Attribute whose type is another entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityAttributeDef {
    pub name: String,
    pub explanation: Option<String>,
    pub purpose: Option<NodeId>,
    pub entity: Option<NodeId>,
    pub applied_traits: Vec<NodeId>,
}

impl EntityAttributeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeGroupDef {
    pub attribute_group_name: String,
    pub explanation: Option<String>,
    pub members: Vec<NodeId>,
    pub exhibits_traits: Vec<NodeId>,
}

impl AttributeGroupDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            attribute_group_name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraitDef {
    pub trait_name: String,
    pub explanation: Option<String>,
    pub extends_trait: Option<NodeId>,
    pub parameters: Vec<NodeId>,
    pub elevated: Option<bool>,
    pub ugly: Option<bool>,
    pub associated_properties: Vec<String>,
}

impl TraitDef {
    pub fn new(trait_name: impl Into<String>) -> Self {
        Self {
            trait_name: trait_name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterDef {
    pub name: String,
    pub explanation: Option<String>,
    pub default_value: Option<ArgumentValue>,
    pub required: bool,
    pub data_type: Option<NodeId>,
}

impl ParameterDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTypeDef {
    pub data_type_name: String,
    pub explanation: Option<String>,
    pub extends_data_type: Option<NodeId>,
    pub exhibits_traits: Vec<NodeId>,
}

impl DataTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            data_type_name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurposeDef {
    pub purpose_name: String,
    pub explanation: Option<String>,
    pub extends_purpose: Option<NodeId>,
    pub exhibits_traits: Vec<NodeId>,
}

impl PurposeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            purpose_name: name.into(),
            ..Self::default()
        }
    }
}
