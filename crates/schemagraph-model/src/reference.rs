//! References to definitions and trait arguments

use crate::{NodeId, ObjectType};
use serde_json::Value;

/// What a reference points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// By name (`"Customer"`, `"Customer.cdm.json/Customer"`).
    Named(String),
    /// An inline definition owned by the reference.
    Explicit(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectReference {
    object_type: ObjectType,
    pub target: RefTarget,
    /// Written as a bare string rather than an `{xReference: ...}` object.
    pub simple_named_reference: bool,
    pub applied_traits: Vec<NodeId>,
    /// Argument nodes; only trait references carry them.
    pub arguments: Vec<NodeId>,
}

impl ObjectReference {
    pub fn new(object_type: ObjectType, target: RefTarget, simple_named_reference: bool) -> Self {
        debug_assert!(object_type.is_reference(), "{object_type} is not a reference kind");
        Self {
            object_type,
            target,
            simple_named_reference,
            applied_traits: Vec::new(),
            arguments: Vec::new(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn named_reference(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Named(name) => Some(name),
            RefTarget::Explicit(_) => None,
        }
    }

    pub fn explicit_reference(&self) -> Option<NodeId> {
        match self.target {
            RefTarget::Explicit(id) => Some(id),
            RefTarget::Named(_) => None,
        }
    }
}

/// Value of a trait argument or parameter default.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// A raw string, never treated as a reference.
    Literal(String),
    /// A JSON value whose shape matched no known node kind.
    Opaque(Value),
    /// A typed node (attribute or reference) owned by the argument.
    Node(NodeId),
}

impl ArgumentValue {
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            ArgumentValue::Literal(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentDef {
    pub name: Option<String>,
    pub explanation: Option<String>,
    pub value: Option<ArgumentValue>,
}

impl ArgumentDef {
    pub fn new(name: Option<String>, value: Option<ArgumentValue>) -> Self {
        Self {
            name,
            explanation: None,
            value,
        }
    }
}
