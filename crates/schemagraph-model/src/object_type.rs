//! Closed set of node kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the concrete kind of every node in a corpus.
///
/// The tag is fixed when a node is created; downcasts and the JSON shape
/// dispatcher both route on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectType {
    Error,
    Import,
    ArgumentDef,
    ParameterDef,
    TraitDef,
    TraitRef,
    PurposeDef,
    PurposeRef,
    DataTypeDef,
    DataTypeRef,
    AttributeRef,
    TypeAttributeDef,
    EntityAttributeDef,
    AttributeGroupDef,
    AttributeGroupRef,
    ConstantEntityDef,
    EntityDef,
    EntityRef,
    DocumentDef,
    ManifestDef,
    FolderDef,
    AttributeContextDef,
    AttributeContextRef,
    ManifestDeclarationDef,
    ReferencedEntityDeclarationDef,
    DataPartitionDef,
    DataPartitionPatternDef,
    LocalEntityDeclarationDef,
    AttributeResolutionGuidanceDef,
    #[serde(rename = "e2eRelationshipDef")]
    E2ERelationshipDef,
}

impl ObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Error => "error",
            ObjectType::Import => "import",
            ObjectType::ArgumentDef => "argumentDef",
            ObjectType::ParameterDef => "parameterDef",
            ObjectType::TraitDef => "traitDef",
            ObjectType::TraitRef => "traitRef",
            ObjectType::PurposeDef => "purposeDef",
            ObjectType::PurposeRef => "purposeRef",
            ObjectType::DataTypeDef => "dataTypeDef",
            ObjectType::DataTypeRef => "dataTypeRef",
            ObjectType::AttributeRef => "attributeRef",
            ObjectType::TypeAttributeDef => "typeAttributeDef",
            ObjectType::EntityAttributeDef => "entityAttributeDef",
            ObjectType::AttributeGroupDef => "attributeGroupDef",
            ObjectType::AttributeGroupRef => "attributeGroupRef",
            ObjectType::ConstantEntityDef => "constantEntityDef",
            ObjectType::EntityDef => "entityDef",
            ObjectType::EntityRef => "entityRef",
            ObjectType::DocumentDef => "documentDef",
            ObjectType::ManifestDef => "manifestDef",
            ObjectType::FolderDef => "folderDef",
            ObjectType::AttributeContextDef => "attributeContextDef",
            ObjectType::AttributeContextRef => "attributeContextRef",
            ObjectType::ManifestDeclarationDef => "manifestDeclarationDef",
            ObjectType::ReferencedEntityDeclarationDef => "referencedEntityDeclarationDef",
            ObjectType::DataPartitionDef => "dataPartitionDef",
            ObjectType::DataPartitionPatternDef => "dataPartitionPatternDef",
            ObjectType::LocalEntityDeclarationDef => "localEntityDeclarationDef",
            ObjectType::AttributeResolutionGuidanceDef => "attributeResolutionGuidanceDef",
            ObjectType::E2ERelationshipDef => "e2eRelationshipDef",
        }
    }

    pub fn is_reference(self) -> bool {
        matches!(
            self,
            ObjectType::TraitRef
                | ObjectType::PurposeRef
                | ObjectType::DataTypeRef
                | ObjectType::AttributeRef
                | ObjectType::AttributeGroupRef
                | ObjectType::EntityRef
                | ObjectType::AttributeContextRef
        )
    }

    /// The definition kind a reference of this kind points at.
    pub fn definition_for_reference(self) -> Option<ObjectType> {
        match self {
            ObjectType::TraitRef => Some(ObjectType::TraitDef),
            ObjectType::PurposeRef => Some(ObjectType::PurposeDef),
            ObjectType::DataTypeRef => Some(ObjectType::DataTypeDef),
            ObjectType::AttributeGroupRef => Some(ObjectType::AttributeGroupDef),
            ObjectType::EntityRef => Some(ObjectType::EntityDef),
            ObjectType::AttributeContextRef => Some(ObjectType::AttributeContextDef),
            _ => None,
        }
    }

    pub fn reference_for_definition(self) -> Option<ObjectType> {
        match self {
            ObjectType::TraitDef => Some(ObjectType::TraitRef),
            ObjectType::PurposeDef => Some(ObjectType::PurposeRef),
            ObjectType::DataTypeDef => Some(ObjectType::DataTypeRef),
            ObjectType::AttributeGroupDef => Some(ObjectType::AttributeGroupRef),
            ObjectType::EntityDef => Some(ObjectType::EntityRef),
            ObjectType::AttributeContextDef => Some(ObjectType::AttributeContextRef),
            _ => None,
        }
    }

    /// Kinds that track file modification times and report them upward.
    pub fn supports_file_status(self) -> bool {
        matches!(
            self,
            ObjectType::DataPartitionDef
                | ObjectType::LocalEntityDeclarationDef
                | ObjectType::ManifestDeclarationDef
                | ObjectType::ManifestDef
        )
    }

    pub fn is_document(self) -> bool {
        matches!(self, ObjectType::DocumentDef | ObjectType::ManifestDef)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_and_definition_kinds_pair_up() {
        for def in [
            ObjectType::TraitDef,
            ObjectType::PurposeDef,
            ObjectType::DataTypeDef,
            ObjectType::AttributeGroupDef,
            ObjectType::EntityDef,
        ] {
            let reference = def.reference_for_definition().unwrap();
            assert!(reference.is_reference());
            assert_eq!(reference.definition_for_reference(), Some(def));
        }
        assert!(ObjectType::DataPartitionDef.reference_for_definition().is_none());
    }

    #[test]
    fn serde_name_matches_display() {
        let json = serde_json::to_string(&ObjectType::DataPartitionDef).unwrap();
        assert_eq!(json, format!("\"{}\"", ObjectType::DataPartitionDef));
    }
}
