//! Schemagraph object model
//!
//! A typed graph of schema definitions and references held in a single
//! arena:
//!
//! ```text
//!   Corpus ── nodes: Vec<Node> ── NodeId(u32)
//!     │
//!     ├── Manifest ─┬─ LocalEntityDeclaration ── DataPartition
//!     │             └─ ManifestDeclaration
//!     └── Document ──── Entity ─┬─ TypeAttribute ── DataTypeRef
//!                               └─ TraitRef ── Argument
//! ```
//!
//! - **Ownership**: parents list children; `owner` is a plain id back-edge
//! - **Traversal**: [`Corpus::visit`] builds and caches declared paths
//! - **File status**: partitions and declarations report modification times
//!   up the owner chain ([`FileStatus`])
//! - **Resolution**: named references resolve against registered documents;
//!   [`SymbolSet`] keeps recursive walks finite

pub mod context;
pub mod copy;
pub mod corpus;
pub mod declaration;
pub mod definition;
pub mod document;
pub mod error;
pub mod file_status;
pub mod node;
pub mod object_type;
pub mod options;
pub mod partition;
pub mod reference;
pub mod resolve;
pub mod symbol_set;
pub mod trait_to_property;
pub mod visit;

pub use context::{Clock, CorpusContext, CorpusOptions, ManualClock, SystemClock};
pub use corpus::Corpus;
pub use declaration::{LocalEntityDeclarationDef, ManifestDeclarationDef, ReferencedEntityDeclarationDef};
pub use definition::{
    AttributeGroupDef, DataTypeDef, EntityAttributeDef, EntityDef, ParameterDef, PurposeDef, TraitDef,
    TypeAttributeDef,
};
pub use document::{DocumentDef, FolderDef, ImportDef, ManifestDef};
pub use error::{ModelError, Result};
pub use file_status::{max_time, FileStatus};
pub use node::{ChildGroup, ChildPrefix, Node, NodeId, NodeKind};
pub use object_type::ObjectType;
pub use options::{CopyOptions, ResolveOptions, VisitOptions};
pub use partition::DataPartitionDef;
pub use reference::{ArgumentDef, ArgumentValue, ObjectReference, RefTarget};
pub use symbol_set::SymbolSet;
pub use trait_to_property::{TraitProperty, TraitToPropertyMap};
pub use visit::{INLINE_REF, UNNAMED};
