//! # void_scope - Reflection Runtime
//!
//! Runtime-typed data that can be built, inspected, and edited by name:
//! - **Datum**: a homogeneous array whose element type is chosen at runtime,
//!   owning its storage or aliasing a native object's [`Field`]
//! - **Scope**: an ordered table of named datums
//! - **ScopeTree**: the arena that owns every table and keeps parent and
//!   child links consistent
//! - **Attributed**: native objects that reflect their fields as prescribed
//!   table attributes
//!
//! ## Example
//!
//! ```ignore
//! use void_scope::prelude::*;
//!
//! let mut tree: ScopeTree = ScopeTree::new();
//! let root = tree.create();
//! let child = tree.append_scope(root, "child")?;
//! tree.append(child, "health")?.assign(100)?;
//! assert_eq!(tree.search(child, "health").map(|(id, _)| id), Some(child));
//! ```

mod arena;
mod attributed;
mod datum;
mod error;
mod field;
mod scope;
pub mod text;
mod tree;

pub use arena::ScopeId;
pub use attributed::{
    short_type_name, Attributed, AttributedClone, Object, Signature, Signatures, THIS,
};
pub use datum::{Datum, DatumType, DatumValue, GROWTH};
pub use error::{DatumError, DatumResult, ScopeError, ScopeResult};
pub use field::Field;
pub use scope::Scope;
pub use tree::ScopeTree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Attributed, Datum, DatumType, Field, Object, Scope, ScopeError, ScopeId, ScopeResult,
        ScopeTree, Signatures,
    };
}
