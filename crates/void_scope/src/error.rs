use thiserror::Error;

use crate::arena::ScopeId;
use crate::datum::DatumType;

/// Contract violations on a single [`Datum`](crate::Datum)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatumError {
    #[error("type mismatch: datum holds {expected}, got {found}")]
    TypeMismatch { expected: DatumType, found: DatumType },

    #[error("index {index} out of bounds for datum of size {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("external storage cannot be resized or restructured")]
    ExternalStorage,

    #[error("external storage must hold at least one element")]
    EmptyExternalStorage,

    #[error("datum already owns internal storage")]
    AlreadyInternal,

    #[error("datum type is not set")]
    UnknownType,

    #[error("{0} is not a valid datum type here")]
    InvalidType(DatumType),

    #[error("datum is empty")]
    Empty,

    #[error("cannot parse {text:?} as {target}")]
    Parse { text: String, target: DatumType },

    #[error("{0} elements have no text form")]
    NotTextual(DatumType),

    #[error("{0} elements have no default value")]
    NoDefault(DatumType),

    #[error("{0} elements cannot live in external storage")]
    NoExternal(DatumType),

    #[error("Table elements are adopted and orphaned through the scope tree")]
    TreeOwned,
}

/// Contract violations on the table tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScopeError {
    #[error(transparent)]
    Datum(#[from] DatumError),

    #[error("stale or unknown scope handle {0}")]
    InvalidHandle(ScopeId),

    #[error("a scope cannot adopt itself")]
    SelfAdoption,

    #[error("adopting {child} under {parent} would make it its own ancestor")]
    Cycle { parent: ScopeId, child: ScopeId },

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: ScopeId, child: ScopeId },

    #[error("key '{key}' already holds {found} data")]
    KeyTypeMismatch { key: String, found: DatumType },

    #[error("index {index} out of bounds for scope of size {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("'{0}' is a prescribed attribute")]
    PrescribedCollision(String),

    #[error("scope {0} does not reflect a native object")]
    NotAttributed(ScopeId),
}

pub type DatumResult<T> = Result<T, DatumError>;
pub type ScopeResult<T> = Result<T, ScopeError>;
