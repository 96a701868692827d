use std::path::PathBuf;

use thiserror::Error;
use void_scope::{DatumError, ScopeError, ScopeId};
use void_world::WorldError;

/// Errors raised while loading a document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document root is not an object")]
    RootNotObject,

    #[error("key '{0}' has too few '_' separated parts")]
    MalformedKey(String),

    #[error("'{key}' cannot be placed under scope {focus}")]
    UnexpectedContainer { key: String, focus: ScopeId },

    #[error("leaf '{0}' has no Type")]
    MissingType(String),

    #[error("leaf '{key}' has unknown type '{type_name}'")]
    UnknownType { key: String, type_name: String },

    #[error("helpers of a cloned parse master cannot be changed")]
    CloneLocked,

    #[error("no helper at index {index} (have {len})")]
    NoHelper { index: usize, len: usize },

    #[error("shared data is not a {0}")]
    SharedDataType(&'static str),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Datum(#[from] DatumError),
}

pub type ParseResult<T> = Result<T, ParseError>;
