use thiserror::Error;
use void_core::CoreError;
use void_scope::{DatumError, ScopeError, ScopeId};

/// Errors raised while building or updating a world
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Datum(#[from] DatumError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("no {family} class named '{class}'")]
    UnknownClass { family: &'static str, class: String },

    #[error("scope {0} does not hold a game object")]
    NotAGameObject(ScopeId),

    #[error("scope {id} is not a {expected}")]
    WrongKind { id: ScopeId, expected: &'static str },

    #[error("action {id} selected the empty '{branch}' branch")]
    InvalidBranch { id: ScopeId, branch: &'static str },

    #[error("scope {0} has no parent")]
    Detached(ScopeId),
}

pub type WorldResult<T> = Result<T, WorldError>;
