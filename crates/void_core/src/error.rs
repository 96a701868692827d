//! Error types for the core library

use core::fmt;
use alloc::boxed::Box;

/// The core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A constructor is already registered under this class name
    AlreadyRegistered(Box<str>),
    /// No constructor is registered under this class name
    UnknownClass(Box<str>),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::AlreadyRegistered(name) => write!(f, "Class already registered: {}", name),
            CoreError::UnknownClass(name) => write!(f, "Class not registered: {}", name),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/// Result type alias
pub type CoreResult<T> = core::result::Result<T, CoreError>;
