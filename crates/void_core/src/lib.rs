//! # void_core - Void Engine Core
//!
//! Zero-dependency primitives shared by every layer of the reflection runtime:
//! - **Runtime type information**: [`AsAny`] and [`Rtti`], the opaque object
//!   reference that tables can hold
//! - **Named factories**: [`Factory`], a class-name to constructor registry
//!   that is built at startup and passed around explicitly
//! - **Errors**: [`CoreError`] for registry misuse

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod error;
pub mod factory;
pub mod rtti;

pub use error::*;
pub use factory::*;
pub use rtti::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::factory::Factory;
    pub use crate::rtti::{AsAny, Rtti, RttiRef};
}
