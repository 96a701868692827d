//! Runtime type information for opaque object references
//!
//! Tables can hold references to arbitrary native objects. Such an object only
//! has to be [`Rtti`]: it can be compared polymorphically, described as text,
//! and downcast back to its concrete type by whoever knows what to expect.

use core::any::{Any, TypeId};
use core::fmt;
use alloc::string::String;
use alloc::sync::Arc;

/// Access to the concrete type behind a trait object
pub trait AsAny: Any {
    /// Get as Any reference (for downcasting)
    fn as_any(&self) -> &dyn Any;

    /// Get as mutable Any reference (for downcasting)
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Human-readable name of the concrete type
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

/// A native object that a table may reference opaquely
pub trait Rtti: AsAny + fmt::Debug + Send + Sync {
    /// Polymorphic equality. Identity unless the type knows better.
    fn equals(&self, other: &dyn Rtti) -> bool {
        core::ptr::eq(self as *const Self as *const (), other as *const dyn Rtti as *const ())
    }

    /// Text form used when a table is stringified
    fn describe(&self) -> String {
        alloc::format!("{:?}", self)
    }
}

/// Shared opaque reference stored in pointer-typed arrays
pub type RttiRef = Arc<dyn Rtti>;

impl<'a> dyn Rtti + 'a {
    /// Check the concrete type
    pub fn is<T: 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// TypeId of the concrete type
    pub fn concrete_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }
}

impl PartialEq for dyn Rtti {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker(u32);

    impl Rtti for Marker {}

    #[derive(Debug)]
    struct Tagged(&'static str);

    impl Rtti for Tagged {
        fn equals(&self, other: &dyn Rtti) -> bool {
            other.downcast_ref::<Tagged>().map_or(false, |o| o.0 == self.0)
        }

        fn describe(&self) -> String {
            self.0.into()
        }
    }

    #[test]
    fn test_identity_equality() {
        let a: RttiRef = Arc::new(Marker(1));
        let b: RttiRef = Arc::new(Marker(1));
        let a2 = a.clone();

        assert!(*a == *a2);
        assert!(*a != *b);
    }

    #[test]
    fn test_custom_equality_and_describe() {
        let a: RttiRef = Arc::new(Tagged("hero"));
        let b: RttiRef = Arc::new(Tagged("hero"));
        let c: RttiRef = Arc::new(Marker(7));

        assert!(*a == *b);
        assert!(*a != *c);
        assert_eq!(b.describe(), "hero");
        assert_eq!(c.describe(), "Marker(7)");
    }

    #[test]
    fn test_downcast() {
        let r: RttiRef = Arc::new(Marker(42));

        assert!(r.is::<Marker>());
        assert!(!r.is::<Tagged>());
        assert_eq!(r.downcast_ref::<Marker>().unwrap().0, 42);
        assert_eq!(r.concrete_type_id(), TypeId::of::<Marker>());
        assert!((*r).type_name().contains("Marker"));
    }
}
