//! Named-constructor registries
//!
//! A [`Factory`] maps a class name to a closure that default-constructs a
//! concrete type and hands it out as the abstract product `P`. Registries are
//! plain values: build them at startup and pass them to whoever instantiates
//! objects by name.

use core::fmt;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::error::{CoreError, CoreResult};

/// Constructor closure stored in a factory
pub type Constructor<P> = Arc<dyn Fn() -> Arc<P> + Send + Sync>;

/// Registry of constructors for one abstract product type
pub struct Factory<P: ?Sized> {
    constructors: BTreeMap<String, Constructor<P>>,
}

impl<P: ?Sized + 'static> Factory<P> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor under a class name
    pub fn add<F>(&mut self, class_name: impl Into<String>, constructor: F) -> CoreResult<&mut Self>
    where
        F: Fn() -> Arc<P> + Send + Sync + 'static,
    {
        let class_name = class_name.into();
        if self.constructors.contains_key(&class_name) {
            return Err(CoreError::AlreadyRegistered(class_name.into_boxed_str()));
        }
        self.constructors.insert(class_name, Arc::new(constructor));
        Ok(self)
    }

    /// Remove a constructor, returning whether one was registered
    pub fn remove(&mut self, class_name: &str) -> bool {
        self.constructors.remove(class_name).is_some()
    }

    /// Check if a class name is registered
    pub fn contains(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    /// Create an instance by class name
    pub fn create(&self, class_name: &str) -> Option<Arc<P>> {
        self.constructors.get(class_name).map(|f| f())
    }

    /// Create an instance or report the missing class
    pub fn try_create(&self, class_name: &str) -> CoreResult<Arc<P>> {
        self.create(class_name)
            .ok_or_else(|| CoreError::UnknownClass(Box::from(class_name)))
    }

    /// Registered class names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Get the number of registered classes
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl<P: ?Sized + 'static> Default for Factory<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized> Clone for Factory<P> {
    fn clone(&self) -> Self {
        Self {
            constructors: self.constructors.clone(),
        }
    }
}

impl<P: ?Sized> fmt::Debug for Factory<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("classes", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Register `T::default()` under a class name, coercing to the product type.
///
/// ```ignore
/// register!(factory, "Entity" => Entity as dyn GameObject);
/// ```
#[macro_export]
macro_rules! register {
    ($factory:expr, $name:expr => $ty:ty as $product:ty) => {
        $factory.add($name, || -> ::std::sync::Arc<$product> {
            ::std::sync::Arc::new(<$ty as ::core::default::Default>::default())
        })
    };
}
