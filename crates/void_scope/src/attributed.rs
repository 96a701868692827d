//! Reflection of native objects onto tables
//!
//! A type that implements [`Attributed`] declares a list of *prescribed*
//! attributes through [`Signatures`]. When such an object is placed in a
//! [`ScopeTree`], its table gets one entry per signature plus a `"this"`
//! entry pointing back at the object. External signatures alias the
//! object's [`Field`]s, so writes through the table are seen by the object
//! and the other way round.
//!
//! Any other entry of an attributed table is *auxiliary*.

use std::any::TypeId;
use std::sync::Arc;

use void_core::{Rtti, RttiRef};

use crate::arena::ScopeId;
use crate::datum::{Datum, DatumType, DatumValue};
use crate::error::{DatumError, ScopeError, ScopeResult};
use crate::field::Field;
use crate::tree::ScopeTree;

/// Key of the entry that points back at the reflected object
pub const THIS: &str = "this";

/// A native object that reflects some of its state as table attributes
pub trait Attributed: Rtti + AttributedClone {
    /// Declare the prescribed attributes, in order
    fn initialize_attributes(&self, signatures: &mut Signatures);

    /// Short name of the concrete type
    fn class_name(&self) -> &'static str {
        short_type_name(self.type_name())
    }
}

/// Object-safe cloning for [`Attributed`] trait objects
pub trait AttributedClone {
    fn clone_attributed(&self) -> Arc<dyn Attributed>;
}

impl<T: Attributed + Clone> AttributedClone for T {
    fn clone_attributed(&self) -> Arc<dyn Attributed> {
        Arc::new(self.clone())
    }
}

/// Last path segment of a type name, generics stripped
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// What a [`ScopeTree`] stores about each reflected object.
///
/// Implemented for `dyn Attributed`; richer object families (trait objects
/// whose trait extends [`Attributed`]) implement it to keep their own
/// vtable in the tree.
pub trait Object: Send + Sync + 'static {
    fn attributed(&self) -> &dyn Attributed;

    /// Independent copy with its own fields
    fn duplicate(&self) -> Arc<Self>;

    fn into_rtti(self: Arc<Self>) -> RttiRef;
}

impl Object for dyn Attributed {
    fn attributed(&self) -> &dyn Attributed {
        self
    }

    fn duplicate(&self) -> Arc<Self> {
        self.clone_attributed()
    }

    fn into_rtti(self: Arc<Self>) -> RttiRef {
        self
    }
}

/// One prescribed attribute
#[derive(Debug, Clone)]
pub enum Signature {
    /// Owned by the table, seeded with default elements
    Internal { name: String, defaults: Datum },
    /// Aliases a field of the native object
    External { name: String, view: Datum },
    /// Nested tables
    Table { name: String },
}

impl Signature {
    pub fn name(&self) -> &str {
        match self {
            Signature::Internal { name, .. }
            | Signature::External { name, .. }
            | Signature::Table { name } => name,
        }
    }
}

/// Builder passed to [`Attributed::initialize_attributes`]
#[derive(Debug, Default)]
pub struct Signatures {
    entries: Vec<Signature>,
    error: Option<DatumError>,
}

impl Signatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table-owned attribute with `count` copies of `default`
    pub fn internal<T: DatumValue>(&mut self, name: &str, default: T, count: usize) -> &mut Self {
        self.entries.push(Signature::Internal {
            name: name.to_string(),
            defaults: Datum::from_values(vec![default; count]),
        });
        self
    }

    /// Attribute aliasing `field`
    pub fn external<T: DatumValue>(&mut self, name: &str, field: &Field<T>) -> &mut Self {
        match Datum::external(field) {
            Ok(view) => self.entries.push(Signature::External {
                name: name.to_string(),
                view,
            }),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Attribute holding child tables
    pub fn table(&mut self, name: &str) -> &mut Self {
        self.entries.push(Signature::Table {
            name: name.to_string(),
        });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Signature::name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signature> {
        self.entries.iter()
    }

    fn finish(self) -> Result<Vec<Signature>, DatumError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.entries),
        }
    }
}

fn declare<O: ?Sized + Object>(object: &O) -> ScopeResult<Vec<Signature>> {
    let mut signatures = Signatures::new();
    object.attributed().initialize_attributes(&mut signatures);
    Ok(signatures.finish()?)
}

fn type_key<O: ?Sized + Object>(object: &O) -> TypeId {
    object.attributed().as_any().type_id()
}

impl<O: ?Sized + Object> ScopeTree<O> {
    /// Create a root table reflecting `object`
    pub fn create_attributed(&mut self, object: Arc<O>) -> ScopeResult<ScopeId> {
        let id = self.create();
        if let Err(err) = self.populate(id, object) {
            self.nodes.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    fn populate(&mut self, id: ScopeId, object: Arc<O>) -> ScopeResult<()> {
        let signatures = declare(&*object)?;
        self.register(type_key(&*object), THIS);
        self.node_mut(id)?.object = Some(object.clone());
        *self.slot(id, THIS)? = Datum::from(object.into_rtti());
        for signature in signatures {
            self.apply_signature(id, signature)?;
        }
        Ok(())
    }

    /// Point a copied table at its own object: `"this"` and every external
    /// attribute are re-aimed at `object`'s fields
    pub(crate) fn rebind(&mut self, id: ScopeId, object: Arc<O>) -> ScopeResult<()> {
        let signatures = declare(&*object)?;
        self.node_mut(id)?.object = Some(object.clone());
        *self.slot(id, THIS)? = Datum::from(object.into_rtti());
        for signature in signatures {
            if let Signature::External { name, view } = signature {
                *self.slot(id, &name)? = view;
            }
        }
        Ok(())
    }

    fn type_of(&self, id: ScopeId) -> ScopeResult<TypeId> {
        self.node(id)?
            .object
            .as_deref()
            .map(type_key)
            .ok_or(ScopeError::NotAttributed(id))
    }

    fn register(&mut self, key: TypeId, name: &str) {
        let names = self.prescribed.entry(key).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    fn apply_signature(&mut self, id: ScopeId, signature: Signature) -> ScopeResult<()> {
        let key = self.type_of(id)?;
        let name = signature.name().to_string();
        let datum = self.slot(id, &name)?;
        match signature {
            Signature::Internal { defaults, .. } => {
                if datum.is_empty() {
                    datum.assign_from(&defaults)?;
                } else if datum.datum_type() != defaults.datum_type() {
                    return Err(DatumError::TypeMismatch {
                        expected: datum.datum_type(),
                        found: defaults.datum_type(),
                    }
                    .into());
                }
            }
            Signature::External { view, .. } => {
                if !datum.is_empty() && !datum.is_external() {
                    return Err(DatumError::AlreadyInternal.into());
                }
                *datum = view;
            }
            Signature::Table { .. } => datum.set_type(DatumType::Table)?,
        }
        self.register(key, &name);
        Ok(())
    }

    /// Mark `name` as prescribed for every object of `id`'s concrete type
    pub fn add_to_prescribed_attributes(&mut self, id: ScopeId, name: &str) -> ScopeResult<()> {
        let key = self.type_of(id)?;
        self.register(key, name);
        Ok(())
    }

    pub fn add_internal_prescribed_attribute<T: DatumValue>(
        &mut self,
        id: ScopeId,
        name: &str,
        default: T,
        count: usize,
    ) -> ScopeResult<()> {
        self.apply_signature(
            id,
            Signature::Internal {
                name: name.to_string(),
                defaults: Datum::from_values(vec![default; count]),
            },
        )
    }

    pub fn add_external_prescribed_attribute<T: DatumValue>(
        &mut self,
        id: ScopeId,
        name: &str,
        field: &Field<T>,
    ) -> ScopeResult<()> {
        let view = Datum::external(field)?;
        self.apply_signature(
            id,
            Signature::External {
                name: name.to_string(),
                view,
            },
        )
    }

    fn prescribed_names(&self, id: ScopeId) -> &[String] {
        self.type_of(id)
            .ok()
            .and_then(|key| self.prescribed.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_attribute(&self, id: ScopeId, name: &str) -> bool {
        self.find(id, name).is_some()
    }

    pub fn is_prescribed_attribute(&self, id: ScopeId, name: &str) -> bool {
        self.is_attribute(id, name) && self.prescribed_names(id).iter().any(|n| n == name)
    }

    pub fn is_auxiliary_attribute(&self, id: ScopeId, name: &str) -> bool {
        self.is_attribute(id, name) && !self.prescribed_names(id).iter().any(|n| n == name)
    }

    /// Append an attribute that is not prescribed for this object's type
    pub fn append_auxiliary_attribute(&mut self, id: ScopeId, name: &str) -> ScopeResult<&mut Datum> {
        if self.prescribed_names(id).iter().any(|n| n == name) {
            return Err(ScopeError::PrescribedCollision(name.to_string()));
        }
        self.append(id, name)
    }

    /// Every entry, in insertion order
    pub fn attributes(&self, id: ScopeId) -> Vec<(&str, &Datum)> {
        self.nodes
            .get(id)
            .map(|node| node.scope.entries().collect())
            .unwrap_or_default()
    }

    pub fn prescribed_attributes(&self, id: ScopeId) -> Vec<(&str, &Datum)> {
        let names = self.prescribed_names(id);
        self.attributes(id)
            .into_iter()
            .filter(|(key, _)| names.iter().any(|n| n == key))
            .collect()
    }

    pub fn auxiliary_attributes(&self, id: ScopeId) -> Vec<(&str, &Datum)> {
        let names = self.prescribed_names(id);
        self.attributes(id)
            .into_iter()
            .filter(|(key, _)| !names.iter().any(|n| n == key))
            .collect()
    }

    /// The native object reflected by `id`
    pub fn object(&self, id: ScopeId) -> Option<&Arc<O>> {
        self.nodes.get(id)?.object.as_ref()
    }

    pub fn object_as<T: 'static>(&self, id: ScopeId) -> Option<&T> {
        self.object(id)?.attributed().as_any().downcast_ref()
    }
}
