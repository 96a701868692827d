//! Variant arrays
//!
//! A [`Datum`] is a homogeneous array whose element type is picked at
//! runtime from a closed set ([`DatumType`]). The first write fixes the type;
//! every later access is checked against it.
//!
//! Storage is either owned by the datum or external: a [`Field`] that a
//! native object also holds. External arrays keep the length they were bound
//! with. Their elements can be overwritten, but nothing can be pushed,
//! removed, or resized.

use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec4};
use void_core::RttiRef;

use crate::arena::ScopeId;
use crate::error::{DatumError, DatumResult};
use crate::field::Field;
use crate::text;

/// Capacity added whenever a push finds the array full
pub const GROWTH: usize = 5;

/// Element type of a [`Datum`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DatumType {
    #[default]
    Unknown,
    Integer,
    Float,
    Vector4,
    Matrix4x4,
    Table,
    String,
    Pointer,
}

impl DatumType {
    pub const ALL: [DatumType; 8] = [
        DatumType::Unknown,
        DatumType::Integer,
        DatumType::Float,
        DatumType::Vector4,
        DatumType::Matrix4x4,
        DatumType::Table,
        DatumType::String,
        DatumType::Pointer,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            DatumType::Unknown => "Unknown",
            DatumType::Integer => "Integer",
            DatumType::Float => "Float",
            DatumType::Vector4 => "Vector4",
            DatumType::Matrix4x4 => "Matrix4x4",
            DatumType::Table => "Table",
            DatumType::String => "String",
            DatumType::Pointer => "Pointer",
        }
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatumType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("Unknown datum type: {}", s))
    }
}

#[derive(Debug)]
pub enum Storage<T> {
    Internal(Vec<T>),
    External(Field<T>),
}

impl<T: Clone> Clone for Storage<T> {
    fn clone(&self) -> Self {
        match self {
            Storage::Internal(values) => Storage::Internal(values.clone()),
            // a copied external array views the same native member
            Storage::External(field) => Storage::External(field.alias()),
        }
    }
}

impl<T> Storage<T> {
    fn len(&self) -> usize {
        match self {
            Storage::Internal(values) => values.len(),
            Storage::External(field) => field.len(),
        }
    }

    fn is_external(&self) -> bool {
        matches!(self, Storage::External(_))
    }

    fn internal(&mut self) -> DatumResult<&mut Vec<T>> {
        match self {
            Storage::Internal(values) => Ok(values),
            Storage::External(_) => Err(DatumError::ExternalStorage),
        }
    }

    fn clear(&mut self) {
        match self {
            Storage::Internal(values) => *values = Vec::new(),
            Storage::External(field) => *field = Field::detached(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        match self {
            Storage::Internal(values) => f(values),
            Storage::External(field) => f(&field.read()),
        }
    }

    fn with_mut<R>(&mut self, f: impl FnOnce(&mut [T]) -> R) -> R {
        match self {
            Storage::Internal(values) => f(values),
            Storage::External(field) => f(&mut field.write()),
        }
    }
}

impl<T: Clone> Storage<T> {
    fn to_internal(&self) -> Storage<T> {
        Storage::Internal(self.with(|values| values.to_vec()))
    }
}

#[derive(Debug, Clone)]
pub enum Values {
    Unknown,
    Integer(Storage<i32>),
    Float(Storage<f32>),
    Vector4(Storage<Vec4>),
    Matrix4x4(Storage<Mat4>),
    Table(Storage<ScopeId>),
    String(Storage<String>),
    Pointer(Storage<RttiRef>),
}

macro_rules! each_storage {
    ($values:expr, $s:ident => $body:expr, $unknown:expr) => {
        match $values {
            Values::Unknown => $unknown,
            Values::Integer($s) => $body,
            Values::Float($s) => $body,
            Values::Vector4($s) => $body,
            Values::Matrix4x4($s) => $body,
            Values::Table($s) => $body,
            Values::String($s) => $body,
            Values::Pointer($s) => $body,
        }
    };
}

fn wrap<T: DatumValue>(storage: Storage<T>) -> Values {
    T::wrap(storage)
}

impl Values {
    fn empty(datum_type: DatumType, capacity: usize) -> Self {
        fn owned<T>(capacity: usize) -> Storage<T> {
            Storage::Internal(Vec::with_capacity(capacity))
        }
        match datum_type {
            DatumType::Unknown => Values::Unknown,
            DatumType::Integer => Values::Integer(owned(capacity)),
            DatumType::Float => Values::Float(owned(capacity)),
            DatumType::Vector4 => Values::Vector4(owned(capacity)),
            DatumType::Matrix4x4 => Values::Matrix4x4(owned(capacity)),
            DatumType::Table => Values::Table(owned(capacity)),
            DatumType::String => Values::String(owned(capacity)),
            DatumType::Pointer => Values::Pointer(owned(capacity)),
        }
    }

    fn datum_type(&self) -> DatumType {
        match self {
            Values::Unknown => DatumType::Unknown,
            Values::Integer(_) => DatumType::Integer,
            Values::Float(_) => DatumType::Float,
            Values::Vector4(_) => DatumType::Vector4,
            Values::Matrix4x4(_) => DatumType::Matrix4x4,
            Values::Table(_) => DatumType::Table,
            Values::String(_) => DatumType::String,
            Values::Pointer(_) => DatumType::Pointer,
        }
    }

    fn to_internal(&self) -> Values {
        each_storage!(self, s => wrap(s.to_internal()), Values::Unknown)
    }
}

mod sealed {
    use super::{Storage, Values};

    pub trait Sealed: Sized {
        fn storage(values: &Values) -> Option<&Storage<Self>>;
        fn storage_mut(values: &mut Values) -> Option<&mut Storage<Self>>;
        fn wrap(storage: Storage<Self>) -> Values;
    }
}

/// Rust types that can be elements of a [`Datum`]
pub trait DatumValue: sealed::Sealed + Clone + fmt::Debug + Send + Sync + 'static {
    const TYPE: DatumType;

    /// Element equality; opaque pointers compare polymorphically
    fn same(&self, other: &Self) -> bool;

    /// Value used when a resize grows the array
    fn fallback() -> Option<Self>;
}

macro_rules! datum_value {
    ($ty:ty, $variant:ident, $fallback:expr) => {
        impl sealed::Sealed for $ty {
            fn storage(values: &Values) -> Option<&Storage<Self>> {
                match values {
                    Values::$variant(storage) => Some(storage),
                    _ => None,
                }
            }

            fn storage_mut(values: &mut Values) -> Option<&mut Storage<Self>> {
                match values {
                    Values::$variant(storage) => Some(storage),
                    _ => None,
                }
            }

            fn wrap(storage: Storage<Self>) -> Values {
                Values::$variant(storage)
            }
        }

        impl DatumValue for $ty {
            const TYPE: DatumType = DatumType::$variant;

            fn same(&self, other: &Self) -> bool {
                self == other
            }

            fn fallback() -> Option<Self> {
                $fallback
            }
        }

        impl PartialEq<$ty> for Datum {
            fn eq(&self, other: &$ty) -> bool {
                self.len() == 1 && self.get::<$ty>(0).map_or(false, |v| v.same(other))
            }
        }
    };
}

datum_value!(i32, Integer, Some(0));
datum_value!(f32, Float, Some(0.0));
datum_value!(Vec4, Vector4, Some(Vec4::ZERO));
datum_value!(Mat4, Matrix4x4, Some(Mat4::IDENTITY));
datum_value!(ScopeId, Table, None);
datum_value!(String, String, Some(String::new()));
datum_value!(RttiRef, Pointer, None);

// no From<ScopeId>: Table arrays gain elements only through ScopeTree
macro_rules! datum_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Datum {
                fn from(value: $ty) -> Self {
                    Datum::from_values(vec![value])
                }
            }
        )*
    };
}

datum_from!(i32, f32, Vec4, Mat4, String, RttiRef);

/// Runtime-typed homogeneous array with owned or external storage
///
/// Table elements are handles owned by a [`ScopeTree`](crate::ScopeTree).
/// The public mutators refuse them with [`DatumError::TreeOwned`] and a
/// clone of a Table array comes out empty, so handles cannot be duplicated
/// or dropped behind the tree's back.
#[derive(Debug)]
pub struct Datum {
    values: Values,
    capacity: usize,
}

impl Clone for Datum {
    fn clone(&self) -> Self {
        match self.values {
            Values::Table(_) => Self {
                values: Values::empty(DatumType::Table, 0),
                capacity: 0,
            },
            _ => self.duplicate(),
        }
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::new()
    }
}

impl Datum {
    /// Create an empty, untyped array
    pub fn new() -> Self {
        Self {
            values: Values::Unknown,
            capacity: 0,
        }
    }

    /// Create an empty array of a given type
    pub fn with_type(datum_type: DatumType) -> DatumResult<Self> {
        let mut datum = Self::new();
        datum.set_type(datum_type)?;
        Ok(datum)
    }

    /// Create an owned array holding `values`
    pub(crate) fn from_values<T: DatumValue>(values: Vec<T>) -> Self {
        let capacity = values.len();
        Self {
            values: T::wrap(Storage::Internal(values)),
            capacity,
        }
    }

    /// Create an array bound to external storage
    pub fn external<T: DatumValue>(field: &Field<T>) -> DatumResult<Self> {
        let mut datum = Self::new();
        datum.set_storage(field)?;
        Ok(datum)
    }

    pub fn datum_type(&self) -> DatumType {
        self.values.datum_type()
    }

    pub fn len(&self) -> usize {
        each_storage!(&self.values, s => s.len(), 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_external(&self) -> bool {
        each_storage!(&self.values, s => s.is_external(), false)
    }

    fn mismatch(&self, found: DatumType) -> DatumError {
        match self.datum_type() {
            DatumType::Unknown => DatumError::UnknownType,
            expected => DatumError::TypeMismatch { expected, found },
        }
    }

    /// Copy that keeps Table handles. Only the tree may hold two arrays
    /// naming the same children, and only transiently.
    pub(crate) fn duplicate(&self) -> Datum {
        Datum {
            values: self.values.clone(),
            capacity: self.capacity,
        }
    }

    fn reject_handles(datum_type: DatumType) -> DatumResult<()> {
        if datum_type == DatumType::Table {
            return Err(DatumError::TreeOwned);
        }
        Ok(())
    }

    fn typed<T: DatumValue>(&self) -> DatumResult<&Storage<T>> {
        T::storage(&self.values).ok_or_else(|| self.mismatch(T::TYPE))
    }

    fn typed_mut<T: DatumValue>(&mut self) -> DatumResult<&mut Storage<T>> {
        let err = self.mismatch(T::TYPE);
        T::storage_mut(&mut self.values).ok_or(err)
    }

    fn ensure_internal(&self) -> DatumResult<()> {
        if self.is_external() {
            return Err(DatumError::ExternalStorage);
        }
        Ok(())
    }

    /// Fix the element type. Allowed while untyped or empty.
    pub fn set_type(&mut self, datum_type: DatumType) -> DatumResult<()> {
        let current = self.datum_type();
        if datum_type == DatumType::Unknown {
            return Err(DatumError::InvalidType(datum_type));
        }
        if current == datum_type {
            return Ok(());
        }
        if current != DatumType::Unknown && !self.is_empty() {
            return Err(DatumError::TypeMismatch {
                expected: current,
                found: datum_type,
            });
        }
        self.ensure_internal()?;
        self.values = Values::empty(datum_type, self.capacity);
        Ok(())
    }

    /// Grow capacity to `capacity`. Never shrinks.
    pub fn reserve(&mut self, capacity: usize) -> DatumResult<()> {
        self.ensure_internal()?;
        if self.datum_type() == DatumType::Unknown {
            return Err(DatumError::UnknownType);
        }
        if capacity > self.capacity {
            let len = self.len();
            each_storage!(&mut self.values, s => s.internal()?.reserve_exact(capacity - len), ());
            self.capacity = capacity;
        }
        Ok(())
    }

    /// Set both length and capacity to `len`
    pub fn resize(&mut self, len: usize) -> DatumResult<()> {
        self.ensure_internal()?;
        Self::reject_handles(self.datum_type())?;
        each_storage!(
            &mut self.values,
            s => resize_owned(s, len)?,
            return Err(DatumError::UnknownType)
        );
        self.capacity = len;
        Ok(())
    }

    /// Drop every element and release capacity. The type is kept.
    ///
    /// A cleared external array stays external with no elements until it is
    /// bound again with [`set_storage`](Self::set_storage).
    pub fn clear(&mut self) -> DatumResult<()> {
        Self::reject_handles(self.datum_type())?;
        each_storage!(&mut self.values, s => s.clear(), ());
        self.capacity = 0;
        Ok(())
    }

    pub fn push_back<T: DatumValue>(&mut self, value: T) -> DatumResult<()> {
        Self::reject_handles(T::TYPE)?;
        self.push_value(value)
    }

    pub(crate) fn push_scope(&mut self, child: ScopeId) -> DatumResult<()> {
        self.push_value(child)
    }

    fn push_value<T: DatumValue>(&mut self, value: T) -> DatumResult<()> {
        self.ensure_internal()?;
        if self.datum_type() == DatumType::Unknown {
            self.values = T::wrap(Storage::Internal(Vec::new()));
        }
        self.typed::<T>()?;

        if self.len() >= self.capacity {
            self.capacity += GROWTH;
        }
        let capacity = self.capacity;
        let values = self.typed_mut::<T>()?.internal()?;
        values.reserve_exact(capacity.saturating_sub(values.len()));
        values.push(value);
        Ok(())
    }

    pub fn pop_back(&mut self) -> DatumResult<()> {
        self.ensure_internal()?;
        Self::reject_handles(self.datum_type())?;
        if self.is_empty() {
            return Err(DatumError::Empty);
        }
        each_storage!(&mut self.values, s => { s.internal()?.pop(); }, ());
        Ok(())
    }

    pub fn set<T: DatumValue>(&mut self, index: usize, value: T) -> DatumResult<()> {
        Self::reject_handles(T::TYPE)?;
        self.typed_mut::<T>()?.with_mut(|values| {
            let len = values.len();
            let slot = values
                .get_mut(index)
                .ok_or(DatumError::OutOfBounds { index, len })?;
            *slot = value;
            Ok(())
        })
    }

    pub fn get<T: DatumValue>(&self, index: usize) -> DatumResult<T> {
        self.typed::<T>()?.with(|values| {
            values.get(index).cloned().ok_or(DatumError::OutOfBounds {
                index,
                len: values.len(),
            })
        })
    }

    /// Copy of every element
    pub fn values<T: DatumValue>(&self) -> DatumResult<Vec<T>> {
        Ok(self.typed::<T>()?.with(|values| values.to_vec()))
    }

    /// Child tables referenced by a Table-typed array; empty for other types
    pub fn scopes(&self) -> Vec<ScopeId> {
        self.values::<ScopeId>().unwrap_or_default()
    }

    /// Index of the first element equal to `value`
    pub fn find<T: DatumValue>(&self, value: &T) -> DatumResult<Option<usize>> {
        Ok(self
            .typed::<T>()?
            .with(|values| values.iter().position(|v| v.same(value))))
    }

    /// Remove the first element equal to `value`, reporting whether one was found
    pub fn remove<T: DatumValue>(&mut self, value: &T) -> DatumResult<bool> {
        self.ensure_internal()?;
        Self::reject_handles(T::TYPE)?;
        match self.find(value)? {
            Some(index) => {
                self.remove_by_index(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_by_index(&mut self, index: usize) -> DatumResult<()> {
        Self::reject_handles(self.datum_type())?;
        self.remove_at(index)
    }

    pub(crate) fn remove_scope_at(&mut self, index: usize) -> DatumResult<()> {
        if self.datum_type() != DatumType::Table {
            return Err(self.mismatch(DatumType::Table));
        }
        self.remove_at(index)
    }

    fn remove_at(&mut self, index: usize) -> DatumResult<()> {
        self.ensure_internal()?;
        let len = self.len();
        if index >= len {
            return Err(DatumError::OutOfBounds { index, len });
        }
        each_storage!(&mut self.values, s => { s.internal()?.remove(index); }, ());
        Ok(())
    }

    /// Bind to external storage. Accepted on an untyped array or to re-bind
    /// an external array of the same type.
    pub fn set_storage<T: DatumValue>(&mut self, field: &Field<T>) -> DatumResult<()> {
        if T::TYPE == DatumType::Table {
            return Err(DatumError::NoExternal(T::TYPE));
        }
        if field.is_empty() {
            return Err(DatumError::EmptyExternalStorage);
        }
        match self.datum_type() {
            DatumType::Unknown => {}
            current if current != T::TYPE => {
                return Err(DatumError::TypeMismatch {
                    expected: current,
                    found: T::TYPE,
                })
            }
            _ if !self.is_external() => return Err(DatumError::AlreadyInternal),
            _ => {}
        }
        self.values = T::wrap(Storage::External(field.alias()));
        self.capacity = field.len();
        Ok(())
    }

    /// Scalar assignment: push into an empty array, otherwise overwrite element 0
    pub fn assign<T: DatumValue>(&mut self, value: T) -> DatumResult<()> {
        self.ensure_internal()?;
        if self.is_empty() {
            self.push_back(value)
        } else {
            self.set(0, value)
        }
    }

    /// Replace this array with an owned copy of `other`'s elements
    pub fn assign_from(&mut self, other: &Datum) -> DatumResult<()> {
        self.ensure_internal()?;
        Self::reject_handles(self.datum_type())?;
        Self::reject_handles(other.datum_type())?;
        self.values = other.values.to_internal();
        self.capacity = other.capacity.max(other.len());
        Ok(())
    }

    /// Owned copy that never aliases external storage. Table arrays come
    /// out empty, as with `clone`.
    pub fn detached(&self) -> Datum {
        if self.datum_type() == DatumType::Table {
            return self.clone();
        }
        Datum {
            values: self.values.to_internal(),
            capacity: self.len(),
        }
    }

    pub fn set_from_string(&mut self, text: &str, index: usize) -> DatumResult<()> {
        let target = self.datum_type();
        let len = self.len();
        if target == DatumType::Unknown {
            return Err(DatumError::UnknownType);
        }
        if index >= len {
            return Err(DatumError::OutOfBounds { index, len });
        }

        let parse_error = || DatumError::Parse {
            text: text.to_string(),
            target,
        };
        match target {
            DatumType::Integer => {
                let value: i32 = text.trim().parse().map_err(|_| parse_error())?;
                self.set(index, value)
            }
            DatumType::Float => {
                let value: f32 = text.trim().parse().map_err(|_| parse_error())?;
                self.set(index, value)
            }
            DatumType::Vector4 => self.set(index, text::parse_vec4(text).ok_or_else(parse_error)?),
            DatumType::Matrix4x4 => self.set(index, text::parse_mat4(text).ok_or_else(parse_error)?),
            DatumType::String => self.set(index, text.to_string()),
            DatumType::Table | DatumType::Pointer | DatumType::Unknown => {
                Err(DatumError::NotTextual(target))
            }
        }
    }

    /// Text form of one element. Table elements are stringified by the tree.
    pub fn to_string_at(&self, index: usize) -> DatumResult<String> {
        let len = self.len();
        if self.datum_type() == DatumType::Unknown {
            return Err(DatumError::UnknownType);
        }
        if index >= len {
            return Err(DatumError::OutOfBounds { index, len });
        }

        Ok(match &self.values {
            Values::Integer(s) => s.with(|v| v[index].to_string()),
            Values::Float(s) => s.with(|v| format!("{:.6}", v[index])),
            Values::Vector4(s) => s.with(|v| text::format_vec4(v[index])),
            Values::Matrix4x4(s) => s.with(|v| text::format_mat4(v[index])),
            Values::String(s) => s.with(|v| v[index].clone()),
            Values::Pointer(s) => s.with(|v| v[index].describe()),
            Values::Table(_) => return Err(DatumError::NotTextual(DatumType::Table)),
            Values::Unknown => return Err(DatumError::UnknownType),
        })
    }
}

fn resize_owned<T: DatumValue>(storage: &mut Storage<T>, len: usize) -> DatumResult<()> {
    let values = storage.internal()?;
    if len > values.len() {
        let fill = T::fallback().ok_or(DatumError::NoDefault(T::TYPE))?;
        values.resize(len, fill);
    } else {
        values.truncate(len);
    }
    values.shrink_to(len);
    Ok(())
}

fn storage_eq<T: DatumValue>(a: &Storage<T>, b: &Storage<T>) -> bool {
    if let (Storage::External(x), Storage::External(y)) = (a, b) {
        if x.ptr_eq(y) {
            return true;
        }
    }
    a.with(|x| b.with(|y| x.len() == y.len() && x.iter().zip(y).all(|(p, q)| p.same(q))))
}

/// Element-wise equality. Table arrays compare child handles, so two arrays
/// naming different but identical subtrees are unequal here; compare contents
/// with [`ScopeTree::equals`](crate::ScopeTree::equals).
impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (&self.values, &other.values) {
            (Values::Unknown, Values::Unknown) => true,
            (Values::Integer(a), Values::Integer(b)) => storage_eq(a, b),
            (Values::Float(a), Values::Float(b)) => storage_eq(a, b),
            (Values::Vector4(a), Values::Vector4(b)) => storage_eq(a, b),
            (Values::Matrix4x4(a), Values::Matrix4x4(b)) => storage_eq(a, b),
            (Values::Table(a), Values::Table(b)) => storage_eq(a, b),
            (Values::String(a), Values::String(b)) => storage_eq(a, b),
            (Values::Pointer(a), Values::Pointer(b)) => storage_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq<&str> for Datum {
    fn eq(&self, other: &&str) -> bool {
        self.len() == 1 && self.get::<String>(0).map_or(false, |v| v == *other)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::from_values(vec![value.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use void_core::Rtti;

    #[derive(Debug)]
    struct Token(&'static str);

    impl Rtti for Token {
        fn equals(&self, other: &dyn Rtti) -> bool {
            other.downcast_ref::<Token>().map_or(false, |t| t.0 == self.0)
        }
    }

    #[test]
    fn test_first_push_fixes_type() {
        let mut datum = Datum::new();
        assert_eq!(datum.datum_type(), DatumType::Unknown);

        datum.push_back(7).unwrap();
        assert_eq!(datum.datum_type(), DatumType::Integer);
        assert_eq!(
            datum.push_back(1.5f32),
            Err(DatumError::TypeMismatch {
                expected: DatumType::Integer,
                found: DatumType::Float
            })
        );
        assert!(datum.set(0, String::from("x")).is_err());
        assert!(datum.set_type(DatumType::String).is_err());
        assert!(datum.set_type(DatumType::Integer).is_ok());
    }

    #[test]
    fn test_set_type_rules() {
        let mut datum = Datum::new();
        assert_eq!(datum.set_type(DatumType::Unknown), Err(DatumError::InvalidType(DatumType::Unknown)));

        datum.set_type(DatumType::Float).unwrap();
        // still empty, so it may be retyped
        datum.set_type(DatumType::Vector4).unwrap();
        assert_eq!(datum.datum_type(), DatumType::Vector4);
    }

    #[test]
    fn test_capacity_grows_by_five() {
        let mut datum = Datum::new();
        datum.push_back(1).unwrap();
        assert_eq!(datum.capacity(), 5);

        for i in 2..=5 {
            datum.push_back(i).unwrap();
        }
        assert_eq!(datum.capacity(), 5);

        datum.push_back(6).unwrap();
        assert_eq!(datum.len(), 6);
        assert_eq!(datum.capacity(), 10);
    }

    #[test]
    fn test_reserve_and_resize() {
        let mut datum = Datum::new();
        assert_eq!(datum.reserve(10), Err(DatumError::UnknownType));

        datum.set_type(DatumType::String).unwrap();
        datum.reserve(10).unwrap();
        datum.reserve(3).unwrap();
        assert_eq!(datum.capacity(), 10);

        datum.resize(3).unwrap();
        assert_eq!(datum.len(), 3);
        assert_eq!(datum.capacity(), 3);
        assert_eq!(datum.get::<String>(2).unwrap(), "");

        datum.resize(1).unwrap();
        assert_eq!(datum.len(), 1);
    }

    #[test]
    fn test_resize_defaults() {
        let mut matrices = Datum::with_type(DatumType::Matrix4x4).unwrap();
        matrices.resize(1).unwrap();
        assert_eq!(matrices.get::<Mat4>(0).unwrap(), Mat4::IDENTITY);

        let mut tables = Datum::with_type(DatumType::Table).unwrap();
        assert_eq!(tables.resize(2), Err(DatumError::NoDefault(DatumType::Table)));
    }

    #[test]
    fn test_get_set_bounds() {
        let mut datum = Datum::from_values(vec![1.0f32, 2.0]);

        datum.set(1, 4.5f32).unwrap();
        assert_eq!(datum.get::<f32>(1).unwrap(), 4.5);
        assert_eq!(datum.get::<f32>(2), Err(DatumError::OutOfBounds { index: 2, len: 2 }));
        assert!(datum.get::<i32>(0).is_err());
    }

    #[test]
    fn test_find_and_remove() {
        let mut datum = Datum::from_values(vec![3, 5, 7, 5]);

        assert_eq!(datum.find(&5).unwrap(), Some(1));
        assert_eq!(datum.find(&9).unwrap(), None);
        assert!(datum.find(&5.0f32).is_err());

        assert!(datum.remove(&5).unwrap());
        assert_eq!(datum.values::<i32>().unwrap(), vec![3, 7, 5]);
        assert!(!datum.remove(&9).unwrap());

        datum.remove_by_index(0).unwrap();
        assert_eq!(datum.values::<i32>().unwrap(), vec![7, 5]);
        assert!(datum.remove_by_index(5).is_err());
    }

    #[test]
    fn test_pop_back() {
        let mut datum = Datum::from_values(vec![String::from("a")]);

        datum.pop_back().unwrap();
        assert!(datum.is_empty());
        assert_eq!(datum.pop_back(), Err(DatumError::Empty));
    }

    #[test]
    fn test_external_shape_is_fixed() {
        let field = Field::from_vec(vec![1, 2, 3]);
        let mut datum = Datum::external(&field).unwrap();

        assert!(datum.is_external());
        assert_eq!(datum.len(), 3);
        assert_eq!(datum.capacity(), 3);
        assert_eq!(datum.push_back(4), Err(DatumError::ExternalStorage));
        assert_eq!(datum.pop_back(), Err(DatumError::ExternalStorage));
        assert_eq!(datum.remove(&1), Err(DatumError::ExternalStorage));
        assert_eq!(datum.remove_by_index(0), Err(DatumError::ExternalStorage));
        assert_eq!(datum.resize(5), Err(DatumError::ExternalStorage));
        assert_eq!(datum.reserve(5), Err(DatumError::ExternalStorage));
        assert_eq!(datum.assign(9), Err(DatumError::ExternalStorage));
        assert_eq!(datum.assign_from(&Datum::from(1)), Err(DatumError::ExternalStorage));
    }

    #[test]
    fn test_external_writes_reach_the_field() {
        let field = Field::new(10);
        let mut datum = Datum::external(&field).unwrap();

        datum.set(0, 42).unwrap();
        assert_eq!(field.get(), 42);

        field.set(-1);
        assert_eq!(datum.get::<i32>(0).unwrap(), -1);
    }

    #[test]
    fn test_set_storage_rules() {
        let field = Field::new(1.0f32);
        let empty: Field<f32> = Field::from_vec(Vec::new());

        assert_eq!(Datum::new().set_storage(&empty), Err(DatumError::EmptyExternalStorage));
        assert_eq!(
            Datum::new().set_storage(&Field::new(ScopeId::new(0, 0))),
            Err(DatumError::NoExternal(DatumType::Table))
        );

        let mut owned = Datum::from(2.0f32);
        assert_eq!(owned.set_storage(&field), Err(DatumError::AlreadyInternal));

        let mut ints = Datum::from(2);
        assert!(matches!(ints.set_storage(&field), Err(DatumError::TypeMismatch { .. })));

        let other = Field::new(3.0f32);
        let mut datum = Datum::external(&field).unwrap();
        datum.set_storage(&other).unwrap();
        assert_eq!(datum.get::<f32>(0).unwrap(), 3.0);
    }

    #[test]
    fn test_clear_keeps_type_and_detaches_external() {
        let mut owned = Datum::from_values(vec![1, 2, 3]);
        owned.clear().unwrap();
        assert!(owned.is_empty());
        assert_eq!(owned.capacity(), 0);
        assert_eq!(owned.datum_type(), DatumType::Integer);

        let field = Field::new(5);
        let mut external = Datum::external(&field).unwrap();
        external.clear().unwrap();
        assert!(external.is_empty());
        assert!(external.is_external());
        assert_eq!(field.get(), 5);
        external.set_storage(&field).unwrap();
        assert_eq!(external.len(), 1);
    }

    #[test]
    fn test_assign_scalar() {
        let mut datum = Datum::new();
        datum.assign(String::from("first")).unwrap();
        datum.assign(String::from("second")).unwrap();

        assert_eq!(datum.len(), 1);
        assert!(datum == "second");
        assert!(datum.assign(3).is_err());
    }

    #[test]
    fn test_clone_aliases_external_but_assign_from_copies() {
        let field = Field::new(1);
        let external = Datum::external(&field).unwrap();

        let mut alias = external.clone();
        alias.set(0, 2).unwrap();
        assert_eq!(field.get(), 2);

        let mut copy = Datum::new();
        copy.assign_from(&external).unwrap();
        assert!(!copy.is_external());
        copy.set(0, 3).unwrap();
        assert_eq!(field.get(), 2);
        assert!(!external.detached().is_external());
    }

    #[test]
    fn test_string_round_trip_per_type() {
        let mut datum = Datum::with_type(DatumType::Vector4).unwrap();
        datum.resize(1).unwrap();
        datum.set_from_string("vec4(1, 2, 3, 4)", 0).unwrap();
        assert_eq!(datum.get::<Vec4>(0).unwrap(), Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(datum.to_string_at(0).unwrap(), "vec4(1.000000, 2.000000, 3.000000, 4.000000)");

        let mut floats = Datum::from(0.0f32);
        floats.set_from_string(" 2.5 ", 0).unwrap();
        assert_eq!(floats.to_string_at(0).unwrap(), "2.500000");

        let mut ints = Datum::from(0);
        assert!(matches!(ints.set_from_string("ten", 0), Err(DatumError::Parse { .. })));
        assert!(matches!(ints.set_from_string("1", 1), Err(DatumError::OutOfBounds { .. })));
        assert_eq!(Datum::new().set_from_string("1", 0), Err(DatumError::UnknownType));
    }

    #[test]
    fn test_table_has_no_text_form() {
        let mut tables = Datum::from_values(vec![ScopeId::new(0, 0)]);
        assert_eq!(tables.to_string_at(0), Err(DatumError::NotTextual(DatumType::Table)));
        assert_eq!(tables.set_from_string("x", 0), Err(DatumError::NotTextual(DatumType::Table)));
    }

    #[test]
    fn test_table_elements_are_tree_owned() {
        let child = ScopeId::new(1, 0);
        let mut tables = Datum::with_type(DatumType::Table).unwrap();
        assert_eq!(tables.push_back(child), Err(DatumError::TreeOwned));
        assert_eq!(Datum::new().push_back(child), Err(DatumError::TreeOwned));

        tables.push_scope(child).unwrap();
        assert_eq!(tables.set(0, ScopeId::new(2, 0)), Err(DatumError::TreeOwned));
        assert_eq!(tables.remove(&child), Err(DatumError::TreeOwned));
        assert_eq!(tables.remove_by_index(0), Err(DatumError::TreeOwned));
        assert_eq!(tables.pop_back(), Err(DatumError::TreeOwned));
        assert_eq!(tables.resize(0), Err(DatumError::TreeOwned));
        assert_eq!(tables.clear(), Err(DatumError::TreeOwned));
        assert_eq!(Datum::new().assign_from(&tables), Err(DatumError::TreeOwned));
        assert_eq!(tables.scopes(), vec![child]);

        tables.remove_scope_at(0).unwrap();
        assert!(tables.is_empty());
        assert!(Datum::from(1).remove_scope_at(0).is_err());
    }

    #[test]
    fn test_table_clone_drops_handles() {
        let tables = Datum::from_values(vec![ScopeId::new(1, 0), ScopeId::new(2, 0)]);

        let copy = tables.clone();
        assert_eq!(copy.datum_type(), DatumType::Table);
        assert!(copy.is_empty());
        assert!(tables.detached().is_empty());
        assert_eq!(tables.duplicate().scopes(), tables.scopes());
    }

    #[test]
    fn test_table_equality_compares_handles() {
        let a = Datum::from_values(vec![ScopeId::new(1, 0)]);
        let b = Datum::from_values(vec![ScopeId::new(2, 0)]);

        assert_eq!(a, a.duplicate());
        assert_ne!(a, b);
        assert!(a == ScopeId::new(1, 0));
    }

    #[test]
    fn test_equality() {
        let field = Field::from_vec(vec![1, 2]);
        let external = Datum::external(&field).unwrap();

        assert_eq!(Datum::from_values(vec![1, 2]), external);
        assert_ne!(Datum::from_values(vec![1, 2, 3]), external);
        assert_ne!(Datum::from_values(vec![1.0f32, 2.0]), external);
        assert_eq!(Datum::new(), Datum::new());

        assert!(Datum::from(4) == 4);
        assert!(Datum::from_values(vec![4, 4]) != 4);
    }

    #[test]
    fn test_pointer_elements_compare_polymorphically() {
        let a: RttiRef = Arc::new(Token("sword"));
        let b: RttiRef = Arc::new(Token("sword"));
        let c: RttiRef = Arc::new(Token("shield"));

        assert_eq!(Datum::from(a.clone()), Datum::from(b));
        assert_ne!(Datum::from(a.clone()), Datum::from(c));
        assert_eq!(Datum::from(a).to_string_at(0).unwrap(), "Token(\"sword\")");
    }

    #[test]
    fn test_datum_type_names() {
        assert_eq!("Matrix4x4".parse::<DatumType>().unwrap(), DatumType::Matrix4x4);
        assert!("Quaternion".parse::<DatumType>().is_err());
        assert_eq!(DatumType::Vector4.to_string(), "Vector4");
    }
}
