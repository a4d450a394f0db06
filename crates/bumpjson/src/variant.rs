//! Handle to a single value position.
//!
//! A [`VariantRef`] points at one slot of a document: the root, an array
//! element or an object member. It never fails on read. Asking for a missing
//! member or the wrong type yields [`VariantRef::INVALID`] or a default, so
//! chains like `doc.get("a").get(3).get("b")` are always safe.

use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

use bumpjson_mem::Arena;

use crate::array::ArrayRef;
use crate::convert::{Literal, interpret};
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::options::TRAVERSAL_LIMIT;
use crate::slot::{ArrayData, ObjectData, RawView, Slot, StringMode};
use crate::value::{Value, materialize_over};

/// The type tag of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Nothing stored yet, or an invalid handle.
    Undefined,
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool,
    /// A signed 64-bit integer.
    Integer,
    /// A double.
    Float,
    /// A quoted string.
    String,
    /// Unquoted source text, interpreted on read.
    Raw,
    /// An array.
    Array,
    /// An object.
    Object,
}

#[derive(Clone, Copy)]
enum Place<'a> {
    Slot(&'a Cell<Slot>),
    Array(&'a ArrayData),
    Object(&'a ObjectData),
}

impl Place<'_> {
    fn get(&self) -> Slot {
        match self {
            Place::Slot(cell) => cell.get(),
            Place::Array(data) => Slot::Array(NonNull::from(*data)),
            Place::Object(data) => Slot::Object(NonNull::from(*data)),
        }
    }
}

/// A value read out of a slot, with arena-backed data borrowed for `'a`.
#[derive(Clone, Copy)]
pub(crate) enum View<'a> {
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Str(&'a str),
    Raw(RawView<'a>),
    Array(ArrayRef<'a>),
    Object(ObjectRef<'a>),
}

/// A scalar with raw text resolved.
#[derive(Clone, Copy, PartialEq)]
enum Resolved<'t> {
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(&'t str),
}

impl<'a> View<'a> {
    fn resolve(&self) -> Resolved<'_> {
        match self {
            View::Undefined | View::Array(_) | View::Object(_) => Resolved::Undefined,
            View::Null => Resolved::Null,
            View::Bool(b) => Resolved::Bool(*b),
            View::Integer(i) => Resolved::Integer(*i),
            View::Float(f) => Resolved::Float(*f),
            View::Str(s) => Resolved::Text(s),
            View::Raw(raw) => match interpret(raw.text()) {
                Literal::Null => Resolved::Null,
                Literal::Bool(b) => Resolved::Bool(b),
                Literal::Integer(i) => Resolved::Integer(i),
                Literal::Float(f) => Resolved::Float(f),
                Literal::Text(t) => Resolved::Text(t),
            },
        }
    }
}

/// Handle to a value inside a document.
///
/// Cheap to copy. All reads are infallible; writes return
/// [`Error::InvalidTarget`] through the Invalid sentinel.
///
/// ```
/// use bumpjson::{Document, deserialize_json};
///
/// let mut doc = Document::new();
/// deserialize_json(&mut doc, r#"{"sensor":"gps","data":[48.75,2.30]}"#).unwrap();
///
/// assert_eq!(doc.get("sensor").as_str(), Some("gps"));
/// assert_eq!(doc.get("data").get(1).as_f64(), 2.3);
/// assert!(!doc.get("data").get(7).is_valid());
/// assert_eq!(doc.get("nope").get(0).get("deeper").as_i64(), 0);
/// ```
#[derive(Clone, Copy)]
pub struct VariantRef<'a> {
    inner: Option<(&'a Arena, Place<'a>)>,
}

impl<'a> VariantRef<'a> {
    /// The Invalid sentinel, returned by every failed lookup.
    pub const INVALID: VariantRef<'a> = VariantRef { inner: None };

    pub(crate) fn from_slot(arena: &'a Arena, slot: &'a Cell<Slot>) -> Self {
        VariantRef {
            inner: Some((arena, Place::Slot(slot))),
        }
    }

    /// The arena and current slot, for copying into another place.
    pub(crate) fn source(&self) -> Option<(&'a Arena, Slot)> {
        self.inner.map(|(arena, place)| (arena, place.get()))
    }

    pub(crate) fn view(&self) -> View<'a> {
        let Some((arena, place)) = self.inner else {
            return View::Undefined;
        };
        match place.get() {
            Slot::Undefined => View::Undefined,
            Slot::Null => View::Null,
            Slot::Bool(b) => View::Bool(b),
            Slot::Integer(i) => View::Integer(i),
            Slot::Float(f) => View::Float(f),
            // SAFETY: strings and containers reachable from a slot live in
            // `arena` (or are `'static`), which is borrowed and cannot be
            // cleared for `'a`.
            Slot::String(s) => View::Str(unsafe { s.as_str() }),
            Slot::Raw(raw) => View::Raw(unsafe { RawView::new(raw) }),
            Slot::Array(ptr) => View::Array(ArrayRef::new(arena, unsafe { ptr.as_ref() })),
            Slot::Object(ptr) => View::Object(ObjectRef::new(arena, unsafe { ptr.as_ref() })),
        }
    }

    /// Returns `false` for the Invalid sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// The type tag. The Invalid sentinel reports [`Kind::Undefined`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self.view() {
            View::Undefined => Kind::Undefined,
            View::Null => Kind::Null,
            View::Bool(_) => Kind::Bool,
            View::Integer(_) => Kind::Integer,
            View::Float(_) => Kind::Float,
            View::Str(_) => Kind::String,
            View::Raw(_) => Kind::Raw,
            View::Array(_) => Kind::Array,
            View::Object(_) => Kind::Object,
        }
    }

    /// `true` for `null`, undefined values, the bareword `null` and the
    /// Invalid sentinel.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self.view() {
            View::Undefined | View::Null => true,
            View::Raw(raw) => raw.text() == "null",
            _ => false,
        }
    }

    /// Returns `true` if the value reads as `T`.
    #[must_use]
    pub fn is<T: FromVariant<'a>>(&self) -> bool {
        T::is_variant(self)
    }

    /// Reads the value as `T`, or `T`'s default on mismatch.
    ///
    /// ```
    /// use bumpjson::{Document, deserialize_json};
    ///
    /// let mut doc = Document::new();
    /// deserialize_json(&mut doc, "[42, 2.5, true, \"text\"]").unwrap();
    ///
    /// assert_eq!(doc.get(0).to::<u32>(), 42);
    /// assert_eq!(doc.get(1).to::<f32>(), 2.5);
    /// assert!(doc.get(2).to::<bool>());
    /// assert_eq!(doc.get(3).to::<&str>(), "text");
    /// assert_eq!(doc.get(3).to::<i64>(), 0);
    /// ```
    #[must_use]
    pub fn to<T: FromVariant<'a>>(&self) -> T {
        T::from_variant(self)
    }

    /// Reads as an integer; floats are truncated, `true` is 1, anything
    /// else is 0.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match self.view().resolve() {
            Resolved::Integer(i) => i,
            Resolved::Float(f) => f as i64,
            Resolved::Bool(b) => i64::from(b),
            _ => 0,
        }
    }

    /// Reads as a float; integers are converted, `true` is 1.0, anything
    /// else is 0.0.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self.view().resolve() {
            Resolved::Integer(i) => i as f64,
            Resolved::Float(f) => f,
            Resolved::Bool(b) => f64::from(u8::from(b)),
            _ => 0.0,
        }
    }

    /// Reads as a boolean: booleans as stored, non-zero integers as `true`,
    /// barewords only when spelled `true`.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self.view() {
            View::Bool(b) => b,
            View::Integer(i) => i != 0,
            View::Raw(raw) => raw.text() == "true",
            _ => false,
        }
    }

    /// Reads as text: quoted strings, and barewords that are not a number,
    /// a boolean or `null`.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self.view() {
            View::Str(s) => Some(s),
            View::Raw(raw) => {
                let text = raw.stored_text()?;
                matches!(interpret(text), Literal::Text(_)).then_some(text)
            }
            _ => None,
        }
    }

    /// The array behind this value, or [`ArrayRef::INVALID`].
    #[must_use]
    pub fn as_array(&self) -> ArrayRef<'a> {
        match self.view() {
            View::Array(array) => array,
            _ => ArrayRef::INVALID,
        }
    }

    /// The object behind this value, or [`ObjectRef::INVALID`].
    #[must_use]
    pub fn as_object(&self) -> ObjectRef<'a> {
        match self.view() {
            View::Object(object) => object,
            _ => ObjectRef::INVALID,
        }
    }

    /// Number of elements or members; 0 for scalars and the Invalid
    /// sentinel.
    #[must_use]
    pub fn size(&self) -> usize {
        match self.view() {
            View::Array(array) => array.len(),
            View::Object(object) => object.len(),
            _ => 0,
        }
    }

    /// Looks up an array element (`usize`) or an object member (`&str`).
    #[must_use]
    pub fn get(&self, index: impl JsonIndex) -> VariantRef<'a> {
        index.index_into(self)
    }

    /// How a string value is held; `None` for other values.
    #[must_use]
    pub fn string_mode(&self) -> Option<StringMode> {
        match self.inner?.1.get() {
            Slot::String(s) => Some(s.mode()),
            _ => None,
        }
    }

    /// Stores `value` in this position.
    pub fn set<'v>(&self, value: impl Into<Value<'v>>) -> Result<()> {
        let (arena, cell) = self.writable()?;
        let slot = materialize_over(arena, value.into(), cell.get())?;
        cell.set(slot);
        Ok(())
    }

    /// Replaces the value with a new empty array.
    ///
    /// Returns [`ArrayRef::INVALID`] (and leaves the value untouched) when
    /// the arena is full or the handle is not writable.
    #[must_use = "the new array is only reachable through the returned handle or a later lookup"]
    pub fn to_array(&self) -> ArrayRef<'a> {
        let Ok((arena, cell)) = self.writable() else {
            return ArrayRef::INVALID;
        };
        match arena.alloc(ArrayData::new()) {
            Ok(ptr) => {
                cell.set(Slot::Array(ptr));
                // SAFETY: freshly allocated in the borrowed arena.
                ArrayRef::new(arena, unsafe { ptr.as_ref() })
            }
            Err(_) => ArrayRef::INVALID,
        }
    }

    /// Replaces the value with a new empty object.
    #[must_use = "the new object is only reachable through the returned handle or a later lookup"]
    pub fn to_object(&self) -> ObjectRef<'a> {
        let Ok((arena, cell)) = self.writable() else {
            return ObjectRef::INVALID;
        };
        match arena.alloc(ObjectData::new()) {
            Ok(ptr) => {
                cell.set(Slot::Object(ptr));
                // SAFETY: freshly allocated in the borrowed arena.
                ObjectRef::new(arena, unsafe { ptr.as_ref() })
            }
            Err(_) => ObjectRef::INVALID,
        }
    }

    fn writable(&self) -> Result<(&'a Arena, &'a Cell<Slot>)> {
        match self.inner {
            Some((arena, Place::Slot(cell))) => Ok((arena, cell)),
            _ => Err(Error::InvalidTarget),
        }
    }
}

impl<'a> From<ArrayRef<'a>> for VariantRef<'a> {
    fn from(array: ArrayRef<'a>) -> Self {
        VariantRef {
            inner: array.parts().map(|(arena, data)| (arena, Place::Array(data))),
        }
    }
}

impl<'a> From<ObjectRef<'a>> for VariantRef<'a> {
    fn from(object: ObjectRef<'a>) -> Self {
        VariantRef {
            inner: object
                .parts()
                .map(|(arena, data)| (arena, Place::Object(data))),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Types usable to subscript a value: integers index arrays, strings look up
/// object members.
pub trait JsonIndex: sealed::Sealed {
    #[doc(hidden)]
    fn index_into<'a>(&self, variant: &VariantRef<'a>) -> VariantRef<'a>;
}

macro_rules! impl_json_index_for_int {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl JsonIndex for $ty {
                fn index_into<'a>(&self, variant: &VariantRef<'a>) -> VariantRef<'a> {
                    match usize::try_from(*self) {
                        Ok(index) => variant.as_array().get(index),
                        Err(_) => VariantRef::INVALID,
                    }
                }
            }
        )*
    };
}

impl_json_index_for_int!(usize, u8, u16, u32, i32);

impl<T: AsRef<str> + ?Sized> sealed::Sealed for &T {}

impl<T: AsRef<str> + ?Sized> JsonIndex for &T {
    fn index_into<'a>(&self, variant: &VariantRef<'a>) -> VariantRef<'a> {
        variant.as_object().get((**self).as_ref())
    }
}

/// Conversion used by [`VariantRef::to`] and [`VariantRef::is`].
pub trait FromVariant<'a>: Sized {
    /// Reads the value, falling back to a default on mismatch.
    fn from_variant(variant: &VariantRef<'a>) -> Self;

    /// Returns `true` if the value reads as this type without falling back.
    fn is_variant(variant: &VariantRef<'a>) -> bool;
}

fn is_integer(variant: &VariantRef<'_>) -> Option<i64> {
    match variant.view().resolve() {
        Resolved::Integer(i) => Some(i),
        _ => None,
    }
}

fn is_number(variant: &VariantRef<'_>) -> bool {
    matches!(
        variant.view().resolve(),
        Resolved::Integer(_) | Resolved::Float(_)
    )
}

impl FromVariant<'_> for i64 {
    fn from_variant(variant: &VariantRef<'_>) -> Self {
        variant.as_i64()
    }

    fn is_variant(variant: &VariantRef<'_>) -> bool {
        is_integer(variant).is_some()
    }
}

macro_rules! impl_from_variant_narrow {
    ($($ty:ty),*) => {
        $(
            impl FromVariant<'_> for $ty {
                fn from_variant(variant: &VariantRef<'_>) -> Self {
                    <$ty>::try_from(variant.as_i64()).unwrap_or_default()
                }

                fn is_variant(variant: &VariantRef<'_>) -> bool {
                    is_integer(variant).is_some_and(|i| <$ty>::try_from(i).is_ok())
                }
            }
        )*
    };
}

impl_from_variant_narrow!(i32, u32);

impl FromVariant<'_> for u64 {
    fn from_variant(variant: &VariantRef<'_>) -> Self {
        match variant.view().resolve() {
            Resolved::Float(f) if f >= 0.0 => f as u64,
            _ => u64::try_from(variant.as_i64()).unwrap_or_default(),
        }
    }

    fn is_variant(variant: &VariantRef<'_>) -> bool {
        is_integer(variant).is_some_and(|i| i >= 0)
    }
}

impl FromVariant<'_> for f64 {
    fn from_variant(variant: &VariantRef<'_>) -> Self {
        variant.as_f64()
    }

    fn is_variant(variant: &VariantRef<'_>) -> bool {
        is_number(variant)
    }
}

impl FromVariant<'_> for f32 {
    fn from_variant(variant: &VariantRef<'_>) -> Self {
        variant.as_f64() as f32
    }

    fn is_variant(variant: &VariantRef<'_>) -> bool {
        is_number(variant)
    }
}

impl FromVariant<'_> for bool {
    fn from_variant(variant: &VariantRef<'_>) -> Self {
        variant.as_bool()
    }

    fn is_variant(variant: &VariantRef<'_>) -> bool {
        matches!(variant.view().resolve(), Resolved::Bool(_))
    }
}

impl<'a> FromVariant<'a> for &'a str {
    fn from_variant(variant: &VariantRef<'a>) -> Self {
        variant.as_str().unwrap_or_default()
    }

    fn is_variant(variant: &VariantRef<'a>) -> bool {
        variant.as_str().is_some()
    }
}

impl<'a> FromVariant<'a> for ArrayRef<'a> {
    fn from_variant(variant: &VariantRef<'a>) -> Self {
        variant.as_array()
    }

    fn is_variant(variant: &VariantRef<'a>) -> bool {
        variant.as_array().is_valid()
    }
}

impl<'a> FromVariant<'a> for ObjectRef<'a> {
    fn from_variant(variant: &VariantRef<'a>) -> Self {
        variant.as_object()
    }

    fn is_variant(variant: &VariantRef<'a>) -> bool {
        variant.as_object().is_valid()
    }
}

/// Structural equality; barewords compare by what they read as.
pub(crate) fn views_equal(a: &View<'_>, b: &View<'_>) -> bool {
    equal_at(a, b, 0)
}

/// Containers nested past the traversal limit never compare equal.
fn equal_at(a: &View<'_>, b: &View<'_>, depth: usize) -> bool {
    match (a, b) {
        (View::Array(_), View::Array(_)) | (View::Object(_), View::Object(_))
            if depth == TRAVERSAL_LIMIT =>
        {
            false
        }
        (View::Array(x), View::Array(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y.iter())
                    .all(|(p, q)| equal_at(&p.view(), &q.view(), depth + 1))
        }
        (View::Object(x), View::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, value)| {
                    let other = y.get(key);
                    other.is_valid() && equal_at(&value.view(), &other.view(), depth + 1)
                })
        }
        (View::Array(_) | View::Object(_), _) | (_, View::Array(_) | View::Object(_)) => false,
        _ => match (a.resolve(), b.resolve()) {
            (Resolved::Integer(x), Resolved::Float(y)) | (Resolved::Float(y), Resolved::Integer(x)) => {
                x as f64 == y
            }
            (x, y) => x == y,
        },
    }
}

impl<'b> PartialEq<VariantRef<'b>> for VariantRef<'_> {
    fn eq(&self, other: &VariantRef<'b>) -> bool {
        views_equal(&self.view(), &other.view())
    }
}

impl PartialEq<i64> for VariantRef<'_> {
    fn eq(&self, other: &i64) -> bool {
        is_integer(self) == Some(*other)
    }
}

impl PartialEq<i32> for VariantRef<'_> {
    fn eq(&self, other: &i32) -> bool {
        *self == i64::from(*other)
    }
}

impl PartialEq<f64> for VariantRef<'_> {
    fn eq(&self, other: &f64) -> bool {
        is_number(self) && self.as_f64() == *other
    }
}

impl PartialEq<f32> for VariantRef<'_> {
    fn eq(&self, other: &f32) -> bool {
        is_number(self) && self.as_f64() as f32 == *other
    }
}

impl PartialEq<bool> for VariantRef<'_> {
    fn eq(&self, other: &bool) -> bool {
        bool::is_variant(self) && self.as_bool() == *other
    }
}

impl PartialEq<str> for VariantRef<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for VariantRef<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl fmt::Display for VariantRef<'_> {
    /// Compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::json::write_fmt(*self, f, false)
    }
}

impl fmt::Debug for VariantRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "VariantRef({self})")
        } else {
            f.write_str("VariantRef(<invalid>)")
        }
    }
}
