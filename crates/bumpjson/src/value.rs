//! Values accepted by the write API.

use std::ptr;

use bumpjson_mem::{Arena, ArenaAllocError};

use crate::array::ArrayRef;
use crate::object::ObjectRef;
use crate::slot::{self, Slot, StrRef, StringMode};
use crate::variant::VariantRef;

/// Anything that can be stored in a document.
///
/// Built implicitly through `From` by every write method:
///
/// ```
/// use bumpjson::{Document, Value};
///
/// let mut doc = Document::new();
/// let object = doc.to_object();
/// object.set("count", 3).unwrap();
/// object.set("ratio", 0.5).unwrap();
/// object.set("name", "sensor").unwrap();
/// object.set("unit", Value::borrowed("celsius")).unwrap();
/// object.set("missing", ()).unwrap();
/// assert_eq!(object.len(), 5);
/// ```
///
/// `&str` is copied into the document's arena. [`Value::borrowed`] stores
/// only the address of a `'static` string. Handles from the same document
/// alias the referenced container; handles from another document are
/// deep-copied.
#[derive(Clone, Copy)]
pub enum Value<'v> {
    /// JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Integer(i64),
    /// A floating-point number.
    Float(f64),
    /// A string copied into the arena.
    Str(&'v str),
    /// A string stored by address.
    Static(&'static str),
    /// Another value, aliased or deep-copied.
    Variant(VariantRef<'v>),
    /// An array, aliased or deep-copied.
    Array(ArrayRef<'v>),
    /// An object, aliased or deep-copied.
    Object(ObjectRef<'v>),
}

impl Value<'_> {
    /// A string stored by address instead of being copied.
    #[must_use]
    pub const fn borrowed(text: &'static str) -> Self {
        Value::Static(text)
    }
}

/// Turns `value` into a slot owned by `arena`.
pub(crate) fn materialize(arena: &Arena, value: Value<'_>) -> Result<Slot, ArenaAllocError> {
    let source = match value {
        Value::Null => return Ok(Slot::Null),
        Value::Bool(b) => return Ok(Slot::Bool(b)),
        Value::Integer(i) => return Ok(Slot::Integer(i)),
        Value::Float(f) => return Ok(Slot::Float(f)),
        Value::Str(s) => return Ok(Slot::String(StrRef::copy(arena, s)?)),
        Value::Static(s) => return Ok(Slot::String(StrRef::borrowed(s))),
        Value::Variant(v) => v.source(),
        Value::Array(a) => a.source(),
        Value::Object(o) => o.source(),
    };

    match source {
        None => Ok(Slot::Null),
        Some((from, slot)) if ptr::eq(from, arena) => Ok(slot),
        // SAFETY: `from` is borrowed by the handle for the whole call.
        Some((_, slot)) => unsafe { slot::deep_copy(arena, slot) },
    }
}

/// Like [`materialize`], but keeps the bytes of `previous` when it already
/// holds the same owned text, so rewriting a value does not grow the arena.
pub(crate) fn materialize_over(
    arena: &Arena,
    value: Value<'_>,
    previous: Slot,
) -> Result<Slot, ArenaAllocError> {
    if let (Value::Str(text), Slot::String(old)) = (value, previous)
        && old.mode() == StringMode::Owned
        // SAFETY: `previous` was read from a live slot of `arena`.
        && unsafe { old.as_str() } == text
    {
        return Ok(previous);
    }
    materialize(arena, value)
}

impl From<()> for Value<'_> {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value<'_> {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Value::Float(value as f64), Value::Integer)
    }
}

impl From<usize> for Value<'_> {
    fn from(value: usize) -> Self {
        Value::from(value as u64)
    }
}

impl From<isize> for Value<'_> {
    fn from(value: isize) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f32> for Value<'_> {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<'v> From<&'v str> for Value<'v> {
    fn from(value: &'v str) -> Self {
        Value::Str(value)
    }
}

impl<'v> From<&'v String> for Value<'v> {
    fn from(value: &'v String) -> Self {
        Value::Str(value)
    }
}

impl<'v> From<VariantRef<'v>> for Value<'v> {
    fn from(value: VariantRef<'v>) -> Self {
        Value::Variant(value)
    }
}

impl<'v> From<ArrayRef<'v>> for Value<'v> {
    fn from(value: ArrayRef<'v>) -> Self {
        Value::Array(value)
    }
}

impl<'v> From<ObjectRef<'v>> for Value<'v> {
    fn from(value: ObjectRef<'v>) -> Self {
        Value::Object(value)
    }
}

impl<'v, T: Into<Value<'v>>> From<Option<T>> for Value<'v> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
