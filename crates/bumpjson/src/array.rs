//! Handle to an array.

use std::fmt;

use bumpjson_mem::Arena;

use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::slot::{ArrayData, ArrayNode, ListIter, ObjectData, Slot};
use crate::value::{Value, materialize, materialize_over};
use crate::variant::VariantRef;

/// Handle to an array in a document.
///
/// Elements are kept in insertion order in a linked list, so indexing is
/// linear. Appending is constant time.
///
/// ```
/// use bumpjson::Document;
///
/// let mut doc = Document::new();
/// let array = doc.to_array();
/// array.append(1).unwrap();
/// array.append("two").unwrap();
/// array.create_nested_array().append(3).unwrap();
///
/// assert_eq!(doc.to_string(), r#"[1,"two",[3]]"#);
/// ```
#[derive(Clone, Copy)]
pub struct ArrayRef<'a> {
    inner: Option<(&'a Arena, &'a ArrayData)>,
}

impl<'a> ArrayRef<'a> {
    /// The Invalid sentinel for arrays.
    pub const INVALID: ArrayRef<'a> = ArrayRef { inner: None };

    pub(crate) fn new(arena: &'a Arena, data: &'a ArrayData) -> Self {
        ArrayRef {
            inner: Some((arena, data)),
        }
    }

    pub(crate) fn parts(&self) -> Option<(&'a Arena, &'a ArrayData)> {
        self.inner
    }

    pub(crate) fn source(&self) -> Option<(&'a Arena, Slot)> {
        self.inner
            .map(|(arena, data)| (arena, Slot::Array(std::ptr::NonNull::from(data))))
    }

    /// Returns `false` for the Invalid sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.map_or(0, |(_, data)| data.len())
    }

    /// Returns `true` if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`, or [`VariantRef::INVALID`] past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> VariantRef<'a> {
        match self.inner {
            Some((arena, data)) => data
                .get(index)
                .map_or(VariantRef::INVALID, |node| {
                    VariantRef::from_slot(arena, &node.value)
                }),
            None => VariantRef::INVALID,
        }
    }

    /// Appends `value` at the end.
    ///
    /// On [`Error::NoMemory`] the array is unchanged.
    pub fn append<'v>(&self, value: impl Into<Value<'v>>) -> Result<()> {
        let (arena, data) = self.inner.ok_or(Error::InvalidTarget)?;
        let slot = materialize(arena, value.into())?;
        data.push(arena, slot)?;
        Ok(())
    }

    /// Replaces the element at `index`.
    ///
    /// Fails with [`Error::InvalidTarget`] when `index` is out of range.
    pub fn set<'v>(&self, index: usize, value: impl Into<Value<'v>>) -> Result<()> {
        let (arena, data) = self.inner.ok_or(Error::InvalidTarget)?;
        let node = data.get(index).ok_or(Error::InvalidTarget)?;
        let slot = materialize_over(arena, value.into(), node.value.get())?;
        node.value.set(slot);
        Ok(())
    }

    /// Removes the element at `index`, keeping the order of the others.
    ///
    /// The element's memory is not reclaimed until the document is cleared.
    /// Returns `false` if there was no such element.
    pub fn remove(&self, index: usize) -> bool {
        self.inner
            .is_some_and(|(_, data)| data.unlink(|i, _| i == index))
    }

    /// Appends a new empty array and returns it, or
    /// [`ArrayRef::INVALID`] (with this array unchanged) when out of memory.
    #[must_use = "the new array is only reachable through the returned handle or a later lookup"]
    pub fn create_nested_array(&self) -> ArrayRef<'a> {
        let Some((arena, data)) = self.inner else {
            return ArrayRef::INVALID;
        };
        let Ok(child) = arena.alloc(ArrayData::new()) else {
            return ArrayRef::INVALID;
        };
        match data.push(arena, Slot::Array(child)) {
            // SAFETY: freshly allocated in the borrowed arena.
            Ok(()) => ArrayRef::new(arena, unsafe { child.as_ref() }),
            Err(_) => ArrayRef::INVALID,
        }
    }

    /// Appends a new empty object and returns it, or
    /// [`ObjectRef::INVALID`] (with this array unchanged) when out of memory.
    #[must_use = "the new object is only reachable through the returned handle or a later lookup"]
    pub fn create_nested_object(&self) -> ObjectRef<'a> {
        let Some((arena, data)) = self.inner else {
            return ObjectRef::INVALID;
        };
        let Ok(child) = arena.alloc(ObjectData::new()) else {
            return ObjectRef::INVALID;
        };
        match data.push(arena, Slot::Object(child)) {
            // SAFETY: freshly allocated in the borrowed arena.
            Ok(()) => ObjectRef::new(arena, unsafe { child.as_ref() }),
            Err(_) => ObjectRef::INVALID,
        }
    }

    /// Iterates over the elements in order.
    #[must_use]
    pub fn iter(&self) -> ArrayIter<'a> {
        ArrayIter {
            inner: self.inner.map(|(arena, data)| (arena, data.iter())),
        }
    }
}

impl<'a> IntoIterator for ArrayRef<'a> {
    type Item = VariantRef<'a>;
    type IntoIter = ArrayIter<'a>;

    fn into_iter(self) -> ArrayIter<'a> {
        self.iter()
    }
}

/// Iterator over the elements of an [`ArrayRef`].
pub struct ArrayIter<'a> {
    inner: Option<(&'a Arena, ListIter<'a, ArrayNode>)>,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = VariantRef<'a>;

    fn next(&mut self) -> Option<VariantRef<'a>> {
        let (arena, nodes) = self.inner.as_mut()?;
        let arena: &'a Arena = *arena;
        nodes
            .next()
            .map(|node| VariantRef::from_slot(arena, &node.value))
    }
}

impl<'b> PartialEq<ArrayRef<'b>> for ArrayRef<'_> {
    fn eq(&self, other: &ArrayRef<'b>) -> bool {
        VariantRef::from(*self) == VariantRef::from(*other)
    }
}

impl fmt::Display for ArrayRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&VariantRef::from(*self), f)
    }
}

impl fmt::Debug for ArrayRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
