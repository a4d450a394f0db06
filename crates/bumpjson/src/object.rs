//! Handle to an object.

use std::fmt;
use std::ptr::NonNull;

use bumpjson_mem::{Arena, ArenaAllocError};

use crate::array::ArrayRef;
use crate::error::{Error, Result};
use crate::slot::{ArrayData, ListIter, ObjectData, ObjectNode, Slot, StrRef};
use crate::value::{Value, materialize, materialize_over};
use crate::variant::VariantRef;

enum Key<'k> {
    Copied(&'k str),
    Static(&'static str),
}

impl Key<'_> {
    fn as_str(&self) -> &str {
        match self {
            Key::Copied(key) => key,
            Key::Static(key) => key,
        }
    }

    fn store(&self, arena: &Arena) -> std::result::Result<StrRef, ArenaAllocError> {
        match *self {
            Key::Copied(key) => StrRef::copy(arena, key),
            Key::Static(key) => Ok(StrRef::borrowed(key)),
        }
    }
}

/// Handle to an object in a document.
///
/// Members keep their insertion order and keys are unique. Setting an
/// existing key overwrites its value in place; a new key is appended.
///
/// ```
/// use bumpjson::Document;
///
/// let mut doc = Document::new();
/// let object = doc.to_object();
/// object.set("a", 1).unwrap();
/// object.set("b", 2).unwrap();
/// object.set("a", 3).unwrap();
///
/// let keys: Vec<&str> = object.iter().map(|(key, _)| key).collect();
/// assert_eq!(keys, ["a", "b"]);
/// assert_eq!(object.get("a"), 3);
/// ```
#[derive(Clone, Copy)]
pub struct ObjectRef<'a> {
    inner: Option<(&'a Arena, &'a ObjectData)>,
}

impl<'a> ObjectRef<'a> {
    /// The Invalid sentinel for objects.
    pub const INVALID: ObjectRef<'a> = ObjectRef { inner: None };

    pub(crate) fn new(arena: &'a Arena, data: &'a ObjectData) -> Self {
        ObjectRef {
            inner: Some((arena, data)),
        }
    }

    pub(crate) fn parts(&self) -> Option<(&'a Arena, &'a ObjectData)> {
        self.inner
    }

    pub(crate) fn source(&self) -> Option<(&'a Arena, Slot)> {
        self.inner
            .map(|(arena, data)| (arena, Slot::Object(NonNull::from(data))))
    }

    /// Returns `false` for the Invalid sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.map_or(0, |(_, data)| data.len())
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value of `key`, or [`VariantRef::INVALID`].
    #[must_use]
    pub fn get(&self, key: &str) -> VariantRef<'a> {
        match self.inner {
            Some((arena, data)) => data.find(key).map_or(VariantRef::INVALID, |node| {
                VariantRef::from_slot(arena, &node.value)
            }),
            None => VariantRef::INVALID,
        }
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.is_some_and(|(_, data)| data.find(key).is_some())
    }

    /// Sets `key` to `value`, copying the key into the arena when it is new.
    ///
    /// On [`Error::NoMemory`] the object is unchanged.
    pub fn set<'v>(&self, key: &str, value: impl Into<Value<'v>>) -> Result<()> {
        let value = value.into();
        self.insert_with(Key::Copied(key), |arena, previous| match previous {
            Some(previous) => materialize_over(arena, value, previous),
            None => materialize(arena, value),
        })
    }

    /// Like [`set`](Self::set), but stores only the address of the key.
    pub fn set_static<'v>(&self, key: &'static str, value: impl Into<Value<'v>>) -> Result<()> {
        let value = value.into();
        self.insert_with(Key::Static(key), |arena, previous| match previous {
            Some(previous) => materialize_over(arena, value, previous),
            None => materialize(arena, value),
        })
    }

    /// Unlinks `key`, keeping the order of the other members.
    ///
    /// The member's memory is not reclaimed until the document is cleared.
    /// Returns `false` if the key was absent.
    pub fn remove(&self, key: &str) -> bool {
        self.inner
            .is_some_and(|(_, data)| data.unlink(|_, node| node.key() == key))
    }

    /// Sets `key` to a new empty array and returns it, or
    /// [`ArrayRef::INVALID`] (with this object unchanged) when out of memory.
    #[must_use = "the new array is only reachable through the returned handle or a later lookup"]
    pub fn create_nested_array(&self, key: &str) -> ArrayRef<'a> {
        let mut child = None;
        let linked = self.insert_with(Key::Copied(key), |arena, _| {
            let ptr = arena.alloc(ArrayData::new())?;
            child = Some(ptr);
            Ok(Slot::Array(ptr))
        });
        match (linked, child, self.inner) {
            // SAFETY: freshly allocated in the borrowed arena.
            (Ok(()), Some(ptr), Some((arena, _))) => ArrayRef::new(arena, unsafe { ptr.as_ref() }),
            _ => ArrayRef::INVALID,
        }
    }

    /// Sets `key` to a new empty object and returns it, or
    /// [`ObjectRef::INVALID`] (with this object unchanged) when out of
    /// memory.
    #[must_use = "the new object is only reachable through the returned handle or a later lookup"]
    pub fn create_nested_object(&self, key: &str) -> ObjectRef<'a> {
        let mut child = None;
        let linked = self.insert_with(Key::Copied(key), |arena, _| {
            let ptr = arena.alloc(ObjectData::new())?;
            child = Some(ptr);
            Ok(Slot::Object(ptr))
        });
        match (linked, child, self.inner) {
            // SAFETY: freshly allocated in the borrowed arena.
            (Ok(()), Some(ptr), Some((arena, _))) => ObjectRef::new(arena, unsafe { ptr.as_ref() }),
            _ => ObjectRef::INVALID,
        }
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    #[must_use]
    pub fn iter(&self) -> ObjectIter<'a> {
        ObjectIter {
            inner: self.inner.map(|(arena, data)| (arena, data.iter())),
        }
    }

    /// Looks the key up, then builds the value (seeing the current one, if
    /// any), then the key and the node. A failure at any step leaves the
    /// member list untouched.
    fn insert_with(
        &self,
        key: Key<'_>,
        make: impl FnOnce(&'a Arena, Option<Slot>) -> std::result::Result<Slot, ArenaAllocError>,
    ) -> Result<()> {
        let (arena, data) = self.inner.ok_or(Error::InvalidTarget)?;

        if let Some(node) = data.find(key.as_str()) {
            let value = make(arena, Some(node.value.get()))?;
            node.value.set(value);
            return Ok(());
        }

        let value = make(arena, None)?;
        let key = key.store(arena)?;
        data.push(arena, key, value)?;
        Ok(())
    }
}

impl<'a> IntoIterator for ObjectRef<'a> {
    type Item = (&'a str, VariantRef<'a>);
    type IntoIter = ObjectIter<'a>;

    fn into_iter(self) -> ObjectIter<'a> {
        self.iter()
    }
}

/// Iterator over the members of an [`ObjectRef`].
pub struct ObjectIter<'a> {
    inner: Option<(&'a Arena, ListIter<'a, ObjectNode>)>,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = (&'a str, VariantRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (arena, nodes) = self.inner.as_mut()?;
        let arena: &'a Arena = *arena;
        nodes
            .next()
            .map(|node| (node.key(), VariantRef::from_slot(arena, &node.value)))
    }
}

impl<'b> PartialEq<ObjectRef<'b>> for ObjectRef<'_> {
    fn eq(&self, other: &ObjectRef<'b>) -> bool {
        VariantRef::from(*self) == VariantRef::from(*other)
    }
}

impl fmt::Display for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&VariantRef::from(*self), f)
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use crate::sizing::{object_size, string_size};
    use crate::slot::StringMode;

    #[test]
    fn test_set_and_get() {
        let mut doc = Document::new();
        let object = doc.to_object();
        object.set("a", "element at key \"a\"").unwrap();
        object.set("b", "element at key \"b\"").unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(object.get("a"), "element at key \"a\"");
        assert_eq!(object.get("b"), "element at key \"b\"");
        assert!(!object.get("c").is_valid());
        assert!(object.contains_key("a"));
        assert!(!object.contains_key("c"));
    }

    #[test]
    fn test_same_key_keeps_size_and_memory() {
        let mut doc = Document::new();
        doc.to_object().set("hello", 1).unwrap();
        let object = doc.as_object();
        let used = doc.memory_usage();

        for i in 0..10 {
            object.set("hello", i).unwrap();
        }

        assert_eq!(object.len(), 1);
        assert_eq!(doc.memory_usage(), used);
        assert_eq!(object.get("hello"), 9);
    }

    #[test]
    fn test_same_key_same_text_keeps_memory() {
        let mut doc = Document::new();
        doc.to_object().set("k", "v").unwrap();
        let object = doc.as_object();
        let used = doc.memory_usage();

        for _ in 0..5 {
            object.set("k", "v").unwrap();
        }
        assert_eq!(doc.memory_usage(), used);

        object.set("k", "w").unwrap();
        assert_eq!(object.get("k"), "w");
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn test_key_allocation_failure_leaves_object_unchanged() {
        let mut doc = Document::fixed(object_size(1) + string_size(2));
        let object = doc.to_object();
        object.set("ab", 1).unwrap();

        assert_eq!(object.set("cd", 2), Err(Error::NoMemory));
        assert_eq!(object.len(), 1);
        assert!(!object.contains_key("cd"));
    }

    #[test]
    fn test_static_keys_are_borrowed() {
        let mut doc = Document::fixed(object_size(1));
        doc.to_object();
        let object = doc.as_object();

        object.set_static("key", Value::borrowed("value")).unwrap();

        assert_eq!(doc.memory_usage(), object_size(1));
        assert_eq!(object.get("key").string_mode(), Some(StringMode::Borrowed));
    }

    #[test]
    fn test_copied_strings_are_owned() {
        let mut doc = Document::new();
        let object = doc.to_object();
        let text = String::from("temporary");
        object.set("key", &text).unwrap();
        drop(text);

        assert_eq!(object.get("key"), "temporary");
        assert_eq!(object.get("key").string_mode(), Some(StringMode::Owned));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut doc = Document::new();
        let object = doc.to_object();
        for key in ["a", "b", "c", "d"] {
            object.set(key, key).unwrap();
        }

        assert!(object.remove("b"));
        assert!(!object.remove("b"));

        let keys: Vec<&str> = object.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "c", "d"]);
    }

    #[test]
    fn test_create_nested() {
        let mut doc = Document::new();
        let object = doc.to_object();
        let list = object.create_nested_array("list");
        list.append(1).unwrap();
        let inner = object.create_nested_object("inner");
        inner.set("x", true).unwrap();

        assert_eq!(doc.to_string(), r#"{"list":[1],"inner":{"x":true}}"#);
    }

    #[test]
    fn test_invalid_object() {
        let object = ObjectRef::INVALID;
        assert!(object.is_empty());
        assert_eq!(object.set("a", 1), Err(Error::InvalidTarget));
        assert!(!object.remove("a"));
        assert!(!object.create_nested_array("a").is_valid());
        assert_eq!(object.iter().count(), 0);
    }
}
