//! The document: one arena plus one root value.

use std::cell::Cell;
use std::fmt;

use bumpjson_log::trace;
use bumpjson_mem::{Arena, ArenaPolicy, DEFAULT_CHUNK_SIZE};

use crate::array::ArrayRef;
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::slot::{ArrayData, ObjectData, Slot};
use crate::value::{Value, materialize};
use crate::variant::{JsonIndex, VariantRef};

/// Owns an arena and the root value built in it.
///
/// Every handle borrows the document, so [`clear`](Document::clear) and the
/// decoders (which take `&mut self`) cannot run while a handle is alive.
///
/// ```
/// use bumpjson::{Document, deserialize_json};
///
/// let mut doc = Document::new();
/// deserialize_json(&mut doc, r#"{"hello":"world"}"#).unwrap();
/// assert_eq!(doc.get("hello"), "world");
///
/// doc.clear();
/// assert_eq!(doc.memory_usage(), 0);
/// assert!(doc.root().is_null());
/// ```
pub struct Document {
    arena: Arena,
    root: Cell<Slot>,
}

// SAFETY: the arena is `Send` and every address held by the root points into
// it or to `'static` strings; nothing is shared with another document.
unsafe impl Send for Document {}

impl Document {
    /// A growable document with [`DEFAULT_CHUNK_SIZE`] chunks.
    #[must_use]
    pub fn new() -> Self {
        Document::growable(DEFAULT_CHUNK_SIZE)
    }

    /// A growable document whose first chunk is `chunk_size` bytes.
    #[must_use]
    pub fn growable(chunk_size: usize) -> Self {
        Document::from_arena(Arena::growable(chunk_size))
    }

    /// A document limited to `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if the host cannot provide the block; use
    /// [`try_fixed`](Document::try_fixed) to handle that case.
    #[must_use]
    pub fn fixed(capacity: usize) -> Self {
        match Document::try_fixed(capacity) {
            Ok(doc) => doc,
            Err(err) => panic!("cannot reserve {capacity} bytes for a fixed document: {err}"),
        }
    }

    /// A document limited to `capacity` bytes, or [`Error::NoMemory`].
    pub fn try_fixed(capacity: usize) -> Result<Self> {
        Ok(Document::from_arena(Arena::fixed(capacity)?))
    }

    /// A document using the given arena policy.
    pub fn with_policy(policy: ArenaPolicy) -> Result<Self> {
        Ok(Document::from_arena(Arena::with_policy(policy)?))
    }

    fn from_arena(arena: Arena) -> Self {
        Document {
            arena,
            root: Cell::new(Slot::Undefined),
        }
    }

    pub(crate) fn parts(&self) -> (&Arena, &Cell<Slot>) {
        (&self.arena, &self.root)
    }

    /// Handle to the root value.
    #[must_use]
    pub fn root(&self) -> VariantRef<'_> {
        VariantRef::from_slot(&self.arena, &self.root)
    }

    /// Subscripts the root.
    #[must_use]
    pub fn get(&self, index: impl JsonIndex) -> VariantRef<'_> {
        self.root().get(index)
    }

    /// The root array, or [`ArrayRef::INVALID`].
    #[must_use]
    pub fn as_array(&self) -> ArrayRef<'_> {
        self.root().as_array()
    }

    /// The root object, or [`ObjectRef::INVALID`].
    #[must_use]
    pub fn as_object(&self) -> ObjectRef<'_> {
        self.root().as_object()
    }

    /// Number of elements or members of the root.
    #[must_use]
    pub fn size(&self) -> usize {
        self.root().size()
    }

    /// Bytes taken from the arena.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.arena.used()
    }

    /// The fixed capacity, or `None` for growable documents.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.arena.capacity()
    }

    /// The arena policy chosen at construction.
    #[must_use]
    pub fn policy(&self) -> ArenaPolicy {
        self.arena.policy()
    }

    /// Discards the whole tree and rewinds the arena.
    pub fn clear(&mut self) {
        trace!("document cleared ({} bytes)", self.arena.used());
        self.arena.clear();
        self.root.set(Slot::Undefined);
    }

    /// Clears the document and makes the root an empty array.
    ///
    /// Returns [`ArrayRef::INVALID`] if even the array header does not fit.
    pub fn to_array(&mut self) -> ArrayRef<'_> {
        self.clear();
        match self.arena.alloc(ArrayData::new()) {
            Ok(ptr) => {
                self.root.set(Slot::Array(ptr));
                // SAFETY: freshly allocated in our arena.
                ArrayRef::new(&self.arena, unsafe { ptr.as_ref() })
            }
            Err(_) => ArrayRef::INVALID,
        }
    }

    /// Clears the document and makes the root an empty object.
    ///
    /// Returns [`ObjectRef::INVALID`] if even the object header does not fit.
    pub fn to_object(&mut self) -> ObjectRef<'_> {
        self.clear();
        match self.arena.alloc(ObjectData::new()) {
            Ok(ptr) => {
                self.root.set(Slot::Object(ptr));
                // SAFETY: freshly allocated in our arena.
                ObjectRef::new(&self.arena, unsafe { ptr.as_ref() })
            }
            Err(_) => ObjectRef::INVALID,
        }
    }

    /// Clears the document and stores `value` as the root.
    ///
    /// Handles from another document are deep-copied.
    ///
    /// ```
    /// use bumpjson::{Document, deserialize_json};
    ///
    /// let mut source = Document::new();
    /// deserialize_json(&mut source, r#"{"list":[1,2,3]}"#).unwrap();
    ///
    /// let mut copy = Document::new();
    /// copy.assign(source.get("list")).unwrap();
    /// drop(source);
    ///
    /// assert_eq!(copy.to_string(), "[1,2,3]");
    /// ```
    pub fn assign<'v>(&mut self, value: impl Into<Value<'v>>) -> Result<()> {
        self.clear();
        let slot = materialize(&self.arena, value.into()).map_err(Error::from)?;
        self.root.set(slot);
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl<'a> From<&'a Document> for VariantRef<'a> {
    fn from(doc: &'a Document) -> Self {
        doc.root()
    }
}

impl fmt::Display for Document {
    /// Compact JSON of the root.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root(), f)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root())
            .field("memory_usage", &self.memory_usage())
            .field("policy", &self.policy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::{array_size, object_size};
    use crate::variant::Kind;

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert_eq!(doc.root().kind(), Kind::Undefined);
        assert_eq!(doc.size(), 0);
        assert_eq!(doc.memory_usage(), 0);
        assert_eq!(doc.capacity(), None);
    }

    #[test]
    fn test_fixed_capacity() {
        let doc = Document::fixed(128);
        assert_eq!(doc.capacity(), Some(128));
        assert_eq!(
            doc.policy(),
            ArenaPolicy::Fixed { capacity: 128 }
        );
    }

    #[test]
    fn test_to_array_discards_previous_content() {
        let mut doc = Document::new();
        let object = doc.to_object();
        object.set("a", "some text").unwrap();

        let array = doc.to_array();
        assert!(array.is_empty());
        assert_eq!(doc.memory_usage(), array_size(0));
    }

    #[test]
    fn test_to_object_in_tiny_fixed_document() {
        let mut doc = Document::fixed(object_size(0) - 8);
        assert!(!doc.to_object().is_valid());
        assert!(doc.root().is_null());
    }

    #[test]
    fn test_assign_scalar_and_string() {
        let mut doc = Document::new();
        doc.assign(42).unwrap();
        assert_eq!(doc.root(), 42);

        doc.assign("text").unwrap();
        assert_eq!(doc.root(), "text");
    }

    #[test]
    fn test_assign_reports_no_memory() {
        let mut doc = Document::fixed(8);
        assert_eq!(doc.assign("longer than eight bytes"), Err(Error::NoMemory));
    }

    #[test]
    fn test_root_set_through_handle() {
        let doc = Document::new();
        doc.root().set(true).unwrap();
        assert_eq!(doc.root(), true);
    }

    #[test]
    fn test_document_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Document>();
    }
}
