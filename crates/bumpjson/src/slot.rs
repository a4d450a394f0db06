//! Arena-resident representation of values and containers.
//!
//! A [`Slot`] is the tagged union stored in the document root and in every
//! container node. Containers are singly linked lists of nodes allocated in
//! the document's arena; a slot refers to them by address, so copying a slot
//! aliases the container (reference semantics) while scalars are copied by
//! value.
//!
//! Everything here is plain data: no destructors, no reference counting. The
//! arena reclaims it all at once.

use std::cell::Cell;
use std::marker::PhantomData;
use std::ptr::NonNull;

use bumpjson_mem::{Arena, ArenaAllocError};

use crate::options::TRAVERSAL_LIMIT;

/// How the bytes of a string are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringMode {
    /// The bytes were copied into the document's arena.
    Owned,
    /// Only the address of a `'static` string is stored.
    Borrowed,
}

/// Reference to the bytes of a string, either arena-owned or borrowed.
///
/// Opaque to users; produced by a
/// [`StringBuilder`](crate::builder::StringBuilder) or by the write API.
/// The referenced bytes are always valid UTF-8 and never mutated.
#[derive(Clone, Copy)]
pub struct StrRef {
    ptr: NonNull<u8>,
    len: usize,
    mode: StringMode,
}

impl StrRef {
    /// Copies `text` into the arena.
    pub(crate) fn copy(arena: &Arena, text: &str) -> Result<Self, ArenaAllocError> {
        let ptr = arena.allocate_string(text.as_bytes())?;
        Ok(StrRef {
            ptr,
            len: text.len(),
            mode: StringMode::Owned,
        })
    }

    /// Stores only the address of `text`.
    pub(crate) fn borrowed(text: &'static str) -> Self {
        StrRef {
            ptr: NonNull::from(text).cast(),
            len: text.len(),
            mode: StringMode::Borrowed,
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to `len` bytes of valid UTF-8 inside an arena, never
    /// written again until that arena is cleared.
    pub(crate) unsafe fn from_arena(ptr: NonNull<u8>, len: usize) -> Self {
        StrRef {
            ptr,
            len,
            mode: StringMode::Owned,
        }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// How the bytes are held.
    #[must_use]
    pub fn mode(&self) -> StringMode {
        self.mode
    }

    /// # Safety
    ///
    /// For an owned string, the arena holding the bytes must stay alive and
    /// uncleared for `'a`.
    pub(crate) unsafe fn as_str<'a>(&self) -> &'a str {
        // SAFETY: constructors only accept UTF-8, and the caller vouches for
        // the lifetime of the bytes.
        unsafe {
            let bytes = std::slice::from_raw_parts(self.ptr.as_ptr(), self.len);
            std::str::from_utf8_unchecked(bytes)
        }
    }
}

/// Longest bareword kept inside the slot itself.
pub(crate) const INLINE_RAW_CAPACITY: usize = 22;

/// Source text of a bareword, interpreted on read.
///
/// Short words that read as a literal (number, `true`, `false`, `null`) are
/// kept inline. Everything else, in particular words read back as text, is
/// stored in the arena so that string reads can borrow it.
#[derive(Clone, Copy)]
pub(crate) enum RawText {
    Inline {
        len: u8,
        bytes: [u8; INLINE_RAW_CAPACITY],
    },
    Stored(StrRef),
}

impl RawText {
    /// Packs `text` inline if it fits.
    pub(crate) fn inline(text: &str) -> Option<Self> {
        if text.len() > INLINE_RAW_CAPACITY {
            return None;
        }
        let mut bytes = [0; INLINE_RAW_CAPACITY];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        Some(RawText::Inline {
            len: text.len() as u8,
            bytes,
        })
    }
}

/// The tagged union stored in every value position.
#[derive(Clone, Copy)]
pub(crate) enum Slot {
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(StrRef),
    Raw(RawText),
    Array(NonNull<ArrayData>),
    Object(NonNull<ObjectData>),
}

/// A [`RawText`] read out of a slot, tied to the arena that may hold its
/// bytes.
#[derive(Clone, Copy)]
pub(crate) struct RawView<'a> {
    raw: RawText,
    _arena: PhantomData<&'a Arena>,
}

impl<'a> RawView<'a> {
    /// # Safety
    ///
    /// A stored raw text must live in an arena that stays alive and
    /// uncleared for `'a`.
    pub(crate) unsafe fn new(raw: RawText) -> Self {
        RawView {
            raw,
            _arena: PhantomData,
        }
    }

    pub(crate) fn text(&self) -> &str {
        match &self.raw {
            RawText::Inline { len, bytes } => {
                // SAFETY: inline bytes are copied from a `&str` prefix.
                unsafe { std::str::from_utf8_unchecked(&bytes[..*len as usize]) }
            }
            // SAFETY: guaranteed by `RawView::new`.
            RawText::Stored(s) => unsafe { s.as_str() },
        }
    }

    /// The arena-backed text, if the word is not stored inline.
    pub(crate) fn stored_text(&self) -> Option<&'a str> {
        match &self.raw {
            RawText::Inline { .. } => None,
            // SAFETY: guaranteed by `RawView::new`.
            RawText::Stored(s) => Some(unsafe { s.as_str() }),
        }
    }
}

/// A node that can be chained in a [`List`].
pub(crate) trait Linked: Sized {
    fn link(&self) -> &Cell<Option<NonNull<Self>>>;
}

/// Singly linked list head with tail tracking, living in an arena.
pub(crate) struct List<N> {
    head: Cell<Option<NonNull<N>>>,
    tail: Cell<Option<NonNull<N>>>,
    len: Cell<usize>,
}

pub(crate) type ArrayData = List<ArrayNode>;
pub(crate) type ObjectData = List<ObjectNode>;

pub(crate) struct ArrayNode {
    pub(crate) value: Cell<Slot>,
    next: Cell<Option<NonNull<ArrayNode>>>,
}

pub(crate) struct ObjectNode {
    key: StrRef,
    pub(crate) value: Cell<Slot>,
    next: Cell<Option<NonNull<ObjectNode>>>,
}

impl Linked for ArrayNode {
    fn link(&self) -> &Cell<Option<NonNull<Self>>> {
        &self.next
    }
}

impl Linked for ObjectNode {
    fn link(&self) -> &Cell<Option<NonNull<Self>>> {
        &self.next
    }
}

impl ObjectNode {
    /// The member's key.
    ///
    /// Lives as long as the node: keys share the node's arena (or are
    /// `'static`).
    pub(crate) fn key(&self) -> &str {
        // SAFETY: the key was allocated in the node's arena or is borrowed
        // from a `'static` string.
        unsafe { self.key.as_str() }
    }

    pub(crate) fn key_ref(&self) -> StrRef {
        self.key
    }
}

impl<N: Linked> List<N> {
    pub(crate) const fn new() -> Self {
        List {
            head: Cell::new(None),
            tail: Cell::new(None),
            len: Cell::new(0),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len.get()
    }

    /// Links an already allocated node at the tail.
    fn push_node(&self, node: NonNull<N>) {
        match self.tail.get() {
            None => self.head.set(Some(node)),
            // SAFETY: list nodes live in the same arena as the list.
            Some(tail) => unsafe { tail.as_ref() }.link().set(Some(node)),
        }
        self.tail.set(Some(node));
        self.len.set(self.len.get() + 1);
    }

    pub(crate) fn iter(&self) -> ListIter<'_, N> {
        ListIter {
            next: self.head.get(),
            _list: PhantomData,
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&N> {
        self.iter().nth(index)
    }

    /// Unlinks the first node matching `pred`, keeping the order of the
    /// others. The node's memory stays in the arena.
    pub(crate) fn unlink(&self, mut pred: impl FnMut(usize, &N) -> bool) -> bool {
        let mut prev: Option<NonNull<N>> = None;
        let mut cursor = self.head.get();
        let mut index = 0;

        while let Some(ptr) = cursor {
            // SAFETY: list nodes live in the same arena as the list.
            let node = unsafe { ptr.as_ref() };
            let next = node.link().get();
            if pred(index, node) {
                match prev {
                    None => self.head.set(next),
                    // SAFETY: as above.
                    Some(p) => unsafe { p.as_ref() }.link().set(next),
                }
                if self.tail.get() == Some(ptr) {
                    self.tail.set(prev);
                }
                self.len.set(self.len.get() - 1);
                return true;
            }
            prev = cursor;
            cursor = next;
            index += 1;
        }
        false
    }
}

impl ArrayData {
    /// Allocates a node holding `value` and appends it.
    pub(crate) fn push(&self, arena: &Arena, value: Slot) -> Result<(), ArenaAllocError> {
        let node = arena.alloc(ArrayNode {
            value: Cell::new(value),
            next: Cell::new(None),
        })?;
        self.push_node(node);
        Ok(())
    }
}

impl ObjectData {
    pub(crate) fn find(&self, key: &str) -> Option<&ObjectNode> {
        self.iter().find(|node| node.key() == key)
    }

    /// Allocates a node for a key known to be absent and appends it.
    pub(crate) fn push(
        &self,
        arena: &Arena,
        key: StrRef,
        value: Slot,
    ) -> Result<(), ArenaAllocError> {
        let node = arena.alloc(ObjectNode {
            key,
            value: Cell::new(value),
            next: Cell::new(None),
        })?;
        self.push_node(node);
        Ok(())
    }

    /// Overwrites the value of `key`, or appends a new member.
    pub(crate) fn insert(
        &self,
        arena: &Arena,
        key: StrRef,
        value: Slot,
    ) -> Result<(), ArenaAllocError> {
        // SAFETY: `key` was just produced by the caller for this arena.
        match self.find(unsafe { key.as_str() }) {
            Some(node) => {
                node.value.set(value);
                Ok(())
            }
            None => self.push(arena, key, value),
        }
    }
}

pub(crate) struct ListIter<'a, N> {
    next: Option<NonNull<N>>,
    _list: PhantomData<&'a List<N>>,
}

impl<'a, N: Linked> Iterator for ListIter<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<&'a N> {
        let ptr = self.next?;
        // SAFETY: list nodes live in the same arena as the list, which
        // outlives `'a`.
        let node = unsafe { ptr.as_ref() };
        self.next = node.link().get();
        Some(node)
    }
}

/// Copies `slot` into `arena`, duplicating every owned string and every
/// container reachable from it. Borrowed strings keep pointing at their
/// `'static` bytes. Containers nested past the traversal limit are copied
/// as `null`.
///
/// # Safety
///
/// The arena holding `slot`'s data must stay alive during the call.
pub(crate) unsafe fn deep_copy(arena: &Arena, slot: Slot) -> Result<Slot, ArenaAllocError> {
    unsafe { copy_at(arena, slot, 0) }
}

unsafe fn copy_at(arena: &Arena, slot: Slot, depth: usize) -> Result<Slot, ArenaAllocError> {
    if matches!(slot, Slot::Array(_) | Slot::Object(_)) && depth == TRAVERSAL_LIMIT {
        return Ok(Slot::Null);
    }
    let copy_str = |s: StrRef| -> Result<StrRef, ArenaAllocError> {
        match s.mode() {
            // SAFETY: the source arena is alive (caller contract).
            StringMode::Owned => StrRef::copy(arena, unsafe { s.as_str() }),
            StringMode::Borrowed => Ok(s),
        }
    };

    Ok(match slot {
        Slot::String(s) => Slot::String(copy_str(s)?),
        Slot::Raw(RawText::Stored(s)) => Slot::Raw(RawText::Stored(copy_str(s)?)),
        Slot::Array(src) => {
            let dst = arena.alloc(ArrayData::new())?;
            // SAFETY: source and destination containers are live arena data.
            let (src, dst_ref) = unsafe { (src.as_ref(), dst.as_ref()) };
            for node in src.iter() {
                let value = unsafe { copy_at(arena, node.value.get(), depth + 1) }?;
                dst_ref.push(arena, value)?;
            }
            Slot::Array(dst)
        }
        Slot::Object(src) => {
            let dst = arena.alloc(ObjectData::new())?;
            // SAFETY: as above.
            let (src, dst_ref) = unsafe { (src.as_ref(), dst.as_ref()) };
            for node in src.iter() {
                let key = copy_str(node.key_ref())?;
                let value = unsafe { copy_at(arena, node.value.get(), depth + 1) }?;
                dst_ref.push(arena, key, value)?;
            }
            Slot::Object(dst)
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(list: &ArrayData) -> Vec<i64> {
        list.iter()
            .map(|n| match n.value.get() {
                Slot::Integer(i) => i,
                _ => panic!("expected integer"),
            })
            .collect()
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let arena = Arena::growable(256);
        let list = ArrayData::new();
        for i in 0..5 {
            list.push(&arena, Slot::Integer(i)).unwrap();
        }
        assert_eq!(list.len(), 5);
        assert_eq!(values(&list), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_unlink_middle_head_and_tail() {
        let arena = Arena::growable(256);
        let list = ArrayData::new();
        for i in 0..5 {
            list.push(&arena, Slot::Integer(i)).unwrap();
        }

        assert!(list.unlink(|i, _| i == 2));
        assert_eq!(values(&list), [0, 1, 3, 4]);
        assert!(list.unlink(|i, _| i == 0));
        assert_eq!(values(&list), [1, 3, 4]);
        assert!(list.unlink(|i, _| i == 2));
        assert_eq!(values(&list), [1, 3]);
        assert!(!list.unlink(|i, _| i == 7));

        // The tail moved back, so appending still lands at the end.
        list.push(&arena, Slot::Integer(9)).unwrap();
        assert_eq!(values(&list), [1, 3, 9]);
    }

    #[test]
    fn test_object_insert_overwrites_in_place() {
        let arena = Arena::growable(256);
        let object = ObjectData::new();
        object.insert(&arena, StrRef::borrowed("a"), Slot::Integer(1)).unwrap();
        object.insert(&arena, StrRef::borrowed("b"), Slot::Integer(2)).unwrap();
        let used = arena.used();

        object.insert(&arena, StrRef::borrowed("a"), Slot::Integer(3)).unwrap();

        assert_eq!(arena.used(), used);
        assert_eq!(object.len(), 2);
        let keys: Vec<&str> = object.iter().map(|n| n.key()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert!(matches!(object.find("a").unwrap().value.get(), Slot::Integer(3)));
    }

    #[test]
    fn test_raw_inline_limit() {
        assert!(RawText::inline("1234567890123456789012").is_some());
        assert!(RawText::inline("12345678901234567890123").is_none());
    }

    #[test]
    fn test_deep_copy_duplicates_owned_strings() {
        let source = Arena::growable(256);
        let target = Arena::growable(256);

        let list = source.alloc(ArrayData::new()).unwrap();
        let list_ref = unsafe { list.as_ref() };
        list_ref
            .push(&source, Slot::String(StrRef::copy(&source, "owned").unwrap()))
            .unwrap();
        list_ref
            .push(&source, Slot::String(StrRef::borrowed("static")))
            .unwrap();

        let copy = unsafe { deep_copy(&target, Slot::Array(list)) }.unwrap();
        let Slot::Array(copy) = copy else {
            panic!("expected array");
        };
        let copy = unsafe { copy.as_ref() };
        let modes: Vec<StringMode> = copy
            .iter()
            .map(|n| match n.value.get() {
                Slot::String(s) => s.mode(),
                _ => panic!("expected string"),
            })
            .collect();
        assert_eq!(modes, [StringMode::Owned, StringMode::Borrowed]);
        assert!(target.used() > 0);
    }
}
