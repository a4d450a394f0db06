//! String capture for the decoders.
//!
//! Decoders never buffer strings themselves: they push bytes into a
//! [`StringBuilder`] and get back a stored string. [`ArenaStringBuilder`]
//! writes the bytes straight to the arena tail, so each string is copied
//! exactly once. [`CountingStringBuilder`] keeps nothing and only adds up
//! what the strings would cost, which is how [`crate::sizing`] measures
//! input before decoding it into a fixed document.

use bumpjson_mem::{Arena, StagedString};

use crate::error::StringError;
use crate::sizing::string_size;
use crate::slot::StrRef;

/// Collects the bytes of one string at a time.
pub trait StringBuilder {
    /// Begins a new string, discarding an unfinished one.
    fn start(&mut self);

    /// Appends one byte to the current string.
    fn append(&mut self, byte: u8);

    /// Completes the current string.
    ///
    /// Fails with [`StringError::InvalidUtf8`] if the bytes are not UTF-8.
    fn finish(&mut self) -> Result<StrRef, StringError>;

    /// Whether finished strings hold the bytes that were appended.
    ///
    /// Decoders only merge repeated object keys when this is `true`.
    fn keeps_text(&self) -> bool {
        true
    }
}

impl<B: StringBuilder + ?Sized> StringBuilder for &mut B {
    fn start(&mut self) {
        (**self).start();
    }

    fn append(&mut self, byte: u8) {
        (**self).append(byte);
    }

    fn finish(&mut self) -> Result<StrRef, StringError> {
        (**self).finish()
    }

    fn keeps_text(&self) -> bool {
        (**self).keeps_text()
    }
}

/// A [`StringBuilder`] staging bytes at the tail of an arena.
///
/// No other allocation may happen on the arena between `start` and
/// `finish`; the arena detects it and `finish` then reports
/// [`StringError::NoMemory`].
pub struct ArenaStringBuilder<'a> {
    arena: &'a Arena,
    staged: Option<StagedString<'a>>,
}

impl<'a> ArenaStringBuilder<'a> {
    /// Creates a builder for `arena`.
    pub fn new(arena: &'a Arena) -> Self {
        ArenaStringBuilder {
            arena,
            staged: None,
        }
    }
}

impl StringBuilder for ArenaStringBuilder<'_> {
    fn start(&mut self) {
        self.staged = Some(self.arena.stage_string());
    }

    fn append(&mut self, byte: u8) {
        self.staged
            .get_or_insert_with(|| self.arena.stage_string())
            .push(byte);
    }

    fn finish(&mut self) -> Result<StrRef, StringError> {
        let staged = self
            .staged
            .take()
            .unwrap_or_else(|| self.arena.stage_string());
        let (ptr, len) = staged.commit()?;

        // SAFETY: `commit` returned `len` initialized bytes owned by the
        // arena, which outlives this builder.
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) };
        std::str::from_utf8(bytes).map_err(|_| StringError::InvalidUtf8)?;

        // SAFETY: validated above; committed arena bytes are never rewritten.
        Ok(unsafe { StrRef::from_arena(ptr, len) })
    }
}

/// A [`StringBuilder`] that stores nothing and counts the arena bytes the
/// strings would take.
///
/// Every finished string reads back as empty, and the bytes are not checked
/// for UTF-8.
///
/// ```
/// use bumpjson::builder::{CountingStringBuilder, StringBuilder};
/// use bumpjson::sizing::string_size;
///
/// let mut builder = CountingStringBuilder::new();
/// builder.start();
/// for &b in b"hello" {
///     builder.append(b);
/// }
/// assert!(builder.finish().unwrap().is_empty());
/// assert_eq!(builder.counted(), string_size(5));
/// ```
#[derive(Debug, Default)]
pub struct CountingStringBuilder {
    len: usize,
    counted: usize,
}

impl CountingStringBuilder {
    /// Creates a builder with nothing counted.
    #[must_use]
    pub fn new() -> Self {
        CountingStringBuilder::default()
    }

    /// Arena bytes taken by every string finished so far.
    #[must_use]
    pub fn counted(&self) -> usize {
        self.counted
    }
}

impl StringBuilder for CountingStringBuilder {
    fn start(&mut self) {
        self.len = 0;
    }

    fn append(&mut self, _byte: u8) {
        self.len += 1;
    }

    fn finish(&mut self) -> Result<StrRef, StringError> {
        self.counted += string_size(self.len);
        self.len = 0;
        Ok(StrRef::borrowed(""))
    }

    fn keeps_text(&self) -> bool {
        false
    }
}
