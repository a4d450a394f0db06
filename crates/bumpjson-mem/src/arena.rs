//! Bump-pointer arena with fixed and growable capacity policies.
//!
//! The arena hands out raw, aligned byte ranges from one or more heap blocks
//! ("chunks"). Memory is never freed per allocation: the only way to reclaim
//! it is [`Arena::clear`], which rewinds every chunk at once.
//!
//! - **Stable addresses**: chunks are never moved or resized, so every
//!   pointer returned stays valid until the arena is cleared or dropped.
//! - **Deterministic failure**: a [`ArenaPolicy::Fixed`] arena owns exactly
//!   one block and refuses any request that does not fit. Refusal is a normal
//!   outcome reported as [`ArenaAllocError`], never a panic.
//! - **Geometric growth**: a [`ArenaPolicy::Growable`] arena chains a new,
//!   larger chunk when the current one is exhausted. It only fails when the
//!   host allocator does.
//!
//! The arena is single-threaded: allocation goes through `&self` with
//! `Cell`-based bookkeeping so that many arena-scoped handles may allocate
//! while they share the arena.
//!
//! # Examples
//!
//! ```
//! use bumpjson_mem::arena::Arena;
//!
//! let arena = Arena::fixed(64).unwrap();
//! let value = arena.alloc(42u64).unwrap();
//! unsafe {
//!     assert_eq!(*value.as_ptr(), 42);
//! }
//! assert_eq!(arena.used(), 8);
//!
//! // A request larger than what is left fails without side effects.
//! assert!(arena.allocate(128, 8).is_err());
//! assert_eq!(arena.used(), 8);
//! ```

use std::alloc::{self, Layout};
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

use bumpjson_log::{debug, trace};

/// Error returned when the arena cannot satisfy an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("arena allocation failed: out of memory")]
pub struct ArenaAllocError;

/// Minimum alignment of every allocation (8 bytes).
///
/// Every allocation size is also rounded up to a multiple of this value, which
/// keeps usage accounting independent of allocation order.
pub const DEFAULT_ALIGNMENT: usize = 8;

/// First chunk size used by [`Arena::growable`] callers that have no better
/// estimate.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Smallest chunk a growable arena will request from the host.
const MIN_CHUNK_SIZE: usize = 64;

/// Largest chunk produced by geometric growth (requests larger than this
/// still get a chunk of their own size).
const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// How an arena obtains memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaPolicy {
    /// One block of exactly `capacity` bytes, allocated up front.
    Fixed {
        /// Total bytes available for allocations.
        capacity: usize,
    },
    /// A chain of blocks, the first one `chunk_size` bytes, each new block
    /// twice the size of the previous one.
    Growable {
        /// Size of the first chunk.
        chunk_size: usize,
    },
}

/// Snapshot of an arena's memory accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Bytes handed out since construction or the last clear.
    pub used: usize,
    /// Number of chunks currently owned.
    pub chunk_count: usize,
    /// Sum of the capacities of all owned chunks.
    pub total_capacity: usize,
}

/// Rounds `value` up to the next multiple of `align` (a power of two).
#[inline]
const fn round_up(value: usize, align: usize) -> Option<usize> {
    match value.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}

/// One heap block with a non-atomic bump offset.
///
/// # Safety
///
/// - `start` points to `capacity` bytes obtained from the global allocator
///   with `DEFAULT_ALIGNMENT`, released only in `Drop`.
/// - `offset` never exceeds `capacity`.
struct Chunk {
    start: NonNull<u8>,
    offset: Cell<usize>,
    capacity: usize,
}

impl Chunk {
    fn new(size: usize) -> Result<Self, ArenaAllocError> {
        debug_assert!(size > 0);
        let layout = Layout::from_size_align(size, DEFAULT_ALIGNMENT)
            .map_err(|_| ArenaAllocError)?;

        // SAFETY: `layout` has a non-zero size.
        let start = unsafe { alloc::alloc(layout) };
        let start = NonNull::new(start).ok_or(ArenaAllocError)?;

        Ok(Chunk {
            start,
            offset: Cell::new(0),
            capacity: size,
        })
    }

    /// Offset at which the next allocation with `align` would begin.
    #[inline]
    fn aligned_offset(&self, align: usize) -> Option<usize> {
        let base = self.start.as_ptr().addr();
        let aligned = round_up(base + self.offset.get(), align)?;
        Some(aligned - base)
    }

    /// Bumps the offset; returns the block address and the bytes consumed
    /// (alignment padding included).
    #[inline]
    fn try_alloc(&self, size: usize, align: usize) -> Option<(NonNull<u8>, usize)> {
        let begin = self.aligned_offset(align)?;
        let end = begin.checked_add(round_up(size, align)?)?;
        if end > self.capacity {
            return None;
        }

        let consumed = end - self.offset.get();
        self.offset.set(end);

        // SAFETY: `begin <= end <= capacity`, so the pointer stays within (or
        // one past) the block.
        let ptr = unsafe { self.start.add(begin) };
        Some((ptr, consumed))
    }

    #[inline]
    fn at(&self, offset: usize) -> *mut u8 {
        debug_assert!(offset <= self.capacity);
        // SAFETY: `offset` is within the block (checked by callers).
        unsafe { self.start.as_ptr().add(offset) }
    }

    fn remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: same layout as in `Chunk::new`, which already validated it.
        unsafe {
            let layout =
                Layout::from_size_align_unchecked(self.capacity, DEFAULT_ALIGNMENT);
            alloc::dealloc(self.start.as_ptr(), layout);
        }
    }
}

/// Single-threaded bump allocator with a selectable capacity policy.
///
/// # Examples
///
/// ```
/// use bumpjson_mem::arena::Arena;
///
/// let arena = Arena::growable(64);
///
/// // Far more than the first chunk: the arena chains new chunks.
/// let values: Vec<_> = (0..100u64).map(|i| arena.alloc(i).unwrap()).collect();
/// for (i, value) in values.iter().enumerate() {
///     unsafe { assert_eq!(*value.as_ptr(), i as u64) };
/// }
/// assert!(arena.stats().chunk_count > 1);
/// ```
pub struct Arena {
    chunks: RefCell<Vec<Chunk>>,
    current: Cell<usize>,
    used: Cell<usize>,
    policy: ArenaPolicy,
}

// SAFETY: the arena exclusively owns its chunks; nothing inside it is shared
// with other arenas or threads, so moving it to another thread is sound. It
// stays `!Sync` through its `Cell`s.
unsafe impl Send for Arena {}

impl Arena {
    /// Creates an arena owning a single block of `capacity` bytes.
    ///
    /// A zero capacity is valid and yields an arena that refuses every
    /// non-empty allocation.
    pub fn fixed(capacity: usize) -> Result<Self, ArenaAllocError> {
        let mut chunks = Vec::with_capacity(1);
        if capacity > 0 {
            chunks.push(Chunk::new(capacity)?);
        }
        Ok(Arena {
            chunks: RefCell::new(chunks),
            current: Cell::new(0),
            used: Cell::new(0),
            policy: ArenaPolicy::Fixed { capacity },
        })
    }

    /// Creates a growable arena. No memory is requested until the first
    /// allocation.
    #[must_use]
    pub fn growable(chunk_size: usize) -> Self {
        Arena {
            chunks: RefCell::new(Vec::new()),
            current: Cell::new(0),
            used: Cell::new(0),
            policy: ArenaPolicy::Growable {
                chunk_size: chunk_size.max(MIN_CHUNK_SIZE),
            },
        }
    }

    /// Creates an arena for the given policy.
    pub fn with_policy(policy: ArenaPolicy) -> Result<Self, ArenaAllocError> {
        match policy {
            ArenaPolicy::Fixed { capacity } => Arena::fixed(capacity),
            ArenaPolicy::Growable { chunk_size } => Ok(Arena::growable(chunk_size)),
        }
    }

    /// Returns the policy this arena was built with.
    #[must_use]
    pub fn policy(&self) -> ArenaPolicy {
        self.policy
    }

    /// Bytes handed out since construction or the last [`clear`](Self::clear).
    #[must_use]
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Total capacity of a fixed arena; `None` for growable arenas.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match self.policy {
            ArenaPolicy::Fixed { capacity } => Some(capacity),
            ArenaPolicy::Growable { .. } => None,
        }
    }

    /// Returns allocation statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let chunks = self.chunks.borrow();
        ArenaStats {
            used: self.used.get(),
            chunk_count: chunks.len(),
            total_capacity: chunks.iter().map(|c| c.capacity).sum(),
        }
    }

    /// Allocates `size` bytes aligned to at least `align`.
    ///
    /// `align` must be a power of two; it is raised to [`DEFAULT_ALIGNMENT`]
    /// when smaller. On failure the arena is left exactly as it was.
    pub fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaAllocError> {
        if !align.is_power_of_two() {
            return Err(ArenaAllocError);
        }
        let align = align.max(DEFAULT_ALIGNMENT);

        {
            let chunks = self.chunks.borrow();
            let mut index = self.current.get();
            while let Some(chunk) = chunks.get(index) {
                if let Some((ptr, consumed)) = chunk.try_alloc(size, align) {
                    self.current.set(index);
                    self.used.set(self.used.get() + consumed);
                    return Ok(ptr);
                }
                index += 1;
            }
        }

        match self.policy {
            ArenaPolicy::Fixed { capacity } => {
                trace!(
                    "fixed arena refused {size} bytes ({} of {capacity} used)",
                    self.used.get()
                );
                Err(ArenaAllocError)
            }
            ArenaPolicy::Growable { .. } => {
                // Chunk bases are only `DEFAULT_ALIGNMENT`-aligned, so padding
                // can take up to `align - DEFAULT_ALIGNMENT` bytes.
                let needed = round_up(size, align)
                    .and_then(|rounded| rounded.checked_add(align - DEFAULT_ALIGNMENT))
                    .ok_or(ArenaAllocError)?;
                let index = self.grow(needed)?;
                let chunks = self.chunks.borrow();
                let (ptr, consumed) = chunks[index]
                    .try_alloc(size, align)
                    .ok_or(ArenaAllocError)?;
                self.used.set(self.used.get() + consumed);
                Ok(ptr)
            }
        }
    }

    /// Moves a value into the arena.
    ///
    /// The value's destructor will never run: the arena only releases raw
    /// memory. Use it for plain data.
    pub fn alloc<T>(&self, value: T) -> Result<NonNull<T>, ArenaAllocError> {
        debug_assert!(
            !std::mem::needs_drop::<T>(),
            "arena values are never dropped"
        );
        let ptr = self
            .allocate(std::mem::size_of::<T>(), std::mem::align_of::<T>())?
            .cast::<T>();

        // SAFETY: freshly allocated, properly aligned and sized for `T`.
        unsafe { ptr.as_ptr().write(value) };
        Ok(ptr)
    }

    /// Copies `bytes` into the arena followed by a NUL terminator.
    ///
    /// Returns the address of the first byte; the copy is `bytes.len()` bytes
    /// long (terminator excluded).
    pub fn allocate_string(&self, bytes: &[u8]) -> Result<NonNull<u8>, ArenaAllocError> {
        let len = bytes.len();
        let ptr = self.allocate(len.checked_add(1).ok_or(ArenaAllocError)?, 1)?;

        // SAFETY: `ptr` is valid for `len + 1` bytes and cannot overlap
        // `bytes`, which lives outside the unallocated tail of the arena.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), len);
            ptr.as_ptr().add(len).write(0);
        }
        Ok(ptr)
    }

    /// Starts staging a string of unknown length directly at the arena tail.
    ///
    /// See [`StagedString`].
    #[must_use]
    pub fn stage_string(&self) -> StagedString<'_> {
        StagedString {
            arena: self,
            location: None,
            len: 0,
            failed: false,
        }
    }

    /// Rewinds every chunk, invalidating all addresses handed out so far.
    ///
    /// Growable arenas keep their chunks for reuse, so `used()` drops back to
    /// zero without returning memory to the host.
    pub fn clear(&mut self) {
        let chunks = self.chunks.get_mut();
        for chunk in chunks.iter() {
            chunk.offset.set(0);
        }
        trace!(
            "arena cleared ({} bytes released, {} chunks kept)",
            self.used.get(),
            chunks.len()
        );
        self.current.set(0);
        self.used.set(0);
    }

    /// Appends (or reuses) a chunk able to hold `min_size` bytes and makes it
    /// current. Returns its index.
    #[cold]
    fn grow(&self, min_size: usize) -> Result<usize, ArenaAllocError> {
        let ArenaPolicy::Growable { chunk_size } = self.policy else {
            return Err(ArenaAllocError);
        };

        let mut chunks = self.chunks.borrow_mut();

        // Chunks retained across a clear come first.
        let reusable = (self.current.get() + 1..chunks.len())
            .find(|&i| chunks[i].remaining() >= min_size);
        if let Some(index) = reusable {
            self.current.set(index);
            return Ok(index);
        }

        let next = chunks
            .last()
            .map_or(chunk_size, |c| c.capacity.saturating_mul(2))
            .min(MAX_CHUNK_SIZE)
            .max(min_size);

        let chunk = Chunk::new(next).inspect_err(|_| {
            debug!("host allocator refused a chunk of {next} bytes");
        })?;
        chunks.push(chunk);
        let index = chunks.len() - 1;
        self.current.set(index);

        debug!("arena grew: chunk #{index} of {next} bytes");
        Ok(index)
    }
}

/// A string being built in place at the arena tail.
///
/// Bytes are written into the unallocated space after the bump pointer and
/// only become an allocation on [`commit`](StagedString::commit). This lets a
/// parser copy a string of unknown length exactly once, without a scratch
/// buffer.
///
/// While a string is staged no other allocation may happen on the arena.
/// An interleaved allocation is detected and turns the staged string into a
/// failure instead of corrupting memory.
///
/// In a fixed arena, running out of room marks the string as failed (the
/// remaining pushes are ignored). A growable arena moves the staged bytes to
/// a fresh chunk.
pub struct StagedString<'a> {
    arena: &'a Arena,
    /// `(chunk index, offset)` of the first staged byte.
    location: Option<(usize, usize)>,
    len: usize,
    failed: bool,
}

impl StagedString<'_> {
    /// Appends one byte.
    pub fn push(&mut self, byte: u8) {
        if self.failed {
            return;
        }
        // Room for this byte plus the terminator written on commit.
        let Some(needed) = self.len.checked_add(2) else {
            self.failed = true;
            return;
        };
        let Some((chunk_index, offset)) = self.reserve(needed) else {
            self.failed = true;
            return;
        };

        let chunks = self.arena.chunks.borrow();
        // SAFETY: `reserve` guaranteed `offset + needed <= capacity` and that
        // the range is still past the bump pointer (unallocated).
        unsafe { chunks[chunk_index].at(offset + self.len).write(byte) };
        self.len += 1;
    }

    /// Number of bytes staged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing has been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` once the string can no longer be committed.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Turns the staged bytes into an arena allocation (with terminator).
    ///
    /// Returns the address of the first byte and the string length.
    pub fn commit(self) -> Result<(NonNull<u8>, usize), ArenaAllocError> {
        if self.failed {
            return Err(ArenaAllocError);
        }
        let Some((chunk_index, offset)) = self.location else {
            return Ok((self.arena.allocate_string(&[])?, 0));
        };
        if !self.still_current(chunk_index, offset) {
            return Err(ArenaAllocError);
        }

        let chunks = self.arena.chunks.borrow();
        let chunk = &chunks[chunk_index];
        // SAFETY: `push` reserved `len + 1` bytes from `offset`.
        unsafe { chunk.at(offset + self.len).write(0) };

        let (ptr, consumed) = chunk
            .try_alloc(self.len + 1, DEFAULT_ALIGNMENT)
            .ok_or(ArenaAllocError)?;
        debug_assert_eq!(ptr.as_ptr(), chunk.at(offset));
        self.arena.used.set(self.arena.used.get() + consumed);
        Ok((ptr, self.len))
    }

    /// `true` if the staged range still sits right at the bump pointer of the
    /// current chunk.
    fn still_current(&self, chunk_index: usize, offset: usize) -> bool {
        let chunks = self.arena.chunks.borrow();
        chunk_index == self.arena.current.get()
            && chunks[chunk_index].aligned_offset(DEFAULT_ALIGNMENT) == Some(offset)
    }

    /// Makes sure `needed` bytes are available from the staged start,
    /// relocating the staged bytes if the current place is too small.
    fn reserve(&mut self, needed: usize) -> Option<(usize, usize)> {
        if let Some((chunk_index, offset)) = self.location {
            if !self.still_current(chunk_index, offset) {
                return None;
            }
            let chunks = self.arena.chunks.borrow();
            if offset + needed <= chunks[chunk_index].capacity {
                return Some((chunk_index, offset));
            }
        } else {
            let chunks = self.arena.chunks.borrow();
            let current = self.arena.current.get();
            if let Some(chunk) = chunks.get(current)
                && let Some(offset) = chunk.aligned_offset(DEFAULT_ALIGNMENT)
                && offset + needed <= chunk.capacity
            {
                self.location = Some((current, offset));
                return self.location;
            }
        }
        self.relocate(needed)
    }

    #[cold]
    fn relocate(&mut self, needed: usize) -> Option<(usize, usize)> {
        // Leave headroom so a long string does not relocate on every byte.
        let wanted = needed.checked_mul(2)?;
        let index = self.arena.grow(wanted).ok()?;

        let chunks = self.arena.chunks.borrow();
        let target = &chunks[index];
        let offset = target.aligned_offset(DEFAULT_ALIGNMENT)?;
        if offset + needed > target.capacity {
            return None;
        }
        if let Some((old_index, old_offset)) = self.location {
            // SAFETY: both ranges are unallocated tails of two distinct
            // chunks, each at least `len` bytes long.
            unsafe {
                std::ptr::copy_nonoverlapping(
                    chunks[old_index].at(old_offset),
                    target.at(offset),
                    self.len,
                );
            }
        }
        self.location = Some((index, offset));
        self.location
    }
}
