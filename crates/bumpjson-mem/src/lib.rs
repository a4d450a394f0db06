//! Arena memory for `bumpjson` documents.
//!
//! Every node, key and string of a document lives in one [`Arena`]. The
//! arena either owns a single caller-sized block ([`ArenaPolicy::Fixed`]) or
//! chains geometrically growing chunks ([`ArenaPolicy::Growable`]).
//! Individual allocations are never freed; the whole arena is rewound at once
//! with [`Arena::clear`].

pub mod arena;

pub use arena::{
    Arena, ArenaAllocError, ArenaPolicy, ArenaStats, DEFAULT_ALIGNMENT, DEFAULT_CHUNK_SIZE,
    StagedString,
};
