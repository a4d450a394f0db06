//! Decoder configuration.

/// Default maximum container depth accepted by the decoders.
pub const DEFAULT_NESTING_LIMIT: u8 = 10;

/// Deepest container level walked by the encoder, comparisons and deep
/// copies. No decoder produces anything deeper; only a container aliased
/// into itself gets there.
pub(crate) const TRAVERSAL_LIMIT: usize = u8::MAX as usize + 1;

/// Options shared by the JSON and MessagePack decoders.
///
/// ```
/// use bumpjson::DecodeOptions;
///
/// let options = DecodeOptions::default().with_nesting_limit(3);
/// assert_eq!(options.nesting_limit, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum number of nested arrays/objects. With a limit of `0` only a
    /// scalar root is accepted.
    pub nesting_limit: u8,
}

impl DecodeOptions {
    /// Returns a copy with a different nesting limit.
    #[must_use]
    pub const fn with_nesting_limit(mut self, limit: u8) -> Self {
        self.nesting_limit = limit;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            nesting_limit: DEFAULT_NESTING_LIMIT,
        }
    }
}
