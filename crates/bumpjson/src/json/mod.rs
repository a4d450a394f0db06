//! JSON input and output.
//!
//! The decoder is lenient (comments, single quotes, barewords); the encoder
//! always writes strict JSON apart from raw barewords, which are written back
//! verbatim.

mod decoder;
mod encoder;

pub(crate) use encoder::write_fmt;
pub use encoder::{
    measure_json, measure_json_pretty, serialize_json, serialize_json_pretty, to_json_string,
    to_json_string_pretty,
};

use bumpjson_log::debug;
use bumpjson_mem::{Arena, DEFAULT_CHUNK_SIZE};

use crate::builder::{ArenaStringBuilder, CountingStringBuilder};
use crate::document::Document;
use crate::error::JsonError;
use crate::options::DecodeOptions;
use crate::reader::{Reader, SliceReader};

use decoder::{Expect, JsonDecoder};

/// Replaces the content of `doc` with the JSON value in `input`.
///
/// Decoding stops right after the root value; anything that follows is
/// ignored. On error the document is left cleared, holding no root.
///
/// ```
/// use bumpjson::{Document, JsonError, deserialize_json};
///
/// let mut doc = Document::new();
/// deserialize_json(&mut doc, "[1, 'two', three] trailing").unwrap();
/// assert_eq!(doc.get(1), "two");
/// assert_eq!(doc.get(2), "three");
///
/// assert_eq!(
///     deserialize_json(&mut doc, r#"{"key":"value",}"#),
///     Err(JsonError::InvalidInput)
/// );
/// ```
pub fn deserialize_json(doc: &mut Document, input: impl AsRef<[u8]>) -> Result<(), JsonError> {
    deserialize(
        doc,
        SliceReader::new(input.as_ref()),
        DecodeOptions::default(),
        Expect::Any,
    )
}

/// Like [`deserialize_json`], reading from any [`Reader`].
///
/// The reader is left right after the root value.
pub fn deserialize_json_with(
    doc: &mut Document,
    reader: impl Reader,
    options: DecodeOptions,
) -> Result<(), JsonError> {
    deserialize(doc, reader, options, Expect::Any)
}

/// Like [`deserialize_json`], but the root must be an array.
///
/// Fails with [`JsonError::OpeningBracketExpected`] otherwise.
pub fn deserialize_json_array(
    doc: &mut Document,
    input: impl AsRef<[u8]>,
) -> Result<(), JsonError> {
    deserialize(
        doc,
        SliceReader::new(input.as_ref()),
        DecodeOptions::default(),
        Expect::Array,
    )
}

/// Like [`deserialize_json`], but the root must be an object.
///
/// Fails with [`JsonError::OpeningBraceExpected`] otherwise.
pub fn deserialize_json_object(
    doc: &mut Document,
    input: impl AsRef<[u8]>,
) -> Result<(), JsonError> {
    deserialize(
        doc,
        SliceReader::new(input.as_ref()),
        DecodeOptions::default(),
        Expect::Object,
    )
}

fn deserialize(
    doc: &mut Document,
    reader: impl Reader,
    options: DecodeOptions,
    expect: Expect,
) -> Result<(), JsonError> {
    doc.clear();
    let (arena, root) = doc.parts();
    let mut decoder = JsonDecoder::new(
        arena,
        reader,
        ArenaStringBuilder::new(arena),
        options.nesting_limit,
    );

    match decoder.parse_root(expect) {
        Ok(slot) => {
            root.set(slot);
            Ok(())
        }
        Err(err) => {
            debug!("json decoding failed: {err} ({} bytes used)", arena.used());
            Err(err)
        }
    }
}

/// Decodes `reader` without keeping any string and returns the arena bytes
/// a document would need to hold the result.
pub(crate) fn capacity(reader: impl Reader, options: DecodeOptions) -> Result<usize, JsonError> {
    let arena = Arena::growable(DEFAULT_CHUNK_SIZE);
    let mut strings = CountingStringBuilder::new();
    JsonDecoder::new(&arena, reader, &mut strings, options.nesting_limit)
        .parse_root(Expect::Any)?;
    Ok(arena.used() + strings.counted())
}
