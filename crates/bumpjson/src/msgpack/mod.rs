//! MsgPack input.

mod decoder;

use bumpjson_log::debug;
use bumpjson_mem::{Arena, DEFAULT_CHUNK_SIZE};

use crate::builder::{ArenaStringBuilder, CountingStringBuilder};
use crate::document::Document;
use crate::error::MsgPackError;
use crate::options::DecodeOptions;
use crate::reader::{Reader, SliceReader};

use decoder::MsgPackDecoder;

/// Replaces the content of `doc` with the MsgPack value in `input`.
///
/// Bytes after the root value are ignored. On error the document is left
/// cleared, holding no root.
///
/// ```
/// use bumpjson::{Document, deserialize_msgpack};
///
/// let mut doc = Document::new();
/// deserialize_msgpack(&mut doc, b"\x82\xa3one\x01\xa3two\x02").unwrap();
/// assert_eq!(doc.get("one"), 1);
/// assert_eq!(doc.get("two"), 2);
/// ```
pub fn deserialize_msgpack(
    doc: &mut Document,
    input: impl AsRef<[u8]>,
) -> Result<(), MsgPackError> {
    deserialize_msgpack_with(doc, SliceReader::new(input.as_ref()), DecodeOptions::default())
}

/// Like [`deserialize_msgpack`], reading from any [`Reader`].
pub fn deserialize_msgpack_with(
    doc: &mut Document,
    reader: impl Reader,
    options: DecodeOptions,
) -> Result<(), MsgPackError> {
    doc.clear();
    let (arena, root) = doc.parts();
    let mut decoder = MsgPackDecoder::new(
        arena,
        reader,
        ArenaStringBuilder::new(arena),
        options.nesting_limit,
    );

    match decoder.parse_value() {
        Ok(slot) => {
            root.set(slot);
            Ok(())
        }
        Err(err) => {
            debug!("msgpack decoding failed: {err} ({} bytes used)", arena.used());
            Err(err)
        }
    }
}

/// Decodes `reader` without keeping any string and returns the arena bytes
/// a document would need to hold the result.
pub(crate) fn capacity(
    reader: impl Reader,
    options: DecodeOptions,
) -> Result<usize, MsgPackError> {
    let arena = Arena::growable(DEFAULT_CHUNK_SIZE);
    let mut strings = CountingStringBuilder::new();
    MsgPackDecoder::new(&arena, reader, &mut strings, options.nesting_limit).parse_value()?;
    Ok(arena.used() + strings.counted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Kind;

    #[test]
    fn test_strings_of_every_width() {
        let mut doc = Document::new();
        deserialize_msgpack(&mut doc, b"\xa5hello").unwrap();
        assert_eq!(doc.root(), "hello");
        deserialize_msgpack(&mut doc, b"\xd9\x05hello").unwrap();
        assert_eq!(doc.root(), "hello");
        deserialize_msgpack(&mut doc, b"\xda\x00\x05hello").unwrap();
        assert_eq!(doc.root(), "hello");
        deserialize_msgpack(&mut doc, b"\xdb\x00\x00\x00\x05hello").unwrap();
        assert_eq!(doc.root(), "hello");
        deserialize_msgpack(&mut doc, b"\xa0").unwrap();
        assert_eq!(doc.root(), "");
    }

    #[test]
    fn test_arrays() {
        let mut doc = Document::new();
        deserialize_msgpack(&mut doc, b"\x93\x01\xa1a\xc3").unwrap();
        assert_eq!(doc.to_string(), r#"[1,"a",true]"#);

        deserialize_msgpack(&mut doc, b"\xdc\x00\x02\x01\x02").unwrap();
        assert_eq!(doc.to_string(), "[1,2]");

        deserialize_msgpack(&mut doc, b"\xdd\x00\x00\x00\x01\xc0").unwrap();
        assert_eq!(doc.to_string(), "[null]");
    }

    #[test]
    fn test_failure_leaves_document_empty() {
        let mut doc = Document::new();
        deserialize_msgpack(&mut doc, b"\x91\x01").unwrap();
        assert_eq!(
            deserialize_msgpack(&mut doc, b"\x92\x01"),
            Err(MsgPackError::IncompleteInput)
        );
        assert_eq!(doc.root().kind(), Kind::Undefined);
    }

    #[test]
    fn test_custom_nesting_limit() {
        let mut doc = Document::new();
        let options = DecodeOptions::default().with_nesting_limit(1);
        assert_eq!(
            deserialize_msgpack_with(&mut doc, SliceReader::new(b"\x91\x90"), options),
            Err(MsgPackError::TooDeep)
        );
    }
}
