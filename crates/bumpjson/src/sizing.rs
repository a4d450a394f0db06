//! Capacity formulas for pre-sizing fixed documents.
//!
//! Each container costs one header plus one node per element; strings cost
//! their bytes plus a terminator. Every allocation is rounded up to the arena
//! alignment, so the sums below are exact rather than estimates.
//!
//! ```
//! use bumpjson::{Document, deserialize_json, sizing::array_size};
//!
//! let mut doc = Document::fixed(array_size(2));
//! deserialize_json(&mut doc, "[1,2]").unwrap();
//! assert_eq!(doc.memory_usage(), array_size(2));
//!
//! // One more element no longer fits.
//! assert!(deserialize_json(&mut doc, "[1,2,3]").is_err());
//! ```
//!
//! Strings that need an arena copy (quoted strings, object keys, barewords
//! read back as text or longer than an inline slot) add [`string_size`]
//! each. Numbers, booleans and `null` written as barewords are free.
//!
//! For input at hand, [`json_capacity`] and [`msgpack_capacity`] run the
//! decoder without storing strings and report the total directly:
//!
//! ```
//! use bumpjson::{Document, deserialize_json, sizing::json_capacity};
//!
//! let input = r#"{"sensor":"gps","data":[48.75,2.30]}"#;
//! let needed = json_capacity(input).unwrap();
//!
//! let mut doc = Document::fixed(needed);
//! deserialize_json(&mut doc, input).unwrap();
//! assert_eq!(doc.memory_usage(), needed);
//! ```

use std::mem::size_of;

use bumpjson_mem::DEFAULT_ALIGNMENT;

use crate::error::{JsonError, MsgPackError};
use crate::options::DecodeOptions;
use crate::reader::SliceReader;
use crate::slot::{ArrayData, ArrayNode, ObjectData, ObjectNode};
use crate::{json, msgpack};

const fn align(size: usize) -> usize {
    (size + DEFAULT_ALIGNMENT - 1) & !(DEFAULT_ALIGNMENT - 1)
}

/// Bytes taken by an array of `len` elements (container memory only).
#[must_use]
pub const fn array_size(len: usize) -> usize {
    align(size_of::<ArrayData>()) + len * align(size_of::<ArrayNode>())
}

/// Bytes taken by an object of `len` members, keys excluded.
#[must_use]
pub const fn object_size(len: usize) -> usize {
    align(size_of::<ObjectData>()) + len * align(size_of::<ObjectNode>())
}

/// Bytes taken by an arena copy of a string of `len` bytes.
#[must_use]
pub const fn string_size(len: usize) -> usize {
    align(len + 1)
}

/// Capacity a fixed document needs to decode the JSON in `input`.
///
/// Exact unless an object repeats a key, in which case the result is
/// larger than needed. Fails with the error decoding would report, except
/// that strings are not checked for UTF-8.
pub fn json_capacity(input: impl AsRef<[u8]>) -> Result<usize, JsonError> {
    json::capacity(SliceReader::new(input.as_ref()), DecodeOptions::default())
}

/// Capacity a fixed document needs to decode the MsgPack in `input`.
///
/// Same guarantees as [`json_capacity`].
pub fn msgpack_capacity(input: impl AsRef<[u8]>) -> Result<usize, MsgPackError> {
    msgpack::capacity(SliceReader::new(input.as_ref()), DecodeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, deserialize_json, deserialize_msgpack};

    #[test]
    fn test_sizes_are_aligned() {
        for n in 0..4 {
            assert_eq!(array_size(n) % DEFAULT_ALIGNMENT, 0);
            assert_eq!(object_size(n) % DEFAULT_ALIGNMENT, 0);
        }
        assert_eq!(string_size(0), 8);
        assert_eq!(string_size(7), 8);
        assert_eq!(string_size(8), 16);
    }

    #[test]
    fn test_sizes_grow_linearly() {
        assert_eq!(
            array_size(3) - array_size(2),
            array_size(2) - array_size(1)
        );
        assert!(object_size(1) > object_size(0));
    }

    #[test]
    fn test_json_capacity_is_exact() {
        for input in [
            "null",
            "[]",
            "[1,2,3]",
            r#"{"a":"text","b":[true,null,1.5],"c":{}}"#,
            "{key: bareword, long: 1234567890123456789012345}",
            r#"['single', "", "\u00e9\ud83d\ude00"]"#,
        ] {
            let needed = json_capacity(input).unwrap();
            let mut doc = Document::fixed(needed);
            deserialize_json(&mut doc, input).unwrap();
            assert_eq!(doc.memory_usage(), needed, "{input}");
        }
    }

    #[test]
    fn test_repeated_keys_overcount() {
        let input = r#"{"a":1,"a":2}"#;
        let needed = json_capacity(input).unwrap();
        assert_eq!(needed, object_size(2) + 2 * string_size(1));

        let mut doc = Document::fixed(needed);
        deserialize_json(&mut doc, input).unwrap();
        assert!(doc.memory_usage() < needed);
    }

    #[test]
    fn test_capacity_reports_decode_errors() {
        assert_eq!(json_capacity("[1,"), Err(JsonError::UnexpectedEnd));
        assert_eq!(json_capacity("{\"a\" 1}"), Err(JsonError::ColonExpected));
        assert_eq!(msgpack_capacity(b"\x92\x01"), Err(MsgPackError::IncompleteInput));
    }

    #[test]
    fn test_msgpack_capacity_is_exact() {
        let input = b"\x82\xa3one\x01\xa4list\x92\xa1x\xc3";
        let needed = msgpack_capacity(input).unwrap();
        assert_eq!(
            needed,
            object_size(2) + string_size(3) + string_size(4) + array_size(2) + string_size(1)
        );

        let mut doc = Document::fixed(needed);
        deserialize_msgpack(&mut doc, input).unwrap();
        assert_eq!(doc.memory_usage(), needed);
    }
}
