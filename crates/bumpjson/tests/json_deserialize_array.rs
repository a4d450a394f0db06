//! Decoding arrays from JSON text.

mod common;

use bumpjson::{
    DecodeOptions, Document, JsonError, Kind, deserialize_json, deserialize_json_array,
    deserialize_json_with, reader::IoReader, reader::SliceReader,
};
use common::parse;

fn error(json: &str) -> JsonError {
    let mut doc = Document::new();
    deserialize_json(&mut doc, json).expect_err("input should be rejected")
}

#[test]
fn test_empty_array() {
    let doc = parse("[]");
    assert_eq!(doc.root().kind(), Kind::Array);
    assert_eq!(doc.size(), 0);
}

#[test]
fn test_mixed_elements() {
    let doc = parse(r#"[1, -2, 3.5, true, false, null, "s", 'q', word]"#);
    assert_eq!(doc.size(), 9);
    assert_eq!(doc.get(0), 1);
    assert_eq!(doc.get(1), -2);
    assert_eq!(doc.get(2), 3.5);
    assert_eq!(doc.get(3), true);
    assert_eq!(doc.get(4), false);
    assert!(doc.get(5).is_null());
    assert_eq!(doc.get(6), "s");
    assert_eq!(doc.get(7), "q");
    assert_eq!(doc.get(8), "word");
}

#[test]
fn test_out_of_range_index() {
    let doc = parse("[1,2]");
    let missing = doc.get(2);
    assert!(!missing.is_valid());
    assert_eq!(missing.size(), 0);
    assert!(!doc.get(usize::MAX).is_valid());
}

#[test]
fn test_nested_arrays() {
    let doc = parse("[[1,2],[3,[4]]]");
    assert_eq!(doc.get(1).get(1).get(0), 4);
    assert_eq!(doc.get(0).size(), 2);
}

#[test]
fn test_structural_errors() {
    assert_eq!(error("[1,]"), JsonError::InvalidInput);
    assert_eq!(error("[,1]"), JsonError::InvalidInput);
    assert_eq!(error("[1 2]"), JsonError::ClosingBracketExpected);
    assert_eq!(error("[1"), JsonError::ClosingBracketExpected);
    assert_eq!(error("[1,"), JsonError::UnexpectedEnd);
    assert_eq!(error("["), JsonError::UnexpectedEnd);
    assert_eq!(error("[\"abc"), JsonError::IncompleteInput);
    assert_eq!(error("[1}"), JsonError::ClosingBracketExpected);
}

#[test]
fn test_array_entry_point() {
    let mut doc = Document::new();
    deserialize_json_array(&mut doc, "[1]").unwrap();
    assert_eq!(doc.size(), 1);
    assert_eq!(
        deserialize_json_array(&mut doc, r#"{"a":1}"#),
        Err(JsonError::OpeningBracketExpected)
    );
}

#[test]
fn test_nesting_limit_is_configurable() {
    let mut doc = Document::new();
    let input = "[".repeat(20) + &"]".repeat(20);

    assert_eq!(error(&input), JsonError::TooDeep);

    let options = DecodeOptions::default().with_nesting_limit(20);
    deserialize_json_with(&mut doc, SliceReader::new(input.as_bytes()), options).unwrap();
    assert_eq!(doc.size(), 1);
}

#[test]
fn test_reader_stops_after_root() {
    let mut doc = Document::new();
    let mut reader = SliceReader::new(b"{}123");
    deserialize_json_with(&mut doc, &mut reader, DecodeOptions::default()).unwrap();
    assert_eq!(reader.remaining(), b"123");

    let mut reader = SliceReader::new(b"[1] [2]");
    deserialize_json_with(&mut doc, &mut reader, DecodeOptions::default()).unwrap();
    assert_eq!(doc.get(0), 1);
    deserialize_json_with(&mut doc, &mut reader, DecodeOptions::default()).unwrap();
    assert_eq!(doc.get(0), 2);
}

#[test]
fn test_io_reader_leaves_rest_of_stream() {
    use std::io::Read;

    let mut doc = Document::new();
    let mut reader = IoReader::new(&b"{}123"[..]);
    deserialize_json_with(&mut doc, &mut reader, DecodeOptions::default()).unwrap();
    assert_eq!(doc.size(), 0);
    assert_eq!(doc.root().kind(), Kind::Object);

    let mut rest = String::new();
    reader.into_inner().read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "123");
}
