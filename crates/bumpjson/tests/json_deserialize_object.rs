//! Decoding objects from JSON text.

mod common;

use bumpjson::{Document, JsonError, Kind, deserialize_json, deserialize_json_object};
use common::parse;

fn error(json: &str) -> JsonError {
    let mut doc = Document::new();
    deserialize_json(&mut doc, json).expect_err("input should be rejected")
}

#[test]
fn test_empty_object() {
    let doc = parse("{}");
    assert_eq!(doc.root().kind(), Kind::Object);
    assert_eq!(doc.size(), 0);
}

#[test]
fn test_quoted_keys_and_values() {
    let doc = parse(r#"{"key1":"value1","key2":'value2'}"#);
    assert_eq!(doc.size(), 2);
    assert_eq!(doc.get("key1"), "value1");
    assert_eq!(doc.get("key2"), "value2");
}

#[test]
fn test_bareword_key_and_value() {
    let doc = parse("{key:value}");
    assert_eq!(doc.size(), 1);
    let (key, value) = doc.as_object().iter().next().unwrap();
    assert_eq!(key, "key");
    assert_eq!(value.kind(), Kind::Raw);
    assert_eq!(value.as_str(), Some("value"));
    assert_eq!(value.as_i64(), 0);
    assert!(!value.is_null());
}

#[test]
fn test_literal_barewords_as_keys() {
    let doc = parse("{null:1, true:2, 42:3}");
    assert_eq!(doc.get("null"), 1);
    assert_eq!(doc.get("true"), 2);
    assert_eq!(doc.get("42"), 3);
}

#[test]
fn test_whitespace_and_comments_everywhere() {
    let doc = parse(
        "  /* head */ { // line\n \"a\" /*k*/ : /*v*/ 1 , // after comma\n b : [ ] } ",
    );
    assert_eq!(doc.get("a"), 1);
    assert_eq!(doc.get("b").size(), 0);
    assert_eq!(doc.get("b").kind(), Kind::Array);
}

#[test]
fn test_nested_values() {
    let doc = parse(r#"{"ab":{"c":[1,{"d":"e"}]},"f":-2.5}"#);
    assert_eq!(doc.get("ab").get("c").get(1).get("d"), "e");
    assert_eq!(doc.get("f").as_f64(), -2.5);
}

#[test]
fn test_duplicate_keys_keep_last_value() {
    let doc = parse(r#"{"a":1,"b":2,"a":3}"#);
    assert_eq!(doc.size(), 2);
    assert_eq!(doc.get("a"), 3);
    let keys: Vec<&str> = doc.as_object().iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["a", "b"]);
}

#[test]
fn test_escaped_keys() {
    let doc = parse(r#"{"a\"b":1,"tab\there":2}"#);
    assert_eq!(doc.get("a\"b"), 1);
    assert_eq!(doc.get("tab\there"), 2);
}

#[test]
fn test_dangling_comma() {
    assert_eq!(error(r#"{"key":"value",}"#), JsonError::InvalidInput);
}

#[test]
fn test_unterminated_object() {
    assert_eq!(error(r#"{"hello":"world""#), JsonError::ClosingBraceExpected);
    assert_eq!(error("{a:1"), JsonError::ClosingBraceExpected);
}

#[test]
fn test_missing_colon() {
    assert_eq!(error(r#"{"hello" "world"}"#), JsonError::ColonExpected);
    assert_eq!(error(r#"{"hello""#), JsonError::ColonExpected);
}

#[test]
fn test_missing_value() {
    assert_eq!(error(r#"{"hello":}"#), JsonError::InvalidInput);
    assert_eq!(error(r#"{"hello":"#), JsonError::UnexpectedEnd);
}

#[test]
fn test_invalid_key() {
    assert_eq!(error("{[]:1}"), JsonError::InvalidInput);
    assert_eq!(error("{,}"), JsonError::InvalidInput);
}

#[test]
fn test_object_entry_point() {
    let mut doc = Document::new();
    deserialize_json_object(&mut doc, "{a:1}").unwrap();
    assert_eq!(doc.get("a"), 1);
    assert_eq!(
        deserialize_json_object(&mut doc, "1"),
        Err(JsonError::OpeningBraceExpected)
    );
    assert_eq!(
        deserialize_json_object(&mut doc, ""),
        Err(JsonError::OpeningBraceExpected)
    );
}

#[test]
fn test_nesting_limit() {
    let deep = "{a:".repeat(10) + "1" + &"}".repeat(10);
    let too_deep = "{a:".repeat(11) + "1" + &"}".repeat(11);
    parse(&deep);
    assert_eq!(error(&too_deep), JsonError::TooDeep);
}
