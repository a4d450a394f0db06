//! JSON text output.
//!
//! A depth-first walk in insertion order. Compact and pretty output differ
//! only in whitespace: pretty mode breaks lines with `\r\n` and indents by
//! two spaces. Containers nested past the traversal limit, which only a
//! container aliased into itself reaches, are written as `null`.

use std::fmt;
use std::io::{self, Write};

use crate::options::TRAVERSAL_LIMIT;
use crate::variant::{VariantRef, View};

const INDENT: &[u8] = b"  ";
const NEWLINE: &[u8] = b"\r\n";

struct JsonWriter<W> {
    out: W,
    written: usize,
    pretty: bool,
    depth: usize,
}

impl<W: Write> JsonWriter<W> {
    fn new(out: W, pretty: bool) -> Self {
        JsonWriter {
            out,
            written: 0,
            pretty,
            depth: 0,
        }
    }

    fn raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    fn break_line(&mut self) -> io::Result<()> {
        if self.pretty {
            self.raw(NEWLINE)?;
            for _ in 0..self.depth {
                self.raw(INDENT)?;
            }
        }
        Ok(())
    }

    fn value(&mut self, view: View<'_>) -> io::Result<()> {
        if matches!(view, View::Array(_) | View::Object(_)) && self.depth == TRAVERSAL_LIMIT {
            return self.raw(b"null");
        }
        match view {
            View::Undefined | View::Null => self.raw(b"null"),
            View::Bool(true) => self.raw(b"true"),
            View::Bool(false) => self.raw(b"false"),
            View::Integer(i) => self.raw(i.to_string().as_bytes()),
            View::Float(f) => self.float(f),
            View::Str(s) => self.string(s),
            View::Raw(raw) => self.raw(raw.text().as_bytes()),
            View::Array(array) => {
                if array.is_empty() {
                    return self.raw(b"[]");
                }
                self.raw(b"[")?;
                self.depth += 1;
                for (i, element) in array.iter().enumerate() {
                    if i > 0 {
                        self.raw(b",")?;
                    }
                    self.break_line()?;
                    self.value(element.view())?;
                }
                self.depth -= 1;
                self.break_line()?;
                self.raw(b"]")
            }
            View::Object(object) => {
                if object.is_empty() {
                    return self.raw(b"{}");
                }
                self.raw(b"{")?;
                self.depth += 1;
                for (i, (key, value)) in object.iter().enumerate() {
                    if i > 0 {
                        self.raw(b",")?;
                    }
                    self.break_line()?;
                    self.string(key)?;
                    let colon: &[u8] = if self.pretty { b": " } else { b":" };
                    self.raw(colon)?;
                    self.value(value.view())?;
                }
                self.depth -= 1;
                self.break_line()?;
                self.raw(b"}")
            }
        }
    }

    /// Keeps a fraction or exponent on every float so that it reads back as
    /// a float; non-finite values have no JSON spelling.
    fn float(&mut self, value: f64) -> io::Result<()> {
        if value.is_finite() {
            self.raw(format!("{value:?}").as_bytes())
        } else {
            self.raw(b"null")
        }
    }

    fn string(&mut self, text: &str) -> io::Result<()> {
        self.raw(b"\"")?;
        let bytes = text.as_bytes();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let escape: &[u8] = match b {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                0x08 => b"\\b",
                0x0c => b"\\f",
                0x00..=0x1f => {
                    self.raw(&bytes[start..i])?;
                    self.raw(format!("\\u{b:04x}").as_bytes())?;
                    start = i + 1;
                    continue;
                }
                _ => continue,
            };
            self.raw(&bytes[start..i])?;
            self.raw(escape)?;
            start = i + 1;
        }
        self.raw(&bytes[start..])?;
        self.raw(b"\"")
    }
}

/// Writes compact JSON; returns the number of bytes written.
///
/// ```
/// use bumpjson::{Document, deserialize_json, serialize_json};
///
/// let mut doc = Document::new();
/// deserialize_json(&mut doc, "{ key : value, list : [1, 2.5] }").unwrap();
///
/// let mut out = Vec::new();
/// let written = serialize_json(&doc, &mut out).unwrap();
/// assert_eq!(out, br#"{"key":value,"list":[1,2.5]}"#);
/// assert_eq!(written, out.len());
/// ```
pub fn serialize_json<'a, W: Write>(source: impl Into<VariantRef<'a>>, out: W) -> io::Result<usize> {
    serialize(source.into(), out, false)
}

/// Writes indented JSON; returns the number of bytes written.
///
/// ```
/// use bumpjson::{Document, deserialize_json, to_json_string_pretty};
///
/// let mut doc = Document::new();
/// deserialize_json(&mut doc, "[4,2]").unwrap();
/// assert_eq!(to_json_string_pretty(&doc), "[\r\n  4,\r\n  2\r\n]");
/// ```
pub fn serialize_json_pretty<'a, W: Write>(
    source: impl Into<VariantRef<'a>>,
    out: W,
) -> io::Result<usize> {
    serialize(source.into(), out, true)
}

/// Compact JSON as a `String`.
#[must_use]
pub fn to_json_string<'a>(source: impl Into<VariantRef<'a>>) -> String {
    source.into().to_string()
}

/// Indented JSON as a `String`.
#[must_use]
pub fn to_json_string_pretty<'a>(source: impl Into<VariantRef<'a>>) -> String {
    let mut out = Vec::new();
    serialize(source.into(), &mut out, true).expect("writing to a Vec cannot fail");
    String::from_utf8(out).expect("the encoder only emits UTF-8")
}

/// Length of the compact JSON, without producing it.
#[must_use]
pub fn measure_json<'a>(source: impl Into<VariantRef<'a>>) -> usize {
    serialize(source.into(), io::sink(), false).expect("io::Sink never fails")
}

/// Length of the indented JSON, without producing it.
#[must_use]
pub fn measure_json_pretty<'a>(source: impl Into<VariantRef<'a>>) -> usize {
    serialize(source.into(), io::sink(), true).expect("io::Sink never fails")
}

fn serialize<W: Write>(source: VariantRef<'_>, out: W, pretty: bool) -> io::Result<usize> {
    let mut writer = JsonWriter::new(out, pretty);
    writer.value(source.view())?;
    writer.out.flush()?;
    Ok(writer.written)
}

/// Adapts a formatter to `io::Write` for `Display`.
struct FmtAdapter<'f, 'g> {
    f: &'f mut fmt::Formatter<'g>,
}

impl Write for FmtAdapter<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = std::str::from_utf8(buf).map_err(io::Error::other)?;
        self.f.write_str(text).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn write_fmt(
    source: VariantRef<'_>,
    f: &mut fmt::Formatter<'_>,
    pretty: bool,
) -> fmt::Result {
    serialize(source, FmtAdapter { f }, pretty)
        .map(|_| ())
        .map_err(|_| fmt::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Value, deserialize_json};

    fn parsed(json: &str) -> Document {
        let mut doc = Document::new();
        deserialize_json(&mut doc, json).unwrap();
        doc
    }

    #[test]
    fn test_compact_scalars() {
        let mut doc = Document::new();
        doc.assign(42).unwrap();
        assert_eq!(to_json_string(&doc), "42");
        doc.assign(-1.5).unwrap();
        assert_eq!(to_json_string(&doc), "-1.5");
        doc.assign(2.0).unwrap();
        assert_eq!(to_json_string(&doc), "2.0");
        doc.assign(true).unwrap();
        assert_eq!(to_json_string(&doc), "true");
        doc.assign(()).unwrap();
        assert_eq!(to_json_string(&doc), "null");
        doc.clear();
        assert_eq!(to_json_string(&doc), "null");
    }

    #[test]
    fn test_non_finite_floats_become_null() {
        let mut doc = Document::new();
        doc.to_array();
        let array = doc.as_array();
        array.append(f64::NAN).unwrap();
        array.append(f64::INFINITY).unwrap();
        assert_eq!(to_json_string(&doc), "[null,null]");
    }

    #[test]
    fn test_string_escapes() {
        let mut doc = Document::new();
        doc.assign("q\"b\\n\nt\tc\u{1}\u{8}\u{c}r\r/").unwrap();
        assert_eq!(
            to_json_string(&doc),
            r#""q\"b\\n\nt\tc\u0001\b\fr\r/""#
        );
    }

    #[test]
    fn test_unicode_passes_through() {
        let mut doc = Document::new();
        doc.assign(Value::borrowed("caf\u{e9} \u{1f600}")).unwrap();
        assert_eq!(to_json_string(&doc), "\"caf\u{e9} \u{1f600}\"");
    }

    #[test]
    fn test_pretty_object() {
        let doc = parsed(r#"{"key":"value"}"#);
        assert_eq!(
            to_json_string_pretty(&doc),
            "{\r\n  \"key\": \"value\"\r\n}"
        );
    }

    #[test]
    fn test_pretty_nested() {
        let doc = parsed(r#"{"a":[1,{}],"b":[]}"#);
        assert_eq!(
            to_json_string_pretty(&doc),
            "{\r\n  \"a\": [\r\n    1,\r\n    {}\r\n  ],\r\n  \"b\": []\r\n}"
        );
    }

    #[test]
    fn test_raw_written_verbatim() {
        let doc = parsed("[1e+2, -0.50, word]");
        assert_eq!(to_json_string(&doc), "[1e+2,-0.50,word]");
    }

    #[test]
    fn test_measure_matches_output() {
        let doc = parsed(r#"{"list":[1,2,3],"text":"a\"b","nested":{"x":null}}"#);
        assert_eq!(measure_json(&doc), to_json_string(&doc).len());
        assert_eq!(measure_json_pretty(&doc), to_json_string_pretty(&doc).len());
    }

    #[test]
    fn test_serialize_sub_tree() {
        let doc = parsed(r#"{"list":[1,2,3]}"#);
        assert_eq!(to_json_string(doc.get("list")), "[1,2,3]");
        assert_eq!(to_json_string(doc.get("list").as_array()), "[1,2,3]");
        assert_eq!(to_json_string(doc.get("missing")), "null");
    }

    #[test]
    fn test_self_aliased_container_terminates() {
        let mut doc = Document::new();
        doc.to_array();
        let array = doc.as_array();
        array.append(array).unwrap();

        let json = to_json_string(&doc);
        assert_eq!(json.matches('[').count(), TRAVERSAL_LIMIT);
        assert!(json.contains("[null]"));
        assert_eq!(measure_json(&doc), json.len());
        assert_eq!(to_json_string_pretty(&doc).len(), measure_json_pretty(&doc));
    }

    #[test]
    fn test_pretty_string_matches_writer() {
        let doc = parsed(r#"{"a":[1,"two"]}"#);
        let mut out = Vec::new();
        serialize_json_pretty(&doc, &mut out).unwrap();
        assert_eq!(to_json_string_pretty(&doc).as_bytes(), out.as_slice());
    }

    #[test]
    fn test_io_errors_propagate() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let doc = parsed("[1]");
        assert!(serialize_json(&doc, Broken).is_err());
    }
}
