//! `bumpjson`: arena-backed JSON and MessagePack documents
//!
//! A [`Document`] owns one arena and one root value. Decoders build the tree
//! straight into the arena; nothing is freed individually, the whole tree goes
//! away at once on [`Document::clear`]. This makes memory use predictable:
//!
//! - **Fixed documents** never allocate after construction and fail with a
//!   `NoMemory` error when full
//! - **Growable documents** chain chunks and never move what they allocated
//! - **Lenient JSON input** with comments, single quotes and barewords
//! - **MessagePack input** producing the same tree
//!
//! # Reading
//!
//! Lookups never fail. A missing key, an out-of-range index or a value of
//! the wrong kind yields the Invalid handle, which answers every query with
//! a default, so chains of subscripts are always safe:
//!
//! ```
//! use bumpjson::{Document, deserialize_json};
//!
//! let mut doc = Document::new();
//! deserialize_json(&mut doc, r#"{"sensor":"gps","data":[48.75,2.30]}"#).unwrap();
//!
//! assert_eq!(doc.get("sensor"), "gps");
//! assert_eq!(doc.get("data").get(1).as_f64(), 2.30);
//! assert!(!doc.get("missing").get(3).get("x").is_valid());
//! assert_eq!(doc.get("missing").get(3).as_i64(), 0);
//! ```
//!
//! # Writing
//!
//! ```
//! use bumpjson::{Document, to_json_string};
//!
//! let mut doc = Document::new();
//! let root = doc.to_object();
//! root.set("sensor", "gps").unwrap();
//! let data = root.create_nested_array("data");
//! data.append(48.75).unwrap();
//! data.append(2.3).unwrap();
//!
//! assert_eq!(to_json_string(&doc), r#"{"sensor":"gps","data":[48.75,2.3]}"#);
//! ```

mod array;
pub mod builder;
mod convert;
mod document;
pub mod error;
pub mod json;
pub mod msgpack;
mod object;
mod options;
pub mod reader;
pub mod sizing;
mod slot;
mod value;
mod variant;

pub use array::{ArrayIter, ArrayRef};
pub use bumpjson_mem::{ArenaPolicy, DEFAULT_CHUNK_SIZE};
pub use document::Document;
pub use error::{Error, JsonError, MsgPackError, Result, StringError};
pub use json::{
    deserialize_json, deserialize_json_array, deserialize_json_object, deserialize_json_with,
    measure_json, measure_json_pretty, serialize_json, serialize_json_pretty, to_json_string,
    to_json_string_pretty,
};
pub use msgpack::{deserialize_msgpack, deserialize_msgpack_with};
pub use object::{ObjectIter, ObjectRef};
pub use options::{DEFAULT_NESTING_LIMIT, DecodeOptions};
pub use slot::{StrRef, StringMode};
pub use value::Value;
pub use variant::{FromVariant, JsonIndex, Kind, VariantRef};
