//! Documents, identities and the driver-backed collection wrapper.
//!
//! # Documents
//!
//! A [Document] is an ordered map of string keys to [Value](crate::common::Value)s.
//! Nested fields can be read with a dotted path.
//!
//! ```rust
//! use docmap::collection::Document;
//! use docmap::doc;
//!
//! let doc = doc! { master: { nm: "zozoh" }, labels: ["A", "B"] };
//! assert_eq!(doc.get_path("master.nm").as_str(), Some("zozoh"));
//!
//! let parsed = Document::parse("{age: {$gt: 12}}").unwrap();
//! assert_eq!(parsed, doc! { age: { "$gt": 12 } });
//! ```
//!
//! # Identities
//!
//! The `_id` field usually holds an [ObjectId]: 12 bytes made of a timestamp,
//! a per-process random value and a counter.
//!
//! # Collections
//!
//! A [Collection] forwards every operation to a [CollectionDriver] and logs
//! it at debug level as `db.<collection>.<op>(<args>)`.

#[allow(clippy::module_inception)]
mod collection;
mod document;
mod driver;
mod literal;
mod object_id;
mod options;
mod write_result;

pub use collection::*;
pub use document::*;
pub use driver::*;
pub use object_id::*;
pub use options::*;
pub use write_result::*;
