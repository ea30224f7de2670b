//! # docmap - Documents and Object Mapping for Document Databases
//!
//! docmap sits between application types and a document-database driver. It
//! provides an ordered in-memory document, a relaxed literal syntax for
//! writing queries, a typed object mapper and a thin collection wrapper that
//! traces every call.
//!
//! ## Key Features
//!
//! - **Ordered documents**: keys keep insertion order, values form a closed [common::Value] enum
//! - **Literal syntax**: `{age: {$gt: 12}}` parses straight into a document
//! - **Object mapping**: field tables built once per type, via `#[derive(Entity)]` or by hand
//! - **Enum names**: `#[derive(DocEnum)]` stores variants by name
//! - **Call tracing**: [collection::Collection] logs `db.<collection>.<op>(...)` at debug level
//!
//! ## Quick Start
//!
//! ```rust
//! use docmap::collection::Document;
//! use docmap::doc;
//!
//! let mut pet = doc! { nm: "XiaoBai", age: 10, labels: ["cute"] };
//! pet.generate_id();
//! assert!(pet.has_id());
//!
//! let query = Document::parse("{age: {$gt: 8}}").unwrap();
//! assert_eq!(query.get_path("age.$gt").as_integer(), Some(8));
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, object ids, the literal parser and the collection wrapper
//! - [`common`] - Values, conversions and constants
//! - [`errors`] - Error types and result definitions
//! - [`mapper`] - Entity mapping tables, the registry and the mapper

use crate::mapper::Mapper;
use std::sync::LazyLock;

pub mod collection;
pub mod common;
pub mod errors;
pub mod mapper;

/// The mapper used by the free functions of [mapper] and by nested entities.
pub static DEFAULT_MAPPER: LazyLock<Mapper> = LazyLock::new(Mapper::default);
