//! Object mapping between typed entities and documents.
//!
//! Each [Entity] describes its fields once in an [EntityMapping]; the table is
//! cached process-wide and drives both directions of conversion in [Mapper].
//! The free functions here use the default mapper.

mod config;
mod doc_enum;
mod entity;
mod object_mapper;
mod registry;

pub use config::*;
pub use doc_enum::*;
pub use entity::*;
pub use object_mapper::*;
pub use registry::*;

use crate::collection::Document;
use crate::common::{type_mismatch, Value};
use crate::errors::DocmapResult;
use crate::DEFAULT_MAPPER;

/// Converts `entity` with the default mapper.
pub fn to_doc<T: Entity>(entity: &T) -> DocmapResult<Document> {
    DEFAULT_MAPPER.to_doc(entity)
}

pub fn to_docs<T: Entity>(entities: &[T]) -> DocmapResult<Vec<Document>> {
    DEFAULT_MAPPER.to_docs(entities)
}

/// Builds a `T` from `doc` with the default mapper.
pub fn from_doc<T: Entity>(doc: &Document) -> DocmapResult<T> {
    DEFAULT_MAPPER.from_doc(doc)
}

pub fn from_docs<T: Entity>(docs: &[Document]) -> DocmapResult<Vec<T>> {
    DEFAULT_MAPPER.from_docs(docs)
}

/// `Convertible::to_value` for entities: a sub-document built by the default
/// mapper.
pub fn entity_to_value<T: Entity>(entity: &T) -> DocmapResult<Value> {
    Ok(Value::Document(DEFAULT_MAPPER.to_doc(entity)?))
}

/// `Convertible::from_value` for entities.
pub fn entity_from_value<T: Entity>(value: &Value) -> DocmapResult<T> {
    match value {
        Value::Document(doc) => DEFAULT_MAPPER.from_doc(doc),
        _ => Err(type_mismatch(value, "a document")),
    }
}
