use crate::collection::{Document, ObjectId};
use crate::common::Value;
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use crate::mapper::{mapping_of, Converter, Entity, FieldMapping, MapperBuilder, MapperConfig};

/// Converts entities to and from documents through their field-mapping
/// tables.
///
/// A mapper only carries configuration; tables come from the process-wide
/// registry, so mappers are cheap to clone and share.
///
/// ```rust
/// use docmap::mapper::Mapper;
///
/// let mapper = Mapper::default();
/// assert!(mapper.config().skip_nulls());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Mapper {
    config: MapperConfig,
}

impl Mapper {
    pub fn new(config: MapperConfig) -> Self {
        Mapper { config }
    }

    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Writes every mapped field of `entity` into a new document, in table
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::ObjectMappingError] when a field produces a value
    /// whose shape does not fit its converter, or any error raised while
    /// reading a field.
    pub fn to_doc<T: Entity>(&self, entity: &T) -> DocmapResult<Document> {
        let mapping = mapping_of::<T>()?;
        let mut doc = Document::new();

        for field in mapping.fields() {
            let raw = field.read(entity).map_err(|e| {
                DocmapError::new_with_cause(
                    &format!("Failed to read field {}.{}", mapping.name(), field.field()),
                    e.kind().clone(),
                    e,
                )
            })?;

            let value = match self.convert_out(mapping.name(), field, raw)? {
                Some(value) => value,
                None => continue,
            };
            doc.put(field.key(), value)?;
        }

        if self.config.generate_ids() {
            doc.generate_id();
        }
        Ok(doc)
    }

    pub fn to_docs<T: Entity>(&self, entities: &[T]) -> DocmapResult<Vec<Document>> {
        entities.iter().map(|e| self.to_doc(e)).collect()
    }

    /// Builds an entity from `doc`, starting from `T::default()`.
    ///
    /// Keys that are absent or hold `Null` leave their field at its default.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::TypeMismatch] when a stored value does not have the
    /// shape its converter expects, [ErrorKind::UnknownEnumValue] for an
    /// unknown enum name, or any error raised while writing a field.
    pub fn from_doc<T: Entity>(&self, doc: &Document) -> DocmapResult<T> {
        let mapping = mapping_of::<T>()?;
        let mut entity = T::default();

        for field in mapping.fields() {
            let value = match doc.get(field.key()) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            check_stored_shape(mapping.name(), field, value)?;
            field.write(&mut entity, value).map_err(|e| {
                DocmapError::new_with_cause(
                    &format!(
                        "Failed to write key '{}' into {}.{}",
                        field.key(),
                        mapping.name(),
                        field.field()
                    ),
                    e.kind().clone(),
                    e,
                )
            })?;
        }
        Ok(entity)
    }

    pub fn from_docs<T: Entity>(&self, docs: &[Document]) -> DocmapResult<Vec<T>> {
        docs.iter().map(|d| self.from_doc(d)).collect()
    }

    /// Applies the outbound converter; `None` means the key is omitted.
    fn convert_out<T>(
        &self,
        entity_name: &str,
        field: &FieldMapping<T>,
        raw: Value,
    ) -> DocmapResult<Option<Value>> {
        let value = match field.converter() {
            Converter::Identity => return identity_out(entity_name, field, raw),
            Converter::Passthrough => raw,
            Converter::EnumName => match raw {
                Value::String(_) | Value::Null => raw,
                other => return Err(shape_error(entity_name, field, "an enum name", &other)),
            },
            Converter::Nested => match raw {
                Value::Document(_) | Value::Null => raw,
                other => return Err(shape_error(entity_name, field, "a document", &other)),
            },
            Converter::NestedArray => match raw {
                Value::Array(ref items) => {
                    if let Some(bad) = items
                        .iter()
                        .find(|item| !matches!(item, Value::Document(_) | Value::Null))
                    {
                        return Err(shape_error(entity_name, field, "an array of documents", bad));
                    }
                    raw
                }
                Value::Null => raw,
                other => {
                    return Err(shape_error(entity_name, field, "an array of documents", &other))
                }
            },
        };

        if value.is_null() && self.config.skip_nulls() {
            return Ok(None);
        }
        Ok(Some(value))
    }
}

fn identity_out<T>(
    entity_name: &str,
    field: &FieldMapping<T>,
    raw: Value,
) -> DocmapResult<Option<Value>> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        // only the canonical lowercase form reads back unchanged
        Value::String(s) if ObjectId::is_valid(&s) => {
            let id = ObjectId::parse_str(&s)?;
            if id.to_hex() == s {
                Ok(Some(Value::ObjectId(id)))
            } else {
                Ok(Some(Value::String(s)))
            }
        }
        Value::Document(_) | Value::Array(_) => {
            Err(shape_error(entity_name, field, "a scalar identity", &raw))
        }
        other => Ok(Some(other)),
    }
}

fn shape_error<T>(entity_name: &str, field: &FieldMapping<T>, expected: &str, found: &Value) -> DocmapError {
    log::error!(
        "Field {}.{} produced a {}, expected {}",
        entity_name,
        field.field(),
        found.type_name(),
        expected
    );
    DocmapError::new(
        &format!(
            "Field {}.{} produced a {} but its converter expects {}",
            entity_name,
            field.field(),
            found.type_name(),
            expected
        ),
        ErrorKind::ObjectMappingError,
    )
}

fn check_stored_shape<T>(entity_name: &str, field: &FieldMapping<T>, value: &Value) -> DocmapResult<()> {
    let expected = match (field.converter(), value) {
        (Converter::Passthrough, _) => return Ok(()),
        (Converter::EnumName, Value::String(_)) => return Ok(()),
        (Converter::Nested, Value::Document(_)) => return Ok(()),
        (Converter::NestedArray, Value::Array(_)) => return Ok(()),
        (Converter::Identity, v) if !matches!(v, Value::Document(_) | Value::Array(_)) => return Ok(()),
        (Converter::EnumName, _) => "an enum name",
        (Converter::Nested, _) => "a document",
        (Converter::NestedArray, _) => "an array",
        (Converter::Identity, _) => "a scalar identity",
    };

    log::error!(
        "Key '{}' of {} holds a {}, expected {}",
        field.key(),
        entity_name,
        value.type_name(),
        expected
    );
    Err(DocmapError::new(
        &format!(
            "Key '{}' of {} holds a {} which cannot be read as {}",
            field.key(),
            entity_name,
            value.type_name(),
            expected
        ),
        ErrorKind::TypeMismatch,
    ))
}
