use crate::common::{Value, DOC_ID};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use std::collections::HashSet;
use std::fmt::Debug;

/// Reads one field of an entity as a document value.
pub type FieldReader<T> = fn(&T) -> DocmapResult<Value>;

/// Writes one document value into a field of an entity.
pub type FieldWriter<T> = fn(&mut T, &Value) -> DocmapResult<()>;

/// A domain type that maps to and from documents.
///
/// The field-mapping table is built once per type and cached process-wide.
/// Implemented by `#[derive(Entity)]`, or by hand:
///
/// ```rust
/// use docmap::common::{Convertible, Value};
/// use docmap::errors::DocmapResult;
/// use docmap::mapper::{Converter, Entity, EntityMapping, FieldMapping};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Human {
///     name: String,
/// }
///
/// impl Entity for Human {
///     fn mapping() -> DocmapResult<EntityMapping<Self>> {
///         EntityMapping::builder("Human")
///             .field(
///                 FieldMapping::new(
///                     "name",
///                     Converter::Passthrough,
///                     |h: &Human| h.name.to_value(),
///                     |h: &mut Human, v: &Value| {
///                         h.name = String::from_value(v)?;
///                         Ok(())
///                     },
///                 )
///                 .with_key("nm"),
///             )
///             .build()
///     }
/// }
///
/// let doc = docmap::mapper::to_doc(&Human { name: "zozoh".into() }).unwrap();
/// assert_eq!(doc.get_string("nm").unwrap(), "zozoh");
/// ```
///
/// `mapping` runs at most once per type, while the registry holds a lock, so
/// it must not itself look up other mapping tables.
pub trait Entity: Default + 'static {
    fn mapping() -> DocmapResult<EntityMapping<Self>>;
}

/// How a field value is translated between an entity and a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converter {
    /// Stored as produced by the field's `Convertible` implementation.
    Passthrough,
    /// An enum stored under its variant name.
    EnumName,
    /// A nested entity stored as a sub-document.
    Nested,
    /// A sequence of nested entities stored as an array of sub-documents.
    NestedArray,
    /// The identity field, stored under `_id`.
    Identity,
}

/// One rule of an [EntityMapping]: which field, under which document key,
/// through which [Converter].
pub struct FieldMapping<T> {
    field: &'static str,
    key: String,
    converter: Converter,
    reader: FieldReader<T>,
    writer: FieldWriter<T>,
}

impl<T> FieldMapping<T> {
    /// Creates a rule for `field`. The document key defaults to the field
    /// name, or to `_id` for [Converter::Identity].
    pub fn new(
        field: &'static str,
        converter: Converter,
        reader: FieldReader<T>,
        writer: FieldWriter<T>,
    ) -> Self {
        let key = if converter == Converter::Identity {
            DOC_ID.to_string()
        } else {
            field.to_string()
        };

        FieldMapping {
            field,
            key,
            converter,
            reader,
            writer,
        }
    }

    /// Overrides the document key.
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn converter(&self) -> Converter {
        self.converter
    }

    pub fn read(&self, entity: &T) -> DocmapResult<Value> {
        (self.reader)(entity)
    }

    pub fn write(&self, entity: &mut T, value: &Value) -> DocmapResult<()> {
        (self.writer)(entity, value)
    }
}

impl<T> Debug for FieldMapping<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMapping")
            .field("field", &self.field)
            .field("key", &self.key)
            .field("converter", &self.converter)
            .finish()
    }
}

/// The field-mapping table of an entity type.
pub struct EntityMapping<T> {
    name: String,
    fields: Vec<FieldMapping<T>>,
}

impl<T> EntityMapping<T> {
    pub fn builder(name: &str) -> EntityMappingBuilder<T> {
        EntityMappingBuilder {
            error: None,
            name: name.to_string(),
            keys: HashSet::new(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in declaration order.
    pub fn fields(&self) -> &[FieldMapping<T>] {
        &self.fields
    }

    pub fn identity(&self) -> Option<&FieldMapping<T>> {
        self.fields
            .iter()
            .find(|f| f.converter == Converter::Identity)
    }

    pub fn field_by_key(&self, key: &str) -> Option<&FieldMapping<T>> {
        self.fields.iter().find(|f| f.key == key)
    }
}

impl<T> Debug for EntityMapping<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMapping")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for an [EntityMapping].
///
/// Validation errors are captured as rules are added and returned from
/// [EntityMappingBuilder::build].
pub struct EntityMappingBuilder<T> {
    error: Option<DocmapError>,
    name: String,
    keys: HashSet<String>,
    fields: Vec<FieldMapping<T>>,
}

impl<T> EntityMappingBuilder<T> {
    /// Adds a rule.
    ///
    /// Fails on an empty or duplicate document key, on a second identity rule,
    /// and on an identity rule whose key is not `_id`.
    pub fn field(mut self, mapping: FieldMapping<T>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.validate(&mapping) {
                self.error = Some(e);
            } else {
                self.keys.insert(mapping.key.clone());
                self.fields.push(mapping);
            }
        }
        self
    }

    pub fn build(self) -> DocmapResult<EntityMapping<T>> {
        if let Some(error) = self.error {
            return Err(error);
        }

        Ok(EntityMapping {
            name: self.name,
            fields: self.fields,
        })
    }

    fn validate(&self, mapping: &FieldMapping<T>) -> DocmapResult<()> {
        if mapping.key.is_empty() {
            return Err(self.mapping_error(&format!(
                "field '{}' is mapped to an empty key",
                mapping.field
            )));
        }

        if mapping.converter == Converter::Identity {
            if self.fields.iter().any(|f| f.converter == Converter::Identity) {
                return Err(self.mapping_error(&format!(
                    "field '{}' is a second identity field",
                    mapping.field
                )));
            }
            if mapping.key != DOC_ID {
                return Err(self.mapping_error(&format!(
                    "identity field '{}' must use key '{}', not '{}'",
                    mapping.field, DOC_ID, mapping.key
                )));
            }
        }

        if self.keys.contains(&mapping.key) {
            return Err(self.mapping_error(&format!(
                "field '{}' reuses document key '{}'",
                mapping.field, mapping.key
            )));
        }
        Ok(())
    }

    fn mapping_error(&self, message: &str) -> DocmapError {
        log::error!("Invalid mapping for {}: {}", self.name, message);
        DocmapError::new(
            &format!("Invalid mapping for {}: {}", self.name, message),
            ErrorKind::ObjectMappingError,
        )
    }
}
