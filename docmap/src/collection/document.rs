use crate::collection::literal::LiteralParser;
use crate::collection::ObjectId;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use chrono::{DateTime, TimeZone, Utc};
use indexmap::map::{IntoIter, Iter, Keys};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// An ordered, mutable record of string keys to [Value]s.
///
/// Keys are unique and keep their insertion order; overwriting a key keeps its
/// original position, so serialization is deterministic.
///
/// The identity field `_id` is optional. Once a document holds an `_id`, the
/// value cannot be reassigned to something different, though it can be removed.
///
/// # Examples
///
/// ```rust
/// use docmap::collection::Document;
/// use docmap::doc;
///
/// let mut doc = doc! {
///     name: "Fido",
///     age: 3,
///     tags: ["good", "dog"],
/// };
/// doc.put("owner", "Jeff").unwrap();
/// assert_eq!(doc.get_string("name").unwrap(), "Fido");
/// assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["name", "age", "tags", "owner"]);
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Builds a document from alternating key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::ArgumentError] if the number of values is odd or a
    /// key position does not hold a [Value::String].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use docmap::collection::Document;
    /// use docmap::common::Value;
    ///
    /// let doc = Document::from_pairs(vec![Value::from("a"), Value::from(1)]).unwrap();
    /// assert_eq!(doc.get_i32("a").unwrap(), 1);
    ///
    /// assert!(Document::from_pairs(vec![Value::from("a")]).is_err());
    /// ```
    pub fn from_pairs(pairs: Vec<Value>) -> DocmapResult<Document> {
        if pairs.len() % 2 != 0 {
            log::error!("Odd number of arguments {} for document pairs", pairs.len());
            return Err(DocmapError::new(
                &format!(
                    "Document pairs need an even number of arguments, got {}",
                    pairs.len()
                ),
                ErrorKind::ArgumentError,
            ));
        }

        let mut doc = Document::new();
        let mut iter = pairs.into_iter();
        let mut position = 0;
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            match key {
                Value::String(key) => {
                    doc.put(&key, value)?;
                }
                other => {
                    log::error!("Document key at position {} is a {}", position, other.type_name());
                    return Err(DocmapError::new(
                        &format!(
                            "Document key at position {} must be a string, got {}",
                            position,
                            other.type_name()
                        ),
                        ErrorKind::ArgumentError,
                    ));
                }
            }
            position += 2;
        }
        Ok(doc)
    }

    /// Parses a document from its literal text form.
    ///
    /// The literal dialect is relaxed JSON: bare keys, single quotes, trailing
    /// commas, `//` comments, and the `ObjectId(...)`, `ISODate(...)` and
    /// `Date(...)` constructors.
    ///
    /// ```rust
    /// use docmap::collection::Document;
    /// use docmap::common::Value;
    /// use docmap::doc;
    ///
    /// let query = Document::parse("{age: {$gt: 12}}").unwrap();
    /// assert_eq!(query.get("age"), Some(&Value::Document(doc! { "$gt": 12 })));
    /// ```
    pub fn parse(literal: &str) -> DocmapResult<Document> {
        LiteralParser::new(literal).parse_document()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Checks whether `key` is present, including keys holding [Value::Null].
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Reads a dotted path such as `"owner.name"` or `"tags.0"`.
    ///
    /// A literal key containing the separator wins over path traversal. Numeric
    /// segments index into arrays; other segments applied to an array collect
    /// the matching values of its elements. Missing paths yield [Value::Null].
    pub fn get_path(&self, path: &str) -> Value {
        if let Some(value) = self.data.get(path) {
            return value.clone();
        }

        let splits: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        if splits.len() < 2 {
            return Value::Null;
        }
        recursive_get(self.data.get(splits[0]), &splits[1..])
    }

    /// Reads a string. Object ids are returned in hex form.
    pub fn get_string(&self, key: &str) -> DocmapResult<String> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::ObjectId(id)) => Ok(id.to_hex()),
            Some(other) => Err(type_mismatch(key, "string", other)),
        }
    }

    /// Reads a 32-bit integer, accepting wider integral numbers in range.
    pub fn get_i32(&self, key: &str) -> DocmapResult<i32> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(0),
            Some(value) => value
                .as_integer()
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(|| type_mismatch(key, "i32", value)),
        }
    }

    pub fn get_i64(&self, key: &str) -> DocmapResult<i64> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(0),
            Some(value) => value
                .as_integer()
                .ok_or_else(|| type_mismatch(key, "i64", value)),
        }
    }

    pub fn get_f64(&self, key: &str) -> DocmapResult<f64> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(0.0),
            Some(value) => value
                .as_decimal()
                .ok_or_else(|| type_mismatch(key, "f64", value)),
        }
    }

    pub fn get_bool(&self, key: &str) -> DocmapResult<bool> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(type_mismatch(key, "bool", other)),
        }
    }

    pub fn get_document(&self, key: &str) -> DocmapResult<Document> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(Document::new()),
            Some(Value::Document(doc)) => Ok(doc.clone()),
            Some(other) => Err(type_mismatch(key, "document", other)),
        }
    }

    pub fn get_array(&self, key: &str) -> DocmapResult<Vec<Value>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(arr)) => Ok(arr.clone()),
            Some(other) => Err(type_mismatch(key, "array", other)),
        }
    }

    /// Reads an object id, accepting its hex string form.
    pub fn get_object_id(&self, key: &str) -> DocmapResult<Option<ObjectId>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::ObjectId(id)) => Ok(Some(*id)),
            Some(Value::String(s)) if ObjectId::is_valid(s) => Ok(Some(ObjectId::parse_str(s)?)),
            Some(other) => Err(type_mismatch(key, "object id", other)),
        }
    }

    /// Reads a timestamp, accepting integer milliseconds since the epoch.
    pub fn get_timestamp(&self, key: &str) -> DocmapResult<DateTime<Utc>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(DateTime::<Utc>::UNIX_EPOCH),
            Some(Value::Timestamp(ts)) => Ok(*ts),
            Some(value @ (Value::I64(_) | Value::I32(_))) => value
                .as_integer()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .ok_or_else(|| type_mismatch(key, "timestamp", value)),
            Some(other) => Err(type_mismatch(key, "timestamp", other)),
        }
    }

    /// Inserts or overwrites `key`, returning the document for chaining.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidOperation] if the key is empty, or if `_id`
    /// is already set to a different value.
    ///
    /// ```rust
    /// use docmap::collection::Document;
    ///
    /// let mut doc = Document::new();
    /// doc.put("name", "Fido").unwrap().put("age", 3).unwrap();
    /// assert_eq!(doc.len(), 2);
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> DocmapResult<&mut Self> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocmapError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if key == DOC_ID {
            if let Some(current) = self.data.get(DOC_ID) {
                if *current != value {
                    log::error!("Document id {} cannot be reassigned to {}", current, value);
                    return Err(DocmapError::new(
                        &format!("Document id {} cannot be reassigned to {}", current, value),
                        ErrorKind::InvalidOperation,
                    ));
                }
            }
        }

        self.data.insert(key.to_string(), value);
        Ok(self)
    }

    /// Stores a value under a fixed non-identity key.
    pub(crate) fn insert_unchecked(&mut self, key: &str, value: Value) {
        debug_assert!(!key.is_empty() && key != DOC_ID);
        self.data.insert(key.to_string(), value);
    }

    /// Removes `key`, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Assigns a fresh [ObjectId] to `_id` unless one is already present.
    pub fn generate_id(&mut self) -> &mut Self {
        if !self.has_id() {
            self.data.insert(DOC_ID.to_string(), Value::ObjectId(ObjectId::new()));
        }
        self
    }

    /// Returns the identity value, treating a stored `Null` as absent.
    pub fn id(&self) -> Option<&Value> {
        match self.data.get(DOC_ID) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.data.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.data.iter()
    }

    /// Copies every entry of `other` into this document.
    ///
    /// Nested documents present on both sides are merged recursively; any
    /// other value overwrites. On error the document is left unchanged.
    pub fn merge(&mut self, other: &Document) -> DocmapResult<&mut Self> {
        let mut merged = self.clone();
        merged.merge_entries(other)?;
        *self = merged;
        Ok(self)
    }

    fn merge_entries(&mut self, other: &Document) -> DocmapResult<()> {
        for (key, value) in other.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(mine)), Value::Document(theirs)) => {
                    mine.merge_entries(theirs)?;
                }
                _ => {
                    self.put(key, value.clone())?;
                }
            }
        }
        Ok(())
    }

    /// Compact JSON in insertion order with extended forms for object ids
    /// and timestamps.
    ///
    /// ```rust
    /// use docmap::doc;
    ///
    /// let doc = doc! { b: 1, a: "x" };
    /// assert_eq!(doc.to_json().unwrap(), r#"{"b":1,"a":"x"}"#);
    /// ```
    pub fn to_json(&self) -> DocmapResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> DocmapError {
    log::error!("Field '{}' holds a {}, expected {}", key, found.type_name(), expected);
    DocmapError::new(
        &format!(
            "Field '{}' holds a {} which cannot be read as {}",
            key,
            found.type_name(),
            expected
        ),
        ErrorKind::TypeMismatch,
    )
}

fn recursive_get(value: Option<&Value>, splits: &[&str]) -> Value {
    let value = match value {
        None => return Value::Null,
        Some(v) => v,
    };

    if splits.is_empty() {
        return value.clone();
    }

    let key = splits[0];
    match value {
        Value::Document(doc) => recursive_get(doc.data.get(key), &splits[1..]),
        Value::Array(arr) => {
            if let Ok(index) = key.parse::<usize>() {
                recursive_get(arr.get(index), &splits[1..])
            } else {
                // collect the path from every element
                let mut items = Vec::with_capacity(arr.len());
                for item in arr {
                    match recursive_get(Some(item), splits) {
                        Value::Null => {}
                        Value::Array(inner) => items.extend(inner),
                        other => items.push(other),
                    }
                }
                Value::Array(items)
            }
        }
        _ => Value::Null,
    }
}

impl FromStr for Document {
    type Err = DocmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Document::parse(s)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in &self.data {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys are bare identifiers or string literals; values are literals,
/// nested `{...}` documents, `[...]` arrays, or parenthesised expressions.
///
/// # Panics
///
/// Panics if a key is empty or `_id` is given twice with different values.
///
/// # Examples
///
/// ```rust
/// use docmap::doc;
///
/// let base = 100;
/// let doc = doc! {
///     name: "Alice",
///     score: (base * 2),
///     "$set": { tags: ["a", "b"] },
/// };
/// assert_eq!(doc.get_i32("score").unwrap(), 200);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

/// Builds a [Document] from alternating keys and values at runtime.
///
/// Expands to a [Document::from_pairs] call, so it returns a result.
///
/// ```rust
/// use docmap::doc_pairs;
///
/// let doc = doc_pairs!("name", "Fido", "age", 3).unwrap();
/// assert_eq!(doc.len(), 2);
/// assert!(doc_pairs!("name").is_err());
/// ```
#[macro_export]
macro_rules! doc_pairs {
    ($($value:expr),* $(,)?) => {
        $crate::collection::Document::from_pairs(vec![$($crate::common::Value::from($value)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_up() -> Document {
        doc! {
            score: 1034,
            location: {
                state: "NY",
                city: "New York",
                address: {
                    line1: "40",
                    house: ["1", "2", "3"],
                    zip: 10001,
                },
            },
            category: ["food", "produce", "grocery"],
            obj_array: [
                { value: 1 },
                { value: 2 },
            ]
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\"ABC\""), "ABC");
        assert_eq!(normalize("ABC"), "ABC");
    }

    #[test]
    fn test_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.len(), 0);
        assert_eq!(doc.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_from_pairs() {
        let doc = Document::from_pairs(vec![
            Value::from("name"),
            Value::from("Fido"),
            Value::from("age"),
            Value::from(3),
        ])
        .unwrap();
        assert_eq!(doc.get_string("name").unwrap(), "Fido");
        assert_eq!(doc.get_i32("age").unwrap(), 3);
    }

    #[test]
    fn test_from_pairs_odd_count() {
        let err = Document::from_pairs(vec![Value::from("a"), Value::from(1), Value::from("b")])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ArgumentError);
    }

    #[test]
    fn test_from_pairs_non_string_key() {
        let err = Document::from_pairs(vec![Value::from(1), Value::from(1)]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ArgumentError);
    }

    #[test]
    fn test_doc_pairs_macro() {
        let doc = doc_pairs!("a", 1, "b", "x").unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut doc = Document::new();
        doc.put("z", 1).unwrap().put("a", 2).unwrap().put("m", 3).unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);

        // overwrite keeps position
        doc.put("z", 10).unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(doc.to_json().unwrap(), r#"{"z":10,"a":2,"m":3}"#);
    }

    #[test]
    fn test_put_empty_key() {
        let mut doc = Document::new();
        let err = doc.put("", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_put_id_is_immutable() {
        let id = ObjectId::new();
        let mut doc = Document::new();
        doc.put(DOC_ID, id).unwrap();

        // same value is accepted
        assert!(doc.put(DOC_ID, id).is_ok());

        let err = doc.put(DOC_ID, ObjectId::new()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(doc.id(), Some(&Value::ObjectId(id)));
    }

    #[test]
    fn test_put_id_accepts_scalars() {
        let mut doc = Document::new();
        doc.put(DOC_ID, "custom").unwrap();
        assert_eq!(doc.get_string(DOC_ID).unwrap(), "custom");

        let mut doc = Document::new();
        doc.put(DOC_ID, 42).unwrap();
        assert_eq!(doc.get_i64(DOC_ID).unwrap(), 42);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut doc = doc! { a: 1, b: 2, c: 3 };
        assert_eq!(doc.remove("b"), Some(Value::I32(2)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(doc.remove("missing"), None);
    }

    #[test]
    fn test_remove_id_then_reassign() {
        let mut doc = Document::new();
        doc.generate_id();
        assert!(doc.remove(DOC_ID).is_some());
        assert!(!doc.has_id());
        doc.put(DOC_ID, "other").unwrap();
        assert_eq!(doc.get_string(DOC_ID).unwrap(), "other");
    }

    #[test]
    fn test_generate_id_is_idempotent() {
        let mut doc = Document::new();
        assert!(!doc.has_id());
        doc.generate_id();
        let first = doc.id().cloned().unwrap();
        assert!(first.is_object_id());
        assert!(ObjectId::is_valid(&doc.get_string(DOC_ID).unwrap()));

        doc.generate_id();
        assert_eq!(doc.id(), Some(&first));
    }

    #[test]
    fn test_null_id_is_absent() {
        let mut doc = Document::new();
        doc.put(DOC_ID, Value::Null).unwrap();
        assert!(!doc.has_id());
        doc.generate_id();
        assert!(doc.has_id());
    }

    #[test]
    fn test_typed_getters_zero_values() {
        let doc = doc! { nothing: (Value::Null) };
        assert_eq!(doc.get_string("missing").unwrap(), "");
        assert_eq!(doc.get_i32("missing").unwrap(), 0);
        assert_eq!(doc.get_i64("nothing").unwrap(), 0);
        assert_eq!(doc.get_f64("missing").unwrap(), 0.0);
        assert!(!doc.get_bool("missing").unwrap());
        assert!(doc.get_document("missing").unwrap().is_empty());
        assert!(doc.get_array("nothing").unwrap().is_empty());
        assert_eq!(doc.get_object_id("missing").unwrap(), None);
        assert_eq!(doc.get_timestamp("missing").unwrap(), DateTime::<Utc>::UNIX_EPOCH);
        assert!(doc.has("nothing"));
        assert!(!doc.has("missing"));
    }

    #[test]
    fn test_typed_getters_coercions() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let doc = doc! {
            small: 12,
            big: (i64::MAX),
            integral: 12.0,
            fraction: 12.5,
            id: id,
            hex: "507f1f77bcf86cd799439011",
            millis: 1000i64,
        };

        assert_eq!(doc.get_i32("small").unwrap(), 12);
        assert_eq!(doc.get_i32("integral").unwrap(), 12);
        assert_eq!(doc.get_i64("small").unwrap(), 12);
        assert_eq!(doc.get_i64("big").unwrap(), i64::MAX);
        assert_eq!(doc.get_f64("small").unwrap(), 12.0);
        assert_eq!(doc.get_f64("fraction").unwrap(), 12.5);
        assert_eq!(doc.get_string("id").unwrap(), "507f1f77bcf86cd799439011");
        assert_eq!(doc.get_object_id("hex").unwrap(), Some(id));
        assert_eq!(doc.get_timestamp("millis").unwrap().timestamp_millis(), 1000);
    }

    #[test]
    fn test_typed_getters_type_mismatch() {
        let doc = doc! {
            name: "Fido",
            big: (i64::MAX),
            fraction: 12.5,
            number: 1,
            flag: true,
        };

        assert_eq!(doc.get_i32("name").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_i32("big").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_i64("fraction").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_f64("flag").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_string("number").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_bool("number").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_document("name").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_array("name").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_object_id("name").unwrap_err().kind(), &ErrorKind::TypeMismatch);
        assert_eq!(doc.get_timestamp("name").unwrap_err().kind(), &ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_get_path() {
        let doc = set_up();
        assert_eq!(doc.get_path("score"), Value::I32(1034));
        assert_eq!(doc.get_path("location.city"), Value::from("New York"));
        assert_eq!(doc.get_path("location.address.zip"), Value::I32(10001));
        assert_eq!(doc.get_path("location.address.house.1"), Value::from("2"));
        assert_eq!(doc.get_path("category.5"), Value::Null);
        assert_eq!(doc.get_path("location.missing.deep"), Value::Null);
        assert_eq!(
            doc.get_path("obj_array.value"),
            Value::Array(vec![Value::I32(1), Value::I32(2)])
        );
    }

    #[test]
    fn test_get_path_prefers_literal_key() {
        let doc = doc! { "a.b": 1, a: { b: 2 } };
        assert_eq!(doc.get_path("a.b"), Value::I32(1));
    }

    #[test]
    fn test_merge() {
        let mut doc = set_up();
        let other = doc! {
            score: 1,
            location: { zip: 2 },
            extra: true,
        };
        doc.merge(&other).unwrap();
        assert_eq!(doc.get_i32("score").unwrap(), 1);
        assert_eq!(doc.get_path("location.city"), Value::from("New York"));
        assert_eq!(doc.get_path("location.zip"), Value::I32(2));
        assert!(doc.get_bool("extra").unwrap());
    }

    #[test]
    fn test_merge_rejects_id_change() {
        let mut doc = doc! { a: 1, nested: { "_id": 1, x: 1 } };
        doc.generate_id();
        let before = doc.clone();

        let mut other = doc! { a: 2, b: 3 };
        other.generate_id();
        assert_eq!(doc.merge(&other).unwrap_err().kind(), &ErrorKind::InvalidOperation);
        assert_eq!(doc, before);

        let other = doc! { a: 2, nested: { x: 2, "_id": 2 } };
        assert_eq!(doc.merge(&other).unwrap_err().kind(), &ErrorKind::InvalidOperation);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_to_json() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let doc = doc! {
            "_id": id,
            name: "Fido",
            nothing: (Value::Null),
            nested: { tags: ["a", 1, 1.5, false] },
        };
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"_id":{"$oid":"507f1f77bcf86cd799439011"},"name":"Fido","nothing":null,"nested":{"tags":["a",1,1.5,false]}}"#
        );
        assert_eq!(doc.to_string(), doc.to_json().unwrap());
    }

    #[test]
    fn test_json_escapes_strings() {
        let doc = doc! { text: "say \"hi\"\n" };
        assert_eq!(doc.to_json().unwrap(), r#"{"text":"say \"hi\"\n"}"#);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = doc! { a: 1, b: 2 };
        let b = doc! { b: 2, a: 1 };
        assert_eq!(a, b);
        assert_ne!(a, doc! { a: 1 });
    }

    #[test]
    fn test_from_str() {
        let doc: Document = "{name: 'Fido'}".parse().unwrap();
        assert_eq!(doc.get_string("name").unwrap(), "Fido");
        assert_eq!(
            "[1]".parse::<Document>().unwrap_err().kind(),
            &ErrorKind::ParseError
        );
    }

    #[test]
    fn test_into_iter() {
        let doc = doc! { a: 1, b: 2 };
        let pairs: Vec<(String, Value)> = doc.into_iter().collect();
        assert_eq!(pairs[0], ("a".to_string(), Value::I32(1)));
        assert_eq!(pairs[1], ("b".to_string(), Value::I32(2)));
    }
}
