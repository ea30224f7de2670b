use crate::collection::{Document, ObjectId};
use crate::common::Value;
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::str::FromStr;

/// Conversion between a Rust value and a document [Value].
///
/// Implemented for primitives, strings, [ObjectId], timestamps, documents and
/// the standard containers. Entities and document enums get an implementation
/// from their derive macros, so nested objects, `Option<Entity>` and
/// `Vec<Entity>` compose.
///
/// Reading is lenient across numeric widths: an `i32` field reads any integral
/// number that fits, whether stored as `I32`, `I64` or a whole `F64`.
///
/// ```rust
/// use docmap::common::{Convertible, Value};
///
/// let value = vec![1u8, 2, 3].to_value().unwrap();
/// assert_eq!(value, Value::Array(vec![Value::I32(1), Value::I32(2), Value::I32(3)]));
/// assert_eq!(i64::from_value(&Value::I32(7)).unwrap(), 7);
/// ```
pub trait Convertible: Sized {
    fn to_value(&self) -> DocmapResult<Value>;
    fn from_value(value: &Value) -> DocmapResult<Self>;
}

pub(crate) fn type_mismatch(value: &Value, expected: &str) -> DocmapError {
    log::error!("Value {} is not {}", value, expected);
    DocmapError::new(
        &format!("Value of type {} is not {}", value.type_name(), expected),
        ErrorKind::TypeMismatch,
    )
}

macro_rules! impl_convertible_for_int {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Convertible for $t {
                fn to_value(&self) -> DocmapResult<Value> {
                    Ok(Value::$variant((*self).into()))
                }

                fn from_value(value: &Value) -> DocmapResult<Self> {
                    value
                        .as_integer()
                        .and_then(|i| <$t>::try_from(i).ok())
                        .ok_or_else(|| type_mismatch(value, concat!("an integer of type ", stringify!($t))))
                }
            }
        )*
    };
}

impl_convertible_for_int!(
    i8 => I32,
    i16 => I32,
    i32 => I32,
    u8 => I32,
    u16 => I32,
    u32 => I64,
    i64 => I64,
);

macro_rules! impl_convertible_for_wide_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl Convertible for $t {
                fn to_value(&self) -> DocmapResult<Value> {
                    match i64::try_from(*self) {
                        Ok(i) => Ok(Value::I64(i)),
                        Err(_) => {
                            log::error!("Value {} does not fit in a 64-bit signed integer", self);
                            Err(DocmapError::new(
                                &format!("Value {} does not fit in a 64-bit signed integer", self),
                                ErrorKind::ObjectMappingError,
                            ))
                        }
                    }
                }

                fn from_value(value: &Value) -> DocmapResult<Self> {
                    value
                        .as_integer()
                        .and_then(|i| <$t>::try_from(i).ok())
                        .ok_or_else(|| type_mismatch(value, concat!("an integer of type ", stringify!($t))))
                }
            }
        )*
    };
}

impl_convertible_for_wide_int!(u64, usize, isize);

impl Convertible for f32 {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::F64(*self as f64))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        value
            .as_decimal()
            .map(|f| f as f32)
            .ok_or_else(|| type_mismatch(value, "an f32"))
    }
}

impl Convertible for f64 {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        value.as_decimal().ok_or_else(|| type_mismatch(value, "an f64"))
    }
}

impl Convertible for bool {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        value.as_bool().ok_or_else(|| type_mismatch(value, "a bool"))
    }
}

impl Convertible for char {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        let s = value.as_str().ok_or_else(|| type_mismatch(value, "a char"))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(type_mismatch(value, "a single character string")),
        }
    }
}

impl Convertible for String {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::ObjectId(id) => Ok(id.to_hex()),
            _ => Err(type_mismatch(value, "a string")),
        }
    }
}

impl Convertible for ObjectId {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::ObjectId(*self))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        match value {
            Value::ObjectId(id) => Ok(*id),
            Value::String(s) if ObjectId::is_valid(s) => ObjectId::parse_str(s),
            _ => Err(type_mismatch(value, "an object id")),
        }
    }
}

impl Convertible for DateTime<Utc> {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::Timestamp(*self))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            Value::I32(_) | Value::I64(_) => value
                .as_integer()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .ok_or_else(|| type_mismatch(value, "a timestamp")),
            _ => Err(type_mismatch(value, "a timestamp")),
        }
    }
}

impl Convertible for Document {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        match value {
            Value::Document(doc) => Ok(doc.clone()),
            _ => Err(type_mismatch(value, "a document")),
        }
    }
}

impl Convertible for Value {
    fn to_value(&self) -> DocmapResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        Ok(value.clone())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    fn to_value(&self) -> DocmapResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T> Convertible for Box<T>
where
    T: Convertible,
{
    fn to_value(&self) -> DocmapResult<Value> {
        self.as_ref().to_value()
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        Ok(Box::new(T::from_value(value)?))
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible,
{
    fn to_value(&self) -> DocmapResult<Value> {
        let mut arr = Vec::with_capacity(self.len());
        for item in self {
            arr.push(item.to_value()?);
        }
        Ok(Value::Array(arr))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        match value {
            Value::Array(arr) => {
                let mut vec = Vec::with_capacity(arr.len());
                for item in arr {
                    vec.push(T::from_value(item)?);
                }
                Ok(vec)
            }
            _ => Err(type_mismatch(value, "an array")),
        }
    }
}

impl<V> Convertible for HashSet<V>
where
    V: Convertible + Eq + Hash,
{
    fn to_value(&self) -> DocmapResult<Value> {
        let mut array = Vec::with_capacity(self.len());
        for item in self {
            array.push(item.to_value()?);
        }
        Ok(Value::Array(array))
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        match value {
            Value::Array(arr) => {
                let mut set = HashSet::with_capacity(arr.len());
                for item in arr {
                    set.insert(V::from_value(item)?);
                }
                Ok(set)
            }
            _ => Err(type_mismatch(value, "an array")),
        }
    }
}

fn map_to_value<'a, K, V, I>(entries: I) -> DocmapResult<Value>
where
    K: ToString + 'a,
    V: Convertible + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let mut doc = Document::new();
    for (k, v) in entries {
        doc.put(&k.to_string(), v.to_value()?)?;
    }
    Ok(Value::Document(doc))
}

fn map_from_value<K, V, M>(value: &Value) -> DocmapResult<M>
where
    K: FromStr,
    V: Convertible,
    M: Default + Extend<(K, V)>,
{
    let doc = match value {
        Value::Document(doc) => doc,
        _ => return Err(type_mismatch(value, "a document")),
    };

    let mut result = M::default();
    for (k, v) in doc.iter() {
        match K::from_str(k) {
            Ok(key) => result.extend(std::iter::once((key, V::from_value(v)?))),
            Err(_) => {
                log::error!("Failed to convert key {} to map key type", k);
                return Err(DocmapError::new(
                    &format!("Failed to convert key {} to map key type", k),
                    ErrorKind::ObjectMappingError,
                ));
            }
        }
    }
    Ok(result)
}

impl<K, V> Convertible for BTreeMap<K, V>
where
    K: ToString + FromStr + Ord,
    V: Convertible,
{
    fn to_value(&self) -> DocmapResult<Value> {
        map_to_value(self.iter())
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        map_from_value(value)
    }
}

impl<K, V> Convertible for HashMap<K, V>
where
    K: ToString + FromStr + Eq + Hash,
    V: Convertible,
{
    fn to_value(&self) -> DocmapResult<Value> {
        map_to_value(self.iter())
    }

    fn from_value(value: &Value) -> DocmapResult<Self> {
        map_from_value(value)
    }
}
