use crate::common::{type_mismatch, Value};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};

/// An enum stored in documents under the name of its variant.
///
/// Implemented by `#[derive(DocEnum)]`, which also implements
/// [Convertible](crate::common::Convertible) through [enum_to_value] and
/// [enum_from_value].
///
/// ```rust
/// use docmap::errors::DocmapResult;
/// use docmap::mapper::{unknown_enum_value, DocEnum};
///
/// #[derive(Debug, PartialEq)]
/// enum Color {
///     Red,
///     Blue,
/// }
///
/// impl DocEnum for Color {
///     fn name(&self) -> &'static str {
///         match self {
///             Color::Red => "RED",
///             Color::Blue => "BLUE",
///         }
///     }
///
///     fn from_name(name: &str) -> DocmapResult<Self> {
///         match name {
///             "RED" => Ok(Color::Red),
///             "BLUE" => Ok(Color::Blue),
///             _ => Err(unknown_enum_value::<Self>("Color", name)),
///         }
///     }
///
///     fn variants() -> &'static [&'static str] {
///         &["RED", "BLUE"]
///     }
/// }
///
/// assert_eq!(Color::from_name("BLUE").unwrap(), Color::Blue);
/// assert!(Color::from_name("GREEN").is_err());
/// ```
pub trait DocEnum: Sized + 'static {
    /// The stored name of this variant.
    fn name(&self) -> &'static str;

    /// Resolves a stored name, failing with [ErrorKind::UnknownEnumValue].
    fn from_name(name: &str) -> DocmapResult<Self>;

    /// Every stored name, in declaration order.
    fn variants() -> &'static [&'static str];
}

pub fn enum_to_value<E: DocEnum>(value: &E) -> DocmapResult<Value> {
    Ok(Value::String(value.name().to_string()))
}

pub fn enum_from_value<E: DocEnum>(value: &Value) -> DocmapResult<E> {
    match value {
        Value::String(name) => E::from_name(name),
        _ => Err(type_mismatch(value, "an enum name")),
    }
}

/// The error reported when `name` matches no variant of `E`.
pub fn unknown_enum_value<E: DocEnum>(type_name: &str, name: &str) -> DocmapError {
    log::error!("Unknown {} value '{}'", type_name, name);
    DocmapError::new(
        &format!(
            "Unknown {} value '{}', expected one of [{}]",
            type_name,
            name,
            E::variants().join(", ")
        ),
        ErrorKind::UnknownEnumValue,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum PetType {
        Cat,
        Dog,
    }

    impl DocEnum for PetType {
        fn name(&self) -> &'static str {
            match self {
                PetType::Cat => "CAT",
                PetType::Dog => "DOG",
            }
        }

        fn from_name(name: &str) -> DocmapResult<Self> {
            match name {
                "CAT" => Ok(PetType::Cat),
                "DOG" => Ok(PetType::Dog),
                _ => Err(unknown_enum_value::<Self>("PetType", name)),
            }
        }

        fn variants() -> &'static [&'static str] {
            &["CAT", "DOG"]
        }
    }

    #[test]
    fn test_enum_to_value() {
        assert_eq!(enum_to_value(&PetType::Cat).unwrap(), Value::from("CAT"));
    }

    #[test]
    fn test_enum_from_value() {
        let pet: PetType = enum_from_value(&Value::from("DOG")).unwrap();
        assert_eq!(pet, PetType::Dog);
    }

    #[test]
    fn test_unknown_name() {
        let err = enum_from_value::<PetType>(&Value::from("cat")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnknownEnumValue);
        assert!(err.message().contains("[CAT, DOG]"));
    }

    #[test]
    fn test_non_string_value() {
        let err = enum_from_value::<PetType>(&Value::I32(0)).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    }
}
