use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for docmap operations.
///
/// Every fallible operation in the crate reports one of these categories so
/// callers can branch on the failure without parsing messages.
///
/// # Examples
///
/// ```rust
/// use docmap::errors::{DocmapError, DocmapResult, ErrorKind};
///
/// fn example() -> DocmapResult<()> {
///     Err(DocmapError::new("odd number of arguments", ErrorKind::ArgumentError))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::ArgumentError);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Malformed call arguments (odd key/value count, non-string key)
    ArgumentError,
    /// Malformed literal document syntax
    ParseError,
    /// A typed accessor was applied to an incompatible stored value
    TypeMismatch,
    /// A string did not match any variant of the target enum
    UnknownEnumValue,
    /// Error mapping an object to or from a document
    ObjectMappingError,
    /// The provided identity value is invalid
    InvalidId,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Error reported by the underlying database driver
    DriverError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ArgumentError => write!(f, "Argument error"),
            ErrorKind::ParseError => write!(f, "Parse error"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::UnknownEnumValue => write!(f, "Unknown enum value"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::DriverError => write!(f, "Driver error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom docmap error type.
///
/// `DocmapError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured at construction.
///
/// # Examples
///
/// ```rust
/// use docmap::errors::{DocmapError, ErrorKind};
///
/// let cause = DocmapError::new("bad digit", ErrorKind::ParseError);
/// let err = DocmapError::new_with_cause("cannot read literal", ErrorKind::ParseError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct DocmapError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocmapError>>,
    backtrace: Arc<Backtrace>,
}

impl DocmapError {
    /// Creates a new `DocmapError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocmapError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `DocmapError` with a cause error.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocmapError) -> Self {
        DocmapError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocmapError> {
        self.cause.as_deref()
    }
}

impl Display for DocmapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocmapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for DocmapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docmap operations.
pub type DocmapResult<T> = Result<T, DocmapError>;

impl From<std::num::ParseIntError> for DocmapError {
    fn from(err: std::num::ParseIntError) -> Self {
        DocmapError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::ParseError,
        )
    }
}

impl From<std::num::ParseFloatError> for DocmapError {
    fn from(err: std::num::ParseFloatError) -> Self {
        DocmapError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::ParseError,
        )
    }
}

impl From<chrono::ParseError> for DocmapError {
    fn from(err: chrono::ParseError) -> Self {
        DocmapError::new(
            &format!("Date parsing error: {}", err),
            ErrorKind::ParseError,
        )
    }
}

impl From<hex::FromHexError> for DocmapError {
    fn from(err: hex::FromHexError) -> Self {
        DocmapError::new(
            &format!("Invalid object id: {}", err),
            ErrorKind::InvalidId,
        )
    }
}

impl From<serde_json::Error> for DocmapError {
    fn from(err: serde_json::Error) -> Self {
        DocmapError::new(
            &format!("JSON encoding error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<std::fmt::Error> for DocmapError {
    fn from(err: std::fmt::Error) -> Self {
        DocmapError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}
