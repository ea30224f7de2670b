use crate::common::Value;

/// The outcome of a write reported by the driver.
///
/// # Examples
///
/// ```rust
/// use docmap::collection::{ObjectId, WriteResult};
/// use docmap::common::Value;
///
/// let result = WriteResult::new(2);
/// assert_eq!(result.n(), 2);
/// assert!(result.upserted_id().is_none());
///
/// let id = ObjectId::new();
/// let result = WriteResult::upserted(Value::ObjectId(id));
/// assert_eq!(result.n(), 1);
/// assert_eq!(result.upserted_id(), Some(&Value::ObjectId(id)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResult {
    n: u64,
    upserted_id: Option<Value>,
}

impl WriteResult {
    /// A result affecting `n` documents.
    pub fn new(n: u64) -> Self {
        WriteResult {
            n,
            upserted_id: None,
        }
    }

    /// A result that inserted one document with identity `id`.
    pub fn upserted(id: Value) -> Self {
        WriteResult {
            n: 1,
            upserted_id: Some(id),
        }
    }

    /// Number of documents written.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Identity of the document inserted by an upsert, if any.
    pub fn upserted_id(&self) -> Option<&Value> {
        self.upserted_id.as_ref()
    }
}
