use crate::common::{OBJECT_ID_HEX_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Per-process random component, drawn once.
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(rand::random::<[u8; 5]>);

/// 24-bit counter seeded at a random value.
static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::random::<u32>() & 0x00FF_FFFF));

/// A 12-byte database identity value.
///
/// Layout:
/// - 4 bytes: big-endian seconds since the Unix epoch
/// - 5 bytes: random value drawn once per process
/// - 3 bytes: big-endian counter starting at a random value
///
/// The canonical text form is 24 lower-case hex characters. Ordering follows
/// the byte layout, so ids generated later in time sort after earlier ones.
///
/// # Examples
///
/// ```rust
/// use docmap::collection::ObjectId;
///
/// let id = ObjectId::new();
/// assert!(ObjectId::is_valid(&id.to_hex()));
///
/// let parsed = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
/// assert_eq!(parsed.to_string(), "507f1f77bcf86cd799439011");
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
pub struct ObjectId {
    bytes: [u8; OBJECT_ID_LENGTH],
}

impl ObjectId {
    /// Generates a new unique `ObjectId`.
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        ObjectId { bytes }
    }

    /// Creates an `ObjectId` from its raw bytes.
    pub fn from_bytes(bytes: [u8; OBJECT_ID_LENGTH]) -> Self {
        ObjectId { bytes }
    }

    /// Parses a 24-character hex string (either case).
    ///
    /// Fails with [ErrorKind::InvalidId] for any other input.
    pub fn parse_str(hex_str: &str) -> DocmapResult<ObjectId> {
        if hex_str.len() != OBJECT_ID_HEX_LENGTH {
            log::error!("Invalid object id length {} for '{}'", hex_str.len(), hex_str);
            return Err(DocmapError::new(
                &format!(
                    "Invalid object id '{}': expected {} hex characters",
                    hex_str, OBJECT_ID_HEX_LENGTH
                ),
                ErrorKind::InvalidId,
            ));
        }

        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        hex::decode_to_slice(hex_str, &mut bytes)?;
        Ok(ObjectId { bytes })
    }

    /// Returns true iff `s` is exactly 24 hex characters.
    pub fn is_valid(s: &str) -> bool {
        s.len() == OBJECT_ID_HEX_LENGTH && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn bytes(&self) -> [u8; OBJECT_ID_LENGTH] {
        self.bytes
    }

    /// Canonical lower-case hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// The creation time encoded in the leading four bytes.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let mut seconds = [0u8; 4];
        seconds.copy_from_slice(&self.bytes[0..4]);
        let seconds = u32::from_be_bytes(seconds);
        Utc.timestamp_opt(seconds as i64, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Generates a fresh id, so a bare `ObjectId` field is never unset. Entity
/// identity fields that may be absent should be `Option<ObjectId>` or
/// `String`.
impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl FromStr for ObjectId {
    type Err = DocmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_id() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        assert!(ObjectId::is_valid(&hex));
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn test_new_ids_are_distinct() {
        let ids: HashSet<ObjectId> = (0..1000).map(|_| ObjectId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_process_unique_is_shared() {
        let a = ObjectId::new().bytes();
        let b = ObjectId::new().bytes();
        assert_eq!(a[4..9], b[4..9]);
    }

    #[test]
    fn test_timestamp_is_now() {
        let id = ObjectId::new();
        let delta = Utc::now().timestamp() - id.timestamp().timestamp();
        assert!((0..=2).contains(&delta));
    }

    #[test]
    fn test_parse_str() {
        let id = ObjectId::parse_str("507F1F77BCF86CD799439011").unwrap();
        assert_eq!(id.to_hex(), "507f1f77bcf86cd799439011");
        assert_eq!(id.timestamp().timestamp(), 0x507f1f77);
    }

    #[test]
    fn test_parse_str_invalid() {
        let result = ObjectId::parse_str("abc");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidId);

        let result = ObjectId::parse_str("zz7f1f77bcf86cd799439011");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn test_is_valid() {
        assert!(ObjectId::is_valid("507f1f77bcf86cd799439011"));
        assert!(ObjectId::is_valid("507F1F77BCF86CD799439011"));
        assert!(!ObjectId::is_valid("507f1f77bcf86cd79943901"));
        assert!(!ObjectId::is_valid("507f1f77bcf86cd79943901g"));
        assert!(!ObjectId::is_valid(""));
    }

    #[test]
    fn test_from_str() {
        let id: ObjectId = "507f1f77bcf86cd799439011".parse().unwrap();
        assert_eq!(id, ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap());
    }

    #[test]
    fn test_debug_and_display() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(format!("{}", id), "507f1f77bcf86cd799439011");
        assert_eq!(format!("{:?}", id), "ObjectId(\"507f1f77bcf86cd799439011\")");
    }

    #[test]
    fn test_ordering_follows_bytes() {
        let a = ObjectId::parse_str("000000000000000000000001").unwrap();
        let b = ObjectId::parse_str("000000000000000000000002").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_concurrent_generation() {
        let ids = Arc::new(parking_lot::Mutex::new(HashSet::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = ids.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        ids.lock().insert(ObjectId::new());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ids.lock().len(), 4000);
    }
}
