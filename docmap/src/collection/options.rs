use crate::collection::Document;
use crate::common::Value;
use std::fmt::{Display, Formatter};

/// Acknowledgement level requested for a write.
///
/// Passed through to the driver untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteConcern {
    Unacknowledged,
    #[default]
    Acknowledged,
    Journaled,
    Majority,
    /// Acknowledged by the given number of nodes.
    Nodes(u32),
}

impl Display for WriteConcern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteConcern::Unacknowledged => write!(f, "UNACKNOWLEDGED"),
            WriteConcern::Acknowledged => write!(f, "ACKNOWLEDGED"),
            WriteConcern::Journaled => write!(f, "JOURNALED"),
            WriteConcern::Majority => write!(f, "MAJORITY"),
            WriteConcern::Nodes(n) => write!(f, "W{}", n),
        }
    }
}

/// Which member of a replica set serves a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    #[default]
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

impl Display for ReadPreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadPreference::Primary => write!(f, "primary"),
            ReadPreference::PrimaryPreferred => write!(f, "primaryPreferred"),
            ReadPreference::Secondary => write!(f, "secondary"),
            ReadPreference::SecondaryPreferred => write!(f, "secondaryPreferred"),
            ReadPreference::Nearest => write!(f, "nearest"),
        }
    }
}

/// Sorting and pagination of a `find`.
///
/// # Examples
///
/// ```rust
/// use docmap::collection::{order_by, FindOptions};
/// use docmap::doc;
///
/// let options = order_by(doc! { "nm": (-1) }).skip(10).limit(20);
/// assert_eq!(options.get_skip(), 10);
/// assert_eq!(options.get_limit(), Some(20));
/// assert!(FindOptions::new().get_sort().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    sort: Option<Document>,
    skip: u64,
    limit: Option<u64>,
}

/// Creates `FindOptions` sorted by `sort`, a document of `field: 1 | -1`.
pub fn order_by(sort: Document) -> FindOptions {
    FindOptions::new().sort(sort)
}

pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn sort(mut self, sort: Document) -> FindOptions {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    pub fn get_sort(&self) -> Option<&Document> {
        self.sort.as_ref()
    }

    pub fn get_skip(&self) -> u64 {
        self.skip
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    /// The options as a document, omitting unset entries.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(sort) = &self.sort {
            doc.insert_unchecked("sort", Value::Document(sort.clone()));
        }
        if self.skip > 0 {
            doc.insert_unchecked("skip", Value::from(self.skip as i64));
        }
        if let Some(limit) = self.limit {
            doc.insert_unchecked("limit", Value::from(limit as i64));
        }
        doc
    }
}

impl Display for FindOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

/// Options of an atomic find-and-modify.
///
/// With `remove` set the matched document is deleted and the update is
/// ignored. `return_new` asks for the post-update document instead of the
/// original.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindAndModifyOptions {
    fields: Option<Document>,
    sort: Option<Document>,
    remove: bool,
    return_new: bool,
    upsert: bool,
}

impl FindAndModifyOptions {
    pub fn new() -> FindAndModifyOptions {
        FindAndModifyOptions::default()
    }

    /// Options that delete the matched document.
    pub fn removing() -> FindAndModifyOptions {
        FindAndModifyOptions::new().remove(true)
    }

    pub fn fields(mut self, fields: Document) -> FindAndModifyOptions {
        self.fields = Some(fields);
        self
    }

    pub fn sort(mut self, sort: Document) -> FindAndModifyOptions {
        self.sort = Some(sort);
        self
    }

    pub fn remove(mut self, remove: bool) -> FindAndModifyOptions {
        self.remove = remove;
        self
    }

    pub fn return_new(mut self, return_new: bool) -> FindAndModifyOptions {
        self.return_new = return_new;
        self
    }

    pub fn upsert(mut self, upsert: bool) -> FindAndModifyOptions {
        self.upsert = upsert;
        self
    }

    pub fn get_fields(&self) -> Option<&Document> {
        self.fields.as_ref()
    }

    pub fn get_sort(&self) -> Option<&Document> {
        self.sort.as_ref()
    }

    pub fn is_remove(&self) -> bool {
        self.remove
    }

    pub fn is_return_new(&self) -> bool {
        self.return_new
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

/// Options of `create_index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    name: Option<String>,
    unique: bool,
    sparse: bool,
    background: bool,
}

impl IndexOptions {
    pub fn new() -> IndexOptions {
        IndexOptions::default()
    }

    /// Options of a unique index.
    pub fn unique_index() -> IndexOptions {
        IndexOptions::new().unique(true)
    }

    pub fn name(mut self, name: &str) -> IndexOptions {
        self.name = Some(name.to_string());
        self
    }

    pub fn unique(mut self, unique: bool) -> IndexOptions {
        self.unique = unique;
        self
    }

    pub fn sparse(mut self, sparse: bool) -> IndexOptions {
        self.sparse = sparse;
        self
    }

    pub fn background(mut self, background: bool) -> IndexOptions {
        self.background = background;
        self
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    /// The options as a document, omitting flags that are off.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(name) = &self.name {
            doc.insert_unchecked("name", Value::from(name.as_str()));
        }
        if self.unique {
            doc.insert_unchecked("unique", Value::Bool(true));
        }
        if self.sparse {
            doc.insert_unchecked("sparse", Value::Bool(true));
        }
        if self.background {
            doc.insert_unchecked("background", Value::Bool(true));
        }
        doc
    }
}

impl Display for IndexOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}
