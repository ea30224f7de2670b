use crate::collection::{
    Document, FindAndModifyOptions, FindOptions, IndexOptions, ReadPreference, WriteConcern,
    WriteResult,
};
use crate::common::Value;
use crate::errors::DocmapResult;

/// The database driver behind a [Collection](crate::collection::Collection).
///
/// One implementation serves one named collection. Implementations own their
/// connection and any locking; all methods take `&self`. Failures are
/// reported with [ErrorKind::DriverError](crate::errors::ErrorKind::DriverError)
/// unless a more specific kind applies.
///
/// Queries, updates, projections and sort specifications are plain
/// [Document]s in the driver's query language, e.g. `{age: {$gt: 12}}` or
/// `{nm: -1}`.
pub trait CollectionDriver: Send + Sync {
    /// Short name of the collection.
    fn name(&self) -> &str;

    /// Fully qualified name, `<database>.<collection>` where the driver knows
    /// its database.
    fn full_name(&self) -> String {
        self.name().to_string()
    }

    /// Inserts `docs`. Documents without an `_id` get one assigned in place.
    fn insert(
        &self,
        docs: &mut [Document],
        concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult>;

    /// Applies `update` to the documents matching `query`.
    ///
    /// Only the first match is updated unless `multi` is set. With `upsert`
    /// and no match, a new document is inserted.
    fn update(
        &self,
        query: &Document,
        update: &Document,
        upsert: bool,
        multi: bool,
        concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult>;

    /// Removes every document matching `query`.
    fn remove(&self, query: &Document, concern: Option<&WriteConcern>)
        -> DocmapResult<WriteResult>;

    /// Inserts `doc`, or replaces the stored document with the same `_id`.
    /// A missing `_id` is assigned in place.
    fn save(&self, doc: &mut Document, concern: Option<&WriteConcern>)
        -> DocmapResult<WriteResult>;

    /// Returns the documents matching `query`, restricted to the keys of
    /// `projection` when given.
    fn find(
        &self,
        query: &Document,
        projection: Option<&Document>,
        options: &FindOptions,
    ) -> DocmapResult<Vec<Document>>;

    /// Returns the first document matching `query` in `sort` order.
    fn find_one(
        &self,
        query: &Document,
        projection: Option<&Document>,
        sort: Option<&Document>,
        read_pref: Option<&ReadPreference>,
    ) -> DocmapResult<Option<Document>>;

    /// Atomically updates or removes the first match of `query` and returns
    /// it, before or after the change depending on `options`.
    fn find_and_modify(
        &self,
        query: &Document,
        update: Option<&Document>,
        options: &FindAndModifyOptions,
    ) -> DocmapResult<Option<Document>>;

    fn count(&self, query: &Document, read_pref: Option<&ReadPreference>) -> DocmapResult<u64>;

    /// Counts the matches of `query` after skipping `skip` of them, stopping
    /// at `limit` when it is not zero. `fields` is passed through to the
    /// database.
    fn get_count(
        &self,
        query: &Document,
        fields: Option<&Document>,
        limit: u64,
        skip: u64,
        read_pref: Option<&ReadPreference>,
    ) -> DocmapResult<u64>;

    /// Distinct values of `key` among the documents matching `query`.
    fn distinct(&self, key: &str, query: &Document) -> DocmapResult<Vec<Value>>;

    fn create_index(&self, keys: &Document, options: &IndexOptions) -> DocmapResult<()>;

    fn drop_index(&self, name: &str) -> DocmapResult<()>;

    fn drop_indexes(&self) -> DocmapResult<()>;

    /// One document per index, as reported by the database.
    fn index_info(&self) -> DocmapResult<Vec<Document>>;

    /// Runs an aggregation pipeline, one stage per document.
    fn aggregate(&self, pipeline: &[Document]) -> DocmapResult<Vec<Document>>;

    /// Storage statistics as reported by the database.
    fn stats(&self) -> DocmapResult<Document>;

    fn is_capped(&self) -> DocmapResult<bool>;

    /// The driver of the sub-collection `<name>.<sub>`.
    fn sub_collection(&self, sub: &str) -> DocmapResult<Self>
    where
        Self: Sized;

    /// Sets the concern used by writes that pass none.
    fn set_write_concern(&self, concern: WriteConcern) -> DocmapResult<()>;

    fn write_concern(&self) -> DocmapResult<WriteConcern>;

    /// Sets the preference used by reads that pass none.
    fn set_read_preference(&self, preference: ReadPreference) -> DocmapResult<()>;

    fn read_preference(&self) -> DocmapResult<ReadPreference>;

    /// Drops the whole collection.
    fn drop(&self) -> DocmapResult<()>;

    /// Renames the collection, replacing an existing `new_name` only when
    /// `drop_target` is set.
    fn rename(&self, new_name: &str, drop_target: bool) -> DocmapResult<()>;
}
