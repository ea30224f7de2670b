use crate::collection::{
    CollectionDriver, Document, FindAndModifyOptions, FindOptions, IndexOptions, ReadPreference,
    WriteConcern, WriteResult,
};
use crate::common::{Value, LOG_ARG_SEPARATOR, LOG_DB_PREFIX};
use crate::errors::DocmapResult;
use crate::mapper::{mapping_of, Entity, Mapper};
use itertools::Itertools;
use std::fmt::Debug;

/// Renders one argument of a logged call.
///
/// Documents, values and sequences are written as compact JSON, everything
/// else through `Display`. `None` is written as `null`.
pub(crate) trait LogArg {
    fn log_arg(&self) -> String;
}

impl LogArg for Document {
    fn log_arg(&self) -> String {
        self.to_string()
    }
}

impl LogArg for Value {
    fn log_arg(&self) -> String {
        self.to_string()
    }
}

impl LogArg for [Document] {
    fn log_arg(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[?]".to_string())
    }
}

impl LogArg for Vec<Document> {
    fn log_arg(&self) -> String {
        self.as_slice().log_arg()
    }
}

impl<T: LogArg + ?Sized> LogArg for &T {
    fn log_arg(&self) -> String {
        (**self).log_arg()
    }
}

impl<T: LogArg> LogArg for Option<T> {
    fn log_arg(&self) -> String {
        match self {
            Some(arg) => arg.log_arg(),
            None => "null".to_string(),
        }
    }
}

macro_rules! display_log_arg {
    ($($t:ty),*) => {
        $(
            impl LogArg for $t {
                fn log_arg(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_log_arg!(
    str,
    String,
    bool,
    u64,
    WriteConcern,
    ReadPreference,
    FindOptions,
    IndexOptions
);

/// Logs a call at debug level, rendering the arguments only when enabled.
macro_rules! log_call {
    ($self:ident, $op:expr $(, $arg:expr)* $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            let args: Vec<String> = vec![$(LogArg::log_arg(&$arg)),*];
            log::debug!("{}", $self.log_format($op, &args));
        }
    };
}

/// A named document collection backed by a [CollectionDriver].
///
/// Every operation is logged at debug level as
/// `db.<collection>.<op>(<arg>, ...)` and then forwarded to the driver; the
/// driver's result is returned unchanged. The wrapper keeps a [Mapper] for the
/// entity helpers such as [Collection::insert_entity] and
/// [Collection::find_as].
///
/// # Examples
///
/// ```rust,ignore
/// use docmap::collection::Collection;
/// use docmap::doc;
///
/// let pets = Collection::new(driver);
/// pets.insert_one(&mut doc! { nm: "XiaoBai", age: 10 })?;
/// let old = pets.find_by(&doc! { age: { "$gt": 12 } })?;
/// ```
pub struct Collection<D: CollectionDriver> {
    driver: D,
    mapper: Mapper,
}

impl<D: CollectionDriver> Collection<D> {
    /// Wraps `driver`, mapping entities with the default mapper settings.
    pub fn new(driver: D) -> Self {
        Collection {
            driver,
            mapper: Mapper::default(),
        }
    }

    pub fn with_mapper(driver: D, mapper: Mapper) -> Self {
        Collection { driver, mapper }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn name(&self) -> &str {
        log_call!(self, "getName");
        self.driver.name()
    }

    pub fn full_name(&self) -> String {
        log_call!(self, "getFullName");
        self.driver.full_name()
    }

    /// The text logged for a call of `op` with already rendered `args`.
    ///
    /// ```rust,ignore
    /// assert_eq!(pets.log_format("count", &["{}".into()]), "db.pet.count({})");
    /// ```
    pub fn log_format(&self, op: &str, args: &[String]) -> String {
        format!(
            "{}.{}.{}({})",
            LOG_DB_PREFIX,
            self.driver.name(),
            op,
            args.iter().join(LOG_ARG_SEPARATOR)
        )
    }

    // insert

    pub fn insert(
        &self,
        docs: &mut [Document],
        concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult> {
        log_call!(self, "insert", &*docs, concern);
        self.driver.insert(docs, concern)
    }

    pub fn insert_one(&self, doc: &mut Document) -> DocmapResult<WriteResult> {
        self.insert(std::slice::from_mut(doc), None)
    }

    pub fn insert_many(&self, docs: &mut [Document]) -> DocmapResult<WriteResult> {
        self.insert(docs, None)
    }

    // update

    pub fn update(
        &self,
        query: &Document,
        update: &Document,
        upsert: bool,
        multi: bool,
        concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult> {
        log_call!(self, "update", query, update, upsert, multi, concern);
        self.driver.update(query, update, upsert, multi, concern)
    }

    /// Updates the first document matching `query`.
    pub fn update_one(&self, query: &Document, update: &Document) -> DocmapResult<WriteResult> {
        self.update(query, update, false, false, None)
    }

    /// Updates every document matching `query`.
    pub fn update_multi(&self, query: &Document, update: &Document) -> DocmapResult<WriteResult> {
        log_call!(self, "updateMulti", query, update);
        self.driver.update(query, update, false, true, None)
    }

    /// Updates the first match, inserting when nothing matches.
    pub fn upsert(&self, query: &Document, update: &Document) -> DocmapResult<WriteResult> {
        self.update(query, update, true, false, None)
    }

    // remove

    pub fn remove(
        &self,
        query: &Document,
        concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult> {
        log_call!(self, "remove", query, concern);
        self.driver.remove(query, concern)
    }

    pub fn remove_by(&self, query: &Document) -> DocmapResult<WriteResult> {
        self.remove(query, None)
    }

    // save

    pub fn save(
        &self,
        doc: &mut Document,
        concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult> {
        log_call!(self, "save", &*doc, concern);
        self.driver.save(doc, concern)
    }

    pub fn save_one(&self, doc: &mut Document) -> DocmapResult<WriteResult> {
        self.save(doc, None)
    }

    // find

    pub fn find(
        &self,
        query: &Document,
        projection: Option<&Document>,
        options: &FindOptions,
    ) -> DocmapResult<Vec<Document>> {
        log_call!(self, "find", query, projection, options);
        self.driver.find(query, projection, options)
    }

    pub fn find_all(&self) -> DocmapResult<Vec<Document>> {
        self.find(&Document::new(), None, &FindOptions::new())
    }

    pub fn find_by(&self, query: &Document) -> DocmapResult<Vec<Document>> {
        self.find(query, None, &FindOptions::new())
    }

    pub fn find_with_options(
        &self,
        query: &Document,
        options: &FindOptions,
    ) -> DocmapResult<Vec<Document>> {
        self.find(query, None, options)
    }

    pub fn find_one(
        &self,
        query: &Document,
        projection: Option<&Document>,
        sort: Option<&Document>,
        read_pref: Option<&ReadPreference>,
    ) -> DocmapResult<Option<Document>> {
        log_call!(self, "findOne", query, projection, sort, read_pref);
        self.driver.find_one(query, projection, sort, read_pref)
    }

    /// The first document of the collection.
    pub fn find_first(&self) -> DocmapResult<Option<Document>> {
        self.find_one(&Document::new(), None, None, None)
    }

    pub fn find_one_by(&self, query: &Document) -> DocmapResult<Option<Document>> {
        self.find_one(query, None, None, None)
    }

    // find and modify

    pub fn find_and_modify(
        &self,
        query: &Document,
        update: Option<&Document>,
        options: &FindAndModifyOptions,
    ) -> DocmapResult<Option<Document>> {
        log_call!(
            self,
            "findAndModify",
            query,
            options.get_fields(),
            options.get_sort(),
            options.is_remove(),
            update,
            options.is_return_new(),
            options.is_upsert()
        );
        self.driver.find_and_modify(query, update, options)
    }

    /// Applies `update` to the first match and returns the original document.
    pub fn find_and_update(
        &self,
        query: &Document,
        update: &Document,
    ) -> DocmapResult<Option<Document>> {
        self.find_and_modify(query, Some(update), &FindAndModifyOptions::new())
    }

    /// Removes the first match and returns it.
    pub fn find_and_remove(&self, query: &Document) -> DocmapResult<Option<Document>> {
        log_call!(self, "findAndRemove", query);
        self.driver
            .find_and_modify(query, None, &FindAndModifyOptions::removing())
    }

    // count

    pub fn count(
        &self,
        query: &Document,
        read_pref: Option<&ReadPreference>,
    ) -> DocmapResult<u64> {
        log_call!(self, "count", query, read_pref);
        self.driver.count(query, read_pref)
    }

    pub fn count_all(&self) -> DocmapResult<u64> {
        self.count(&Document::new(), None)
    }

    pub fn count_by(&self, query: &Document) -> DocmapResult<u64> {
        self.count(query, None)
    }

    /// Counts matches of `query` within the `skip`/`limit` window; a zero
    /// `limit` counts to the end.
    pub fn get_count(
        &self,
        query: &Document,
        fields: Option<&Document>,
        limit: u64,
        skip: u64,
        read_pref: Option<&ReadPreference>,
    ) -> DocmapResult<u64> {
        log_call!(self, "getCount", query, fields, limit, skip, read_pref);
        self.driver.get_count(query, fields, limit, skip, read_pref)
    }

    pub fn distinct(&self, key: &str, query: &Document) -> DocmapResult<Vec<Value>> {
        log_call!(self, "distinct", key, query);
        self.driver.distinct(key, query)
    }

    // indexes

    pub fn create_index(&self, keys: &Document, options: &IndexOptions) -> DocmapResult<()> {
        log_call!(self, "createIndex", keys, options);
        self.driver.create_index(keys, options)
    }

    /// Creates an index over `keys` with default options.
    pub fn create_index_on(&self, keys: &Document) -> DocmapResult<()> {
        self.create_index(keys, &IndexOptions::new())
    }

    pub fn drop_index(&self, name: &str) -> DocmapResult<()> {
        log_call!(self, "dropIndex", name);
        self.driver.drop_index(name)
    }

    pub fn drop_indexes(&self) -> DocmapResult<()> {
        log_call!(self, "dropIndexes");
        self.driver.drop_indexes()
    }

    pub fn index_info(&self) -> DocmapResult<Vec<Document>> {
        log_call!(self, "getIndexInfo");
        self.driver.index_info()
    }

    pub fn aggregate(&self, pipeline: &[Document]) -> DocmapResult<Vec<Document>> {
        log_call!(self, "aggregate", pipeline);
        self.driver.aggregate(pipeline)
    }

    // collection

    pub fn stats(&self) -> DocmapResult<Document> {
        log_call!(self, "getStats");
        self.driver.stats()
    }

    pub fn is_capped(&self) -> DocmapResult<bool> {
        log_call!(self, "isCapped");
        self.driver.is_capped()
    }

    /// The sub-collection `<name>.<sub>`, sharing this collection's mapper.
    pub fn collection(&self, sub: &str) -> DocmapResult<Collection<D>> {
        log_call!(self, "getCollection", sub);
        Ok(Collection::with_mapper(
            self.driver.sub_collection(sub)?,
            self.mapper.clone(),
        ))
    }

    pub fn set_write_concern(&self, concern: WriteConcern) -> DocmapResult<()> {
        log_call!(self, "setWriteConcern", concern);
        self.driver.set_write_concern(concern)
    }

    pub fn write_concern(&self) -> DocmapResult<WriteConcern> {
        log_call!(self, "getWriteConcern");
        self.driver.write_concern()
    }

    pub fn set_read_preference(&self, preference: ReadPreference) -> DocmapResult<()> {
        log_call!(self, "setReadPreference", preference);
        self.driver.set_read_preference(preference)
    }

    pub fn read_preference(&self) -> DocmapResult<ReadPreference> {
        log_call!(self, "getReadPreference");
        self.driver.read_preference()
    }

    pub fn drop(&self) -> DocmapResult<()> {
        log_call!(self, "drop");
        self.driver.drop()
    }

    pub fn rename(&self, new_name: &str, drop_target: bool) -> DocmapResult<()> {
        log_call!(self, "rename", new_name, drop_target);
        self.driver.rename(new_name, drop_target)
    }

    // entities

    /// Maps `entity` and inserts it. An identity assigned by the driver is
    /// written back into the entity.
    pub fn insert_entity<T: Entity>(&self, entity: &mut T) -> DocmapResult<WriteResult> {
        let mut doc = self.mapper.to_doc(entity)?;
        let result = self.insert_one(&mut doc)?;
        write_back_id(entity, &doc)?;
        Ok(result)
    }

    /// Maps every entity and inserts them in one call, writing assigned
    /// identities back.
    pub fn insert_entities<T: Entity>(&self, entities: &mut [T]) -> DocmapResult<WriteResult> {
        let mut docs = self.mapper.to_docs(entities)?;
        let result = self.insert_many(&mut docs)?;
        for (entity, doc) in entities.iter_mut().zip(docs.iter()) {
            write_back_id(entity, doc)?;
        }
        Ok(result)
    }

    /// Maps `entity` and saves it, writing an assigned identity back.
    pub fn save_entity<T: Entity>(&self, entity: &mut T) -> DocmapResult<WriteResult> {
        let mut doc = self.mapper.to_doc(entity)?;
        let result = self.save_one(&mut doc)?;
        write_back_id(entity, &doc)?;
        Ok(result)
    }

    pub fn find_as<T: Entity>(
        &self,
        query: &Document,
        options: &FindOptions,
    ) -> DocmapResult<Vec<T>> {
        let docs = self.find(query, None, options)?;
        self.mapper.from_docs(&docs)
    }

    pub fn find_one_as<T: Entity>(&self, query: &Document) -> DocmapResult<Option<T>> {
        match self.find_one_by(query)? {
            Some(doc) => Ok(Some(self.mapper.from_doc(&doc)?)),
            None => Ok(None),
        }
    }
}

impl<D: CollectionDriver + Debug> Debug for Collection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("driver", &self.driver)
            .field("mapper", &self.mapper)
            .finish()
    }
}

fn write_back_id<T: Entity>(entity: &mut T, doc: &Document) -> DocmapResult<()> {
    let mapping = mapping_of::<T>()?;
    if let (Some(field), Some(id)) = (mapping.identity(), doc.id()) {
        field.write(entity, id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ObjectId;
    use crate::common::Convertible;
    use crate::doc;
    use crate::errors::{DocmapError, ErrorKind};
    use crate::mapper::{Converter, EntityMapping, FieldMapping};
    use parking_lot::Mutex;

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    /// Records every call and answers with canned results.
    #[derive(Default)]
    struct RecordingDriver {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingDriver {
        fn record(&self, call: &str) -> DocmapResult<()> {
            self.calls.lock().push(call.to_string());
            if self.fail {
                return Err(DocmapError::new("connection refused", ErrorKind::DriverError));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl CollectionDriver for RecordingDriver {
        fn name(&self) -> &str {
            "pet"
        }

        fn full_name(&self) -> String {
            "zoo.pet".to_string()
        }

        fn insert(
            &self,
            docs: &mut [Document],
            _concern: Option<&WriteConcern>,
        ) -> DocmapResult<WriteResult> {
            self.record("insert")?;
            for doc in docs.iter_mut() {
                doc.generate_id();
            }
            Ok(WriteResult::new(docs.len() as u64))
        }

        fn update(
            &self,
            _query: &Document,
            _update: &Document,
            upsert: bool,
            multi: bool,
            _concern: Option<&WriteConcern>,
        ) -> DocmapResult<WriteResult> {
            self.record(&format!("update upsert={} multi={}", upsert, multi))?;
            Ok(WriteResult::new(if multi { 3 } else { 1 }))
        }

        fn remove(
            &self,
            _query: &Document,
            _concern: Option<&WriteConcern>,
        ) -> DocmapResult<WriteResult> {
            self.record("remove")?;
            Ok(WriteResult::new(1))
        }

        fn save(
            &self,
            doc: &mut Document,
            _concern: Option<&WriteConcern>,
        ) -> DocmapResult<WriteResult> {
            self.record("save")?;
            doc.generate_id();
            Ok(WriteResult::new(1))
        }

        fn find(
            &self,
            _query: &Document,
            _projection: Option<&Document>,
            options: &FindOptions,
        ) -> DocmapResult<Vec<Document>> {
            self.record(&format!("find {}", options))?;
            Ok(vec![doc! { nm: "a" }, doc! { nm: "b" }])
        }

        fn find_one(
            &self,
            _query: &Document,
            _projection: Option<&Document>,
            _sort: Option<&Document>,
            _read_pref: Option<&ReadPreference>,
        ) -> DocmapResult<Option<Document>> {
            self.record("findOne")?;
            Ok(Some(doc! { nm: "a" }))
        }

        fn find_and_modify(
            &self,
            _query: &Document,
            update: Option<&Document>,
            options: &FindAndModifyOptions,
        ) -> DocmapResult<Option<Document>> {
            self.record(&format!(
                "findAndModify remove={} update={}",
                options.is_remove(),
                update.is_some()
            ))?;
            Ok(None)
        }

        fn count(
            &self,
            _query: &Document,
            _read_pref: Option<&ReadPreference>,
        ) -> DocmapResult<u64> {
            self.record("count")?;
            Ok(42)
        }

        fn distinct(&self, key: &str, _query: &Document) -> DocmapResult<Vec<Value>> {
            self.record(&format!("distinct {}", key))?;
            Ok(vec![Value::from(1), Value::from(2)])
        }

        fn create_index(&self, _keys: &Document, options: &IndexOptions) -> DocmapResult<()> {
            self.record(&format!("createIndex {}", options))
        }

        fn drop_index(&self, name: &str) -> DocmapResult<()> {
            self.record(&format!("dropIndex {}", name))
        }

        fn drop_indexes(&self) -> DocmapResult<()> {
            self.record("dropIndexes")
        }

        fn index_info(&self) -> DocmapResult<Vec<Document>> {
            self.record("getIndexInfo")?;
            Ok(vec![doc! { name: "_id_" }])
        }

        fn drop(&self) -> DocmapResult<()> {
            self.record("drop")
        }

        fn rename(&self, new_name: &str, drop_target: bool) -> DocmapResult<()> {
            self.record(&format!("rename {} {}", new_name, drop_target))
        }

        fn get_count(
            &self,
            _query: &Document,
            _fields: Option<&Document>,
            limit: u64,
            skip: u64,
            _read_pref: Option<&ReadPreference>,
        ) -> DocmapResult<u64> {
            self.record(&format!("getCount {} {}", limit, skip))?;
            Ok(7)
        }

        fn aggregate(&self, pipeline: &[Document]) -> DocmapResult<Vec<Document>> {
            self.record(&format!("aggregate {}", pipeline.len()))?;
            Ok(vec![doc! { total: 3 }])
        }

        fn stats(&self) -> DocmapResult<Document> {
            self.record("getStats")?;
            Ok(doc! { ns: "zoo.pet", count: 0 })
        }

        fn is_capped(&self) -> DocmapResult<bool> {
            self.record("isCapped")?;
            Ok(false)
        }

        fn sub_collection(&self, sub: &str) -> DocmapResult<Self> {
            self.record(&format!("getCollection {}", sub))?;
            Ok(RecordingDriver::default())
        }

        fn set_write_concern(&self, concern: WriteConcern) -> DocmapResult<()> {
            self.record(&format!("setWriteConcern {}", concern))
        }

        fn write_concern(&self) -> DocmapResult<WriteConcern> {
            self.record("getWriteConcern")?;
            Ok(WriteConcern::Journaled)
        }

        fn set_read_preference(&self, preference: ReadPreference) -> DocmapResult<()> {
            self.record(&format!("setReadPreference {}", preference))
        }

        fn read_preference(&self) -> DocmapResult<ReadPreference> {
            self.record("getReadPreference")?;
            Ok(ReadPreference::Nearest)
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Tag {
        id: String,
        label: String,
    }

    impl Entity for Tag {
        fn mapping() -> DocmapResult<EntityMapping<Self>> {
            EntityMapping::builder("Tag")
                .field(FieldMapping::new(
                    "id",
                    Converter::Identity,
                    |t: &Tag| t.id.to_value(),
                    |t: &mut Tag, v: &Value| {
                        t.id = String::from_value(v)?;
                        Ok(())
                    },
                ))
                .field(FieldMapping::new(
                    "label",
                    Converter::Passthrough,
                    |t: &Tag| t.label.to_value(),
                    |t: &mut Tag, v: &Value| {
                        t.label = String::from_value(v)?;
                        Ok(())
                    },
                ))
                .build()
        }
    }

    fn collection() -> Collection<RecordingDriver> {
        Collection::new(RecordingDriver::default())
    }

    #[test]
    fn test_log_format() {
        let pets = collection();
        let args = vec!["{\"age\":3}".to_string(), "true".to_string()];
        assert_eq!(pets.log_format("update", &args), "db.pet.update({\"age\":3}, true)");
        assert_eq!(pets.log_format("drop", &[]), "db.pet.drop()");
    }

    #[test]
    fn test_log_args() {
        assert_eq!(doc! { nm: "a", age: 3 }.log_arg(), r#"{"nm":"a","age":3}"#);
        assert_eq!(
            vec![doc! { a: 1 }, doc! { b: [1, 2] }].log_arg(),
            r#"[{"a":1},{"b":[1,2]}]"#
        );
        assert_eq!(None::<&Document>.log_arg(), "null");
        assert_eq!(Some(&WriteConcern::Majority).log_arg(), "MAJORITY");
        assert_eq!("name".log_arg(), "name");
        assert_eq!(12u64.log_arg(), "12");
        assert_eq!(Value::Null.log_arg(), "null");
    }

    #[test]
    fn test_names() {
        let pets = collection();
        assert_eq!(pets.name(), "pet");
        assert_eq!(pets.full_name(), "zoo.pet");
    }

    #[test]
    fn test_forwarding() {
        let pets = collection();
        let query = doc! { age: { "$gt": 12 } };

        assert_eq!(pets.insert_many(&mut [doc! {}, doc! {}]).unwrap().n(), 2);
        assert_eq!(pets.update_one(&query, &doc! {}).unwrap().n(), 1);
        assert_eq!(pets.update_multi(&query, &doc! {}).unwrap().n(), 3);
        assert_eq!(pets.upsert(&query, &doc! {}).unwrap().n(), 1);
        assert_eq!(pets.remove_by(&query).unwrap().n(), 1);
        assert_eq!(pets.find_all().unwrap().len(), 2);
        assert_eq!(pets.find_one_by(&query).unwrap(), Some(doc! { nm: "a" }));
        assert_eq!(pets.find_and_remove(&query).unwrap(), None);
        assert_eq!(pets.find_and_update(&query, &doc! {}).unwrap(), None);
        assert_eq!(pets.count_all().unwrap(), 42);
        assert_eq!(pets.distinct("age", &query).unwrap().len(), 2);
        pets.create_index(&doc! { nm: 1 }, &IndexOptions::unique_index()).unwrap();
        pets.drop_index("nm_1").unwrap();
        pets.drop_indexes().unwrap();
        assert_eq!(pets.index_info().unwrap().len(), 1);
        pets.rename("animal", false).unwrap();
        pets.drop().unwrap();

        assert_eq!(
            pets.driver().calls(),
            vec![
                "insert",
                "update upsert=false multi=false",
                "update upsert=false multi=true",
                "update upsert=true multi=false",
                "remove",
                "find {}",
                "findOne",
                "findAndModify remove=true update=false",
                "findAndModify remove=false update=true",
                "count",
                "distinct age",
                r#"createIndex {"unique":true}"#,
                "dropIndex nm_1",
                "dropIndexes",
                "getIndexInfo",
                "rename animal false",
                "drop",
            ]
        );
    }

    #[test]
    fn test_collection_level_forwarding() {
        let pets = collection();

        assert_eq!(pets.get_count(&doc! {}, None, 5, 2, None).unwrap(), 7);
        assert_eq!(
            pets.aggregate(&[doc! { "$match": {} }, doc! { "$count": "total" }])
                .unwrap(),
            vec![doc! { total: 3 }]
        );
        assert_eq!(pets.stats().unwrap().get_string("ns").unwrap(), "zoo.pet");
        assert!(!pets.is_capped().unwrap());
        pets.set_write_concern(WriteConcern::Majority).unwrap();
        assert_eq!(pets.write_concern().unwrap(), WriteConcern::Journaled);
        pets.set_read_preference(ReadPreference::Secondary).unwrap();
        assert_eq!(pets.read_preference().unwrap(), ReadPreference::Nearest);

        let kittens = pets.collection("kittens").unwrap();
        assert!(kittens.driver().calls().is_empty());

        assert_eq!(
            pets.driver().calls(),
            vec![
                "getCount 5 2",
                "aggregate 2",
                "getStats",
                "isCapped",
                "setWriteConcern MAJORITY",
                "getWriteConcern",
                "setReadPreference secondary",
                "getReadPreference",
                "getCollection kittens",
            ]
        );
    }

    #[test]
    fn test_driver_error_is_returned_unchanged() {
        let pets = Collection::new(RecordingDriver {
            calls: Mutex::new(Vec::new()),
            fail: true,
        });
        let err = pets.count_all().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DriverError);
        assert_eq!(err.message(), "connection refused");
    }

    #[test]
    fn test_insert_entity_writes_back_id() {
        let pets = collection();
        let mut tag = Tag {
            id: String::new(),
            label: "cute".to_string(),
        };
        pets.insert_entity(&mut tag).unwrap();
        assert!(ObjectId::is_valid(&tag.id));

        let before = tag.id.clone();
        pets.save_entity(&mut tag).unwrap();
        assert_eq!(tag.id, before);
    }

    #[test]
    fn test_find_as() {
        let pets = collection();
        let tags: Vec<Tag> = pets.find_as(&doc! {}, &FindOptions::new()).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|t| t.label.is_empty()));

        let one: Option<Tag> = pets.find_one_as(&doc! {}).unwrap();
        assert_eq!(one.unwrap().label, "");
    }
}
