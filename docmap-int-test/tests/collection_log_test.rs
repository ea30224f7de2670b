use docmap::collection::{
    Collection, FindAndModifyOptions, FindOptions, ReadPreference, WriteConcern,
};
use docmap::doc;
use docmap_int_test::test_util::MemoryDatabase;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

static LINES: Mutex<Vec<String>> = parking_lot::const_mutex(Vec::new());

/// Keeps every debug line so tests can inspect the traced calls.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Debug {
            LINES.lock().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

#[ctor::ctor]
fn init() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Debug);
}

/// Lines logged for the collection `name`.
fn traced(name: &str) -> Vec<String> {
    let prefix = format!("db.{}.", name);
    LINES
        .lock()
        .iter()
        .filter(|l| l.starts_with(&prefix))
        .cloned()
        .collect()
}

#[test]
fn test_insert_and_query_are_traced() {
    let db = MemoryDatabase::new("zoo");
    let pets = Collection::new(db.driver("trace_insert"));

    pets.insert(&mut [doc! { nm: "A", age: 3 }], Some(&WriteConcern::Majority))
        .unwrap();
    pets.count_by(&doc! { age: { "$gt": 12 } }).unwrap();
    pets.find(&doc! {}, Some(&doc! { nm: 1 }), &FindOptions::new().limit(2))
        .unwrap();

    let lines = traced("trace_insert");
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        r#"db.trace_insert.insert([{"nm":"A","age":3}], MAJORITY)"#
    );
    assert_eq!(
        lines[1],
        r#"db.trace_insert.count({"age":{"$gt":12}}, null)"#
    );
    assert_eq!(
        lines[2],
        r#"db.trace_insert.find({}, {"nm":1}, {"limit":2})"#
    );
}

#[test]
fn test_update_and_remove_are_traced() {
    let db = MemoryDatabase::new("zoo");
    let pets = Collection::new(db.driver("trace_update"));

    pets.update(&doc! { nm: "A" }, &doc! { "$set": { age: 4 } }, true, false, None)
        .unwrap();
    pets.update_multi(&doc! {}, &doc! { "$inc": { age: 1 } }).unwrap();
    pets.remove_by(&doc! { nm: "A" }).unwrap();
    pets.drop().unwrap();

    assert_eq!(
        traced("trace_update"),
        vec![
            r#"db.trace_update.update({"nm":"A"}, {"$set":{"age":4}}, true, false, null)"#,
            r#"db.trace_update.updateMulti({}, {"$inc":{"age":1}})"#,
            r#"db.trace_update.remove({"nm":"A"}, null)"#,
            "db.trace_update.drop()",
        ]
    );
}

#[test]
fn test_find_and_modify_is_traced() {
    let db = MemoryDatabase::new("zoo");
    let pets = Collection::new(db.driver("trace_modify"));

    let options = FindAndModifyOptions::new()
        .sort(doc! { age: (-1) })
        .return_new(true);
    pets.find_and_modify(&doc! { nm: "A" }, Some(&doc! { "$set": { age: 1 } }), &options)
        .unwrap();
    pets.find_and_remove(&doc! { nm: "A" }).unwrap();
    pets.distinct("nm", &doc! {}).unwrap();
    pets.rename("trace_renamed", false).unwrap();

    assert_eq!(
        traced("trace_modify"),
        vec![
            r#"db.trace_modify.findAndModify({"nm":"A"}, null, {"age":-1}, false, {"$set":{"age":1}}, true, false)"#,
            r#"db.trace_modify.findAndRemove({"nm":"A"})"#,
            r#"db.trace_modify.distinct(nm, {})"#,
            "db.trace_modify.rename(trace_renamed, false)",
        ]
    );
}

#[test]
fn test_object_ids_are_extended_json() {
    let db = MemoryDatabase::new("zoo");
    let pets = Collection::new(db.driver("trace_ids"));

    let mut doc = doc! { nm: "A" };
    doc.generate_id();
    let hex = doc.get_object_id("_id").unwrap().unwrap().to_hex();
    pets.save_one(&mut doc).unwrap();

    let lines = traced("trace_ids");
    assert_eq!(
        lines,
        vec![format!(
            r#"db.trace_ids.save({{"nm":"A","_id":{{"$oid":"{}"}}}}, null)"#,
            hex
        )]
    );
}

#[test]
fn test_collection_level_calls_are_traced() {
    let db = MemoryDatabase::new("zoo");
    let pets = Collection::new(db.driver("trace_admin"));

    pets.get_count(&doc! { nm: "A" }, Some(&doc! { nm: 1 }), 10, 2, None)
        .unwrap();
    pets.aggregate(&[doc! { "$match": { age: { "$gt": 1 } } }, doc! { "$count": "n" }])
        .unwrap();
    pets.stats().unwrap();
    pets.is_capped().unwrap();
    pets.set_write_concern(WriteConcern::Nodes(2)).unwrap();
    pets.write_concern().unwrap();
    pets.set_read_preference(ReadPreference::SecondaryPreferred)
        .unwrap();
    pets.read_preference().unwrap();
    let kittens = pets.collection("kittens").unwrap();
    kittens.count_all().unwrap();

    assert_eq!(
        traced("trace_admin"),
        vec![
            r#"db.trace_admin.getCount({"nm":"A"}, {"nm":1}, 10, 2, null)"#,
            r#"db.trace_admin.aggregate([{"$match":{"age":{"$gt":1}}},{"$count":"n"}])"#,
            "db.trace_admin.getStats()",
            "db.trace_admin.isCapped()",
            "db.trace_admin.setWriteConcern(W2)",
            "db.trace_admin.getWriteConcern()",
            "db.trace_admin.setReadPreference(secondaryPreferred)",
            "db.trace_admin.getReadPreference()",
            "db.trace_admin.getCollection(kittens)",
            "db.trace_admin.kittens.count({}, null)",
        ]
    );
}
