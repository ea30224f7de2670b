use docmap::collection::{
    Collection, CollectionDriver, Document, FindAndModifyOptions, FindOptions, IndexOptions,
    ReadPreference, WriteConcern, WriteResult,
};
use docmap::common::{Value, DOC_ID};
use docmap::errors::{DocmapError, DocmapResult, ErrorKind};
use parking_lot::RwLock;
use std::backtrace::Backtrace;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Runs a test between a `before` and an `after` step, reporting errors and
/// panics with the backtrace captured at the start of the run.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> DocmapResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> DocmapResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> DocmapResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", msg), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");
    panic!("{}", error);
}

/// A fresh in-memory database with one `pet` collection.
#[derive(Clone)]
pub struct TestContext {
    db: MemoryDatabase,
    pets: Arc<Collection<MemoryDriver>>,
}

impl TestContext {
    pub fn db(&self) -> MemoryDatabase {
        self.db.clone()
    }

    pub fn pets(&self) -> Arc<Collection<MemoryDriver>> {
        self.pets.clone()
    }
}

pub fn create_test_context() -> DocmapResult<TestContext> {
    let db = MemoryDatabase::new("zoo");
    let pets = Arc::new(Collection::new(db.driver("pet")));
    Ok(TestContext { db, pets })
}

pub fn cleanup(ctx: TestContext) -> DocmapResult<()> {
    Collection::drop(&ctx.pets)
}

fn driver_error(message: &str) -> DocmapError {
    log::error!("{}", message);
    DocmapError::new(message, ErrorKind::DriverError)
}

#[derive(Default)]
struct StoredCollection {
    docs: Vec<Document>,
    indexes: Vec<Document>,
}

/// A named set of in-memory collections shared by its drivers.
#[derive(Clone)]
pub struct MemoryDatabase {
    name: String,
    collections: Arc<RwLock<HashMap<String, StoredCollection>>>,
}

impl MemoryDatabase {
    pub fn new(name: &str) -> Self {
        MemoryDatabase {
            name: name.to_string(),
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A driver for the collection `name`. The collection is created on
    /// first write.
    pub fn driver(&self, name: &str) -> MemoryDriver {
        MemoryDriver {
            name: name.to_string(),
            db: self.clone(),
            write_concern: Arc::new(RwLock::new(WriteConcern::default())),
            read_preference: Arc::new(RwLock::new(ReadPreference::default())),
        }
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// A [CollectionDriver] over a [MemoryDatabase].
///
/// Queries support equality on dotted paths (an array field matches when it
/// contains the value) and the operators `$gt $gte $lt $lte $ne $in $nin
/// $exists`. Updates are either replacement documents or use `$set $unset
/// $inc $push`. Aggregation pipelines accept the stages `$match $sort $skip
/// $limit $project $count`.
///
/// Default write concern and read preference are kept per handle and only
/// reported back; a sub-collection starts with its parent's defaults.
pub struct MemoryDriver {
    name: String,
    db: MemoryDatabase,
    write_concern: Arc<RwLock<WriteConcern>>,
    read_preference: Arc<RwLock<ReadPreference>>,
}

impl MemoryDriver {
    fn read<R>(&self, f: impl FnOnce(Option<&StoredCollection>) -> R) -> R {
        let collections = self.db.collections.read();
        f(collections.get(&self.name))
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoredCollection) -> R) -> R {
        let mut collections = self.db.collections.write();
        f(collections.entry(self.name.clone()).or_default())
    }

    fn matching(&self, query: &Document) -> DocmapResult<Vec<Document>> {
        self.read(|stored| {
            let mut result = Vec::new();
            if let Some(stored) = stored {
                for doc in &stored.docs {
                    if matches(doc, query)? {
                        result.push(doc.clone());
                    }
                }
            }
            Ok(result)
        })
    }
}

impl CollectionDriver for MemoryDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> String {
        format!("{}.{}", self.db.name, self.name)
    }

    fn insert(
        &self,
        docs: &mut [Document],
        _concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult> {
        self.write(|stored| {
            for doc in docs.iter_mut() {
                doc.generate_id();
                if stored.docs.iter().any(|d| d.id() == doc.id()) {
                    return Err(driver_error(&format!(
                        "duplicate key error, _id {}",
                        doc.id().map(|id| id.to_string()).unwrap_or_default()
                    )));
                }
                stored.docs.push(doc.clone());
            }
            Ok(WriteResult::new(docs.len() as u64))
        })
    }

    fn update(
        &self,
        query: &Document,
        update: &Document,
        upsert: bool,
        multi: bool,
        _concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult> {
        self.write(|stored| {
            let mut n = 0;
            for doc in stored.docs.iter_mut() {
                if matches(doc, query)? {
                    *doc = apply_update(doc, update)?;
                    n += 1;
                    if !multi {
                        break;
                    }
                }
            }

            if n == 0 && upsert {
                let mut doc = apply_update(&upsert_seed(query), update)?;
                doc.generate_id();
                let id = doc.get(DOC_ID).cloned().unwrap_or(Value::Null);
                stored.docs.push(doc);
                return Ok(WriteResult::upserted(id));
            }
            Ok(WriteResult::new(n))
        })
    }

    fn remove(
        &self,
        query: &Document,
        _concern: Option<&WriteConcern>,
    ) -> DocmapResult<WriteResult> {
        self.write(|stored| {
            let before = stored.docs.len();
            let mut hits = Vec::with_capacity(before);
            for doc in &stored.docs {
                hits.push(matches(doc, query)?);
            }
            let mut hits = hits.into_iter();
            stored.docs.retain(|_| !hits.next().unwrap_or(false));
            Ok(WriteResult::new((before - stored.docs.len()) as u64))
        })
    }

    fn save(&self, doc: &mut Document, _concern: Option<&WriteConcern>) -> DocmapResult<WriteResult> {
        doc.generate_id();
        self.write(|stored| {
            match stored.docs.iter_mut().find(|d| d.id() == doc.id()) {
                Some(existing) => *existing = doc.clone(),
                None => stored.docs.push(doc.clone()),
            }
            Ok(WriteResult::new(1))
        })
    }

    fn find(
        &self,
        query: &Document,
        projection: Option<&Document>,
        options: &FindOptions,
    ) -> DocmapResult<Vec<Document>> {
        let mut docs = self.matching(query)?;
        if let Some(sort) = options.get_sort() {
            sort_docs(&mut docs, sort);
        }

        let docs = docs
            .into_iter()
            .skip(options.get_skip() as usize)
            .take(options.get_limit().map_or(usize::MAX, |l| l as usize));
        Ok(docs.map(|d| project(d, projection)).collect())
    }

    fn find_one(
        &self,
        query: &Document,
        projection: Option<&Document>,
        sort: Option<&Document>,
        _read_pref: Option<&ReadPreference>,
    ) -> DocmapResult<Option<Document>> {
        let mut docs = self.matching(query)?;
        if let Some(sort) = sort {
            sort_docs(&mut docs, sort);
        }
        Ok(docs.into_iter().next().map(|d| project(d, projection)))
    }

    fn find_and_modify(
        &self,
        query: &Document,
        update: Option<&Document>,
        options: &FindAndModifyOptions,
    ) -> DocmapResult<Option<Document>> {
        let mut docs = self.matching(query)?;
        if let Some(sort) = options.get_sort() {
            sort_docs(&mut docs, sort);
        }

        let found = match docs.into_iter().next() {
            Some(found) => found,
            None => {
                if options.is_upsert() && !options.is_remove() {
                    let empty = Document::new();
                    let mut doc = apply_update(&upsert_seed(query), update.unwrap_or(&empty))?;
                    self.insert(std::slice::from_mut(&mut doc), None)?;
                    if options.is_return_new() {
                        return Ok(Some(project(doc, options.get_fields())));
                    }
                }
                return Ok(None);
            }
        };

        let target = found.id().cloned();
        if options.is_remove() {
            self.write(|stored| stored.docs.retain(|d| d.id() != target.as_ref()));
            return Ok(Some(project(found, options.get_fields())));
        }

        let updated = match update {
            Some(update) => apply_update(&found, update)?,
            None => found.clone(),
        };
        self.write(|stored| {
            if let Some(doc) = stored.docs.iter_mut().find(|d| d.id() == target.as_ref()) {
                *doc = updated.clone();
            }
        });

        let result = if options.is_return_new() { updated } else { found };
        Ok(Some(project(result, options.get_fields())))
    }

    fn count(&self, query: &Document, _read_pref: Option<&ReadPreference>) -> DocmapResult<u64> {
        Ok(self.matching(query)?.len() as u64)
    }

    fn distinct(&self, key: &str, query: &Document) -> DocmapResult<Vec<Value>> {
        let mut values: Vec<Value> = Vec::new();
        for doc in self.matching(query)? {
            let found = match doc.get_path(key) {
                Value::Array(items) => items,
                Value::Null => continue,
                other => vec![other],
            };
            for value in found {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    fn create_index(&self, keys: &Document, options: &IndexOptions) -> DocmapResult<()> {
        let name = match options.get_name() {
            Some(name) => name.to_string(),
            None => keys.iter().map(|(k, v)| format!("{}_{}", k, v)).collect::<Vec<_>>().join("_"),
        };
        self.write(|stored| {
            if stored.indexes.iter().any(|i| i.get_string("name").ok().as_deref() == Some(name.as_str())) {
                return Ok(());
            }
            let mut index = options.to_document();
            index.put("name", name.as_str())?;
            index.put("key", keys.clone())?;
            stored.indexes.push(index);
            Ok(())
        })
    }

    fn drop_index(&self, name: &str) -> DocmapResult<()> {
        self.write(|stored| {
            let before = stored.indexes.len();
            stored
                .indexes
                .retain(|i| i.get_string("name").ok().as_deref() != Some(name));
            if stored.indexes.len() == before {
                return Err(driver_error(&format!("index not found with name [{}]", name)));
            }
            Ok(())
        })
    }

    fn drop_indexes(&self) -> DocmapResult<()> {
        self.write(|stored| stored.indexes.clear());
        Ok(())
    }

    fn index_info(&self) -> DocmapResult<Vec<Document>> {
        let mut info = vec![docmap::doc! { name: "_id_", key: { "_id": 1 } }];
        self.read(|stored| {
            if let Some(stored) = stored {
                info.extend(stored.indexes.iter().cloned());
            }
        });
        Ok(info)
    }

    fn drop(&self) -> DocmapResult<()> {
        self.db.collections.write().remove(&self.name);
        Ok(())
    }

    fn rename(&self, new_name: &str, drop_target: bool) -> DocmapResult<()> {
        let mut collections = self.db.collections.write();
        if collections.contains_key(new_name) && !drop_target {
            return Err(driver_error(&format!("target namespace exists: {}", new_name)));
        }
        let stored = collections.remove(&self.name).unwrap_or_default();
        collections.insert(new_name.to_string(), stored);
        Ok(())
    }

    fn get_count(
        &self,
        query: &Document,
        _fields: Option<&Document>,
        limit: u64,
        skip: u64,
        _read_pref: Option<&ReadPreference>,
    ) -> DocmapResult<u64> {
        let total = self.matching(query)?.len() as u64;
        let count = total.saturating_sub(skip);
        Ok(if limit == 0 { count } else { count.min(limit) })
    }

    fn aggregate(&self, pipeline: &[Document]) -> DocmapResult<Vec<Document>> {
        let mut docs = self.matching(&Document::new())?;
        for stage in pipeline {
            docs = apply_stage(docs, stage)?;
        }
        Ok(docs)
    }

    fn stats(&self) -> DocmapResult<Document> {
        let (count, indexes) = self.read(|stored| {
            stored.map_or((0, 0), |s| (s.docs.len() as i64, s.indexes.len() as i64))
        });
        let mut stats = Document::new();
        stats
            .put("ns", self.full_name())?
            .put("count", count)?
            .put("nindexes", indexes + 1)?
            .put("capped", false)?;
        Ok(stats)
    }

    fn is_capped(&self) -> DocmapResult<bool> {
        Ok(false)
    }

    fn sub_collection(&self, sub: &str) -> DocmapResult<Self> {
        if sub.is_empty() {
            return Err(driver_error("invalid collection name: empty"));
        }
        Ok(MemoryDriver {
            name: format!("{}.{}", self.name, sub),
            db: self.db.clone(),
            write_concern: Arc::new(RwLock::new(*self.write_concern.read())),
            read_preference: Arc::new(RwLock::new(*self.read_preference.read())),
        })
    }

    fn set_write_concern(&self, concern: WriteConcern) -> DocmapResult<()> {
        *self.write_concern.write() = concern;
        Ok(())
    }

    fn write_concern(&self) -> DocmapResult<WriteConcern> {
        Ok(*self.write_concern.read())
    }

    fn set_read_preference(&self, preference: ReadPreference) -> DocmapResult<()> {
        *self.read_preference.write() = preference;
        Ok(())
    }

    fn read_preference(&self) -> DocmapResult<ReadPreference> {
        Ok(*self.read_preference.read())
    }
}

fn apply_stage(docs: Vec<Document>, stage: &Document) -> DocmapResult<Vec<Document>> {
    let mut entries = stage.iter();
    let (op, arg) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(driver_error(&format!(
                "a pipeline stage must have exactly one field: {}",
                stage
            )))
        }
    };

    let count_arg = |arg: &Value| {
        arg.as_integer()
            .filter(|n| *n >= 0)
            .map(|n| n as usize)
            .ok_or_else(|| driver_error(&format!("{} expects a non-negative integer", op)))
    };

    match (op.as_str(), arg) {
        ("$match", Value::Document(query)) => {
            let mut kept = Vec::with_capacity(docs.len());
            for doc in docs {
                if matches(&doc, query)? {
                    kept.push(doc);
                }
            }
            Ok(kept)
        }
        ("$sort", Value::Document(sort)) => {
            let mut docs = docs;
            sort_docs(&mut docs, sort);
            Ok(docs)
        }
        ("$skip", n) => Ok(docs.into_iter().skip(count_arg(n)?).collect()),
        ("$limit", n) => Ok(docs.into_iter().take(count_arg(n)?).collect()),
        ("$project", Value::Document(projection)) => Ok(docs
            .into_iter()
            .map(|d| project(d, Some(projection)))
            .collect()),
        ("$count", Value::String(field)) => {
            let mut result = Document::new();
            result.put(field, docs.len() as i64)?;
            Ok(vec![result])
        }
        _ => Err(driver_error(&format!("unsupported pipeline stage {}", stage))),
    }
}

fn is_operator_doc(value: &Value) -> bool {
    match value {
        Value::Document(doc) => !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches(doc: &Document, query: &Document) -> DocmapResult<bool> {
    for (path, condition) in query.iter() {
        let actual = doc.get_path(path);
        let ok = match condition {
            Value::Document(ops) if is_operator_doc(condition) => {
                let mut all = true;
                for (op, operand) in ops.iter() {
                    if !eval_operator(op, &actual, operand, doc.has(path))? {
                        all = false;
                        break;
                    }
                }
                all
            }
            _ => equals(&actual, condition),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Array(items), expected) if !expected.is_array() => items.contains(expected),
        _ => actual == expected,
    }
}

fn compare(actual: &Value, operand: &Value, accept: fn(Ordering) -> bool) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|i| compare(i, operand, accept)),
        _ => actual.partial_cmp(operand).is_some_and(accept),
    }
}

fn eval_operator(op: &str, actual: &Value, operand: &Value, present: bool) -> DocmapResult<bool> {
    let result = match op {
        "$gt" => compare(actual, operand, |o| o == Ordering::Greater),
        "$gte" => compare(actual, operand, |o| o != Ordering::Less),
        "$lt" => compare(actual, operand, |o| o == Ordering::Less),
        "$lte" => compare(actual, operand, |o| o != Ordering::Greater),
        "$ne" => !equals(actual, operand),
        "$in" | "$nin" => {
            let candidates = operand
                .as_array()
                .ok_or_else(|| driver_error(&format!("{} needs an array", op)))?;
            let found = candidates.iter().any(|c| equals(actual, c));
            if op == "$in" {
                found
            } else {
                !found
            }
        }
        "$exists" => operand.as_bool().unwrap_or(true) == (present || !actual.is_null()),
        other => return Err(driver_error(&format!("unknown operator {}", other))),
    };
    Ok(result)
}

/// The plain equality fields of a query, used as the base of an upsert.
fn upsert_seed(query: &Document) -> Document {
    let mut seed = Document::new();
    for (key, value) in query.iter() {
        if !key.starts_with('$') && !key.contains('.') && !is_operator_doc(value) {
            let _ = seed.put(key, value.clone());
        }
    }
    seed
}

fn apply_update(doc: &Document, update: &Document) -> DocmapResult<Document> {
    if !update.keys().any(|k| k.starts_with('$')) {
        let mut replaced = update.clone();
        if let Some(id) = doc.get(DOC_ID) {
            replaced.put(DOC_ID, id.clone())?;
        }
        return Ok(replaced);
    }

    let mut result = doc.clone();
    for (op, fields) in update.iter() {
        let fields = fields
            .as_document()
            .ok_or_else(|| driver_error(&format!("{} needs a document", op)))?;
        for (path, value) in fields.iter() {
            match op.as_str() {
                "$set" => set_path(&mut result, path, value.clone())?,
                "$unset" => {
                    result.remove(path);
                }
                "$inc" => {
                    let current = result.get_path(path);
                    let sum = match (&current, value) {
                        (Value::F64(_), _) | (_, Value::F64(_)) => Value::from(
                            current.as_decimal().unwrap_or(0.0) + value.as_decimal().unwrap_or(0.0),
                        ),
                        _ => Value::from(
                            current.as_integer().unwrap_or(0) + value.as_integer().unwrap_or(0),
                        ),
                    };
                    set_path(&mut result, path, sum)?;
                }
                "$push" => {
                    let mut items = match result.get_path(path) {
                        Value::Array(items) => items,
                        Value::Null => Vec::new(),
                        other => {
                            return Err(driver_error(&format!(
                                "cannot push to non-array field {} ({})",
                                path,
                                other.type_name()
                            )))
                        }
                    };
                    items.push(value.clone());
                    set_path(&mut result, path, Value::Array(items))?;
                }
                other => return Err(driver_error(&format!("unknown update operator {}", other))),
            }
        }
    }
    Ok(result)
}

fn set_path(doc: &mut Document, path: &str, value: Value) -> DocmapResult<()> {
    match path.split_once('.') {
        None => {
            doc.put(path, value)?;
            Ok(())
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Value::Document(_))) {
                doc.put(head, Document::new())?;
            }
            match doc.get_mut(head).and_then(|v| v.as_document_mut()) {
                Some(inner) => set_path(inner, rest, value),
                None => Err(driver_error(&format!("cannot set {}", path))),
            }
        }
    }
}

fn sort_docs(docs: &mut [Document], sort: &Document) {
    docs.sort_by(|a, b| {
        for (path, direction) in sort.iter() {
            let ordering = a
                .get_path(path)
                .partial_cmp(&b.get_path(path))
                .unwrap_or(Ordering::Equal);
            let ordering = if direction.as_integer().unwrap_or(1) < 0 {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn project(doc: Document, projection: Option<&Document>) -> Document {
    let projection = match projection {
        Some(p) if !p.is_empty() => p,
        _ => return doc,
    };

    let mut result = Document::new();
    for (key, value) in doc.iter() {
        let keep = key == DOC_ID
            || projection
                .get(key)
                .is_some_and(|v| v.as_integer().unwrap_or(0) != 0 || v.as_bool() == Some(true));
        if keep {
            let _ = result.put(key, value.clone());
        }
    }
    result
}
