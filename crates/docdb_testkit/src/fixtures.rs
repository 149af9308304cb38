//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use chrono::{DateTime, Utc};
use docdb_core::{
    parse_date, Config, Database, Document, MutableArray, MutableDictionary,
};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// The date stored under `"date"` by [`populate_document`].
pub const TEST_DATE: &str = "2017-01-01T00:00:00.000Z";

/// The blob content stored under `"blob"` by [`populate_document`].
pub const TEST_BLOB: &str = "i'm blob";

/// A test database over fresh in-memory stores.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new in-memory test database with custom configuration.
    pub fn with_config(config: Config) -> Self {
        init_tracing();
        Self {
            db: Database::open(config),
        }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::memory()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use docdb_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     assert_eq!(db.count().unwrap(), 0);
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Installs a `tracing` subscriber that honours `RUST_LOG` and writes
/// through the test harness. Safe to call from every test.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The fixed date stored by [`populate_document`].
pub fn test_date() -> DateTime<Utc> {
    parse_date(TEST_DATE).expect("test date is valid")
}

/// Sets the standard mixed-type fields on `doc`: booleans, a string,
/// integers, a float, a date, a null, a nested dictionary, an array and a
/// blob stored in `db`.
pub fn fill_standard_fields(db: &Database, doc: &Document) {
    doc.set("true", true).expect("set true");
    doc.set("false", false).expect("set false");
    doc.set("string", "string").expect("set string");
    doc.set("zero", 0).expect("set zero");
    doc.set("one", 1).expect("set one");
    doc.set("minus_one", -1).expect("set minus_one");
    doc.set("one_dot_one", 1.1).expect("set one_dot_one");
    doc.set("date", test_date()).expect("set date");
    doc.set("null", ()).expect("set null");

    let dict = MutableDictionary::new();
    dict.set("street", "1 Main street").expect("set street");
    dict.set("city", "Mountain View").expect("set city");
    dict.set("state", "CA").expect("set state");
    doc.set("dict", dict).expect("set dict");

    let array = MutableArray::new();
    array.append("650-123-0001").expect("append");
    array.append("650-123-0002").expect("append");
    doc.set("array", array).expect("set array");

    let blob = db
        .save_blob(Some("text/plain"), TEST_BLOB.as_bytes())
        .expect("save blob");
    doc.set("blob", blob).expect("set blob");
}

/// Creates, fills and saves a document with the standard mixed-type
/// fields. The returned document is bound to `db`.
pub fn populate_document(db: &Database, id: &str) -> Document {
    let mut doc = Document::with_id(id).expect("valid id");
    fill_standard_fields(db, &doc);
    db.save(&mut doc).expect("save populated document");
    doc
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a database holding `count` small documents `doc-0`, `doc-1`...
    pub fn populated_database(count: usize) -> TestDatabase {
        let test_db = TestDatabase::memory();
        for i in 0..count {
            let mut doc = Document::with_id(format!("doc-{i}")).expect("valid id");
            doc.set("index", i as i64).expect("set index");
            test_db.save(&mut doc).expect("save document");
        }
        test_db
    }

    /// Saves `{"count": 0}` under `id` and returns two independent handles
    /// on that same revision.
    pub fn diverged_pair(db: &Database, id: &str) -> (Document, Document) {
        let mut doc = Document::with_id(id).expect("valid id");
        doc.set("count", 0).expect("set count");
        db.save(&mut doc).expect("save base revision");

        let first = db.get_document(id).expect("read").expect("document exists");
        let second = db.get_document(id).expect("read").expect("document exists");
        (first, second)
    }
}
