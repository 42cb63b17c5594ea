use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use bytes::Bytes;
use serde_json::{Value, json};
use sqlx::prelude::FromRow;

use crate::{
    config,
    db::{
        Connection, Database, LoadSummary,
        sqlite::{SqliteDatabase, SqliteSession},
    },
    pipeline::Pipeline,
    response::Response,
    sql::InsertStatement,
    storage::{ObjectStore, memory::MemoryStore},
};

mod cleanup;

const BUCKET: &str = "uploads";
const KEY: &str = "incoming/people.csv";

#[derive(Default)]
struct Counters {
    fetches: AtomicUsize,
    connects: AtomicUsize,
    closes: AtomicUsize,
    // committed statements with their tuple counts
    statements: Mutex<Vec<(String, usize)>>,
}

impl Counters {
    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn statements(&self) -> Vec<(String, usize)> {
        self.statements.lock().unwrap().clone()
    }

    fn statement_sizes(&self) -> Vec<usize> {
        self.statements().into_iter().map(|(_, size)| size).collect()
    }
}

struct RecordingStore {
    inner: MemoryStore,
    counters: Arc<Counters>,
}

impl ObjectStore for RecordingStore {
    type Error = <MemoryStore as ObjectStore>::Error;

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, Self::Error> {
        self.counters.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.get(bucket, key).await
    }
}

struct TrackedDatabase {
    inner: SqliteDatabase,
    counters: Arc<Counters>,
}

struct TrackedConnection {
    inner: SqliteSession,
    counters: Arc<Counters>,
}

impl Database for TrackedDatabase {
    type Connection = TrackedConnection;

    async fn connect(&self) -> Result<TrackedConnection, sqlx::Error> {
        let inner = self.inner.connect().await?;
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(TrackedConnection {
            inner,
            counters: self.counters.clone(),
        })
    }
}

impl Connection for TrackedConnection {
    type Error = sqlx::Error;

    const MAX_PARAMETERS: usize = <SqliteSession as Connection>::MAX_PARAMETERS;

    async fn insert_all(
        &mut self,
        statement: &InsertStatement,
        rows: &[Vec<String>],
        max_rows_per_statement: usize,
    ) -> Result<LoadSummary, Self::Error> {
        let summary = self
            .inner
            .insert_all(statement, rows, max_rows_per_statement)
            .await?;
        self.counters.statements.lock().unwrap().extend(
            summary
                .statements
                .iter()
                .map(|&size| (statement.render(size), size)),
        );
        Ok(summary)
    }

    async fn close(self) -> Result<(), Self::Error> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

struct Harness {
    db: SqliteDatabase,
    counters: Arc<Counters>,
    pipeline: Pipeline<RecordingStore, TrackedDatabase>,
}

impl Harness {
    /// `objects` are stored in [`BUCKET`]. `flags` override the default
    /// configuration.
    async fn new(objects: &[(&str, &[u8])], flags: &[&str]) -> Self {
        let db = SqliteDatabase::open("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE people (name TEXT PRIMARY KEY, age TEXT NOT NULL)")
            .execute(db.pool())
            .await
            .unwrap();
        let store = MemoryStore::new();
        for (key, body) in objects {
            store
                .put(BUCKET, *key, Bytes::copy_from_slice(body))
                .await;
        }
        let counters = Arc::new(Counters::default());
        let pipeline = Pipeline::new(
            &config::test::config(flags),
            RecordingStore {
                inner: store,
                counters: counters.clone(),
            },
            TrackedDatabase {
                inner: db.clone(),
                counters: counters.clone(),
            },
        )
        .unwrap();
        Self {
            db,
            counters,
            pipeline,
        }
    }

    async fn with_csv(csv: &str) -> Self {
        Self::new(&[(KEY, csv.as_bytes())], &[]).await
    }

    async fn handle_upload(&self) -> Response {
        self.pipeline.handle(&notification(KEY)).await
    }

    async fn people(&self) -> Vec<Person> {
        sqlx::query_as::<_, Person>("SELECT name, age FROM people ORDER BY rowid ASC")
            .fetch_all(self.db.pool())
            .await
            .unwrap()
    }
}

#[derive(FromRow, Debug, PartialEq, Eq)]
struct Person {
    name: String,
    age: String,
}

fn person(name: &str, age: &str) -> Person {
    Person {
        name: name.into(),
        age: age.into(),
    }
}

fn notification(key: &str) -> Value {
    json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "awsRegion": "us-east-1",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "s3SchemaVersion": "1.0",
                "bucket": { "name": BUCKET, "arn": "arn:aws:s3:::uploads" },
                "object": { "key": key, "size": 28 }
            }
        }]
    })
}

fn assert_failure(response: &Response, needle: &str) {
    assert_eq!(response.status_code, 500, "{response:?}");
    assert!(response.body.starts_with("\"Error: "), "{response:?}");
    assert!(response.body.contains(needle), "{response:?}");
}

#[tokio::test]
async fn test_load() {
    let harness = Harness::with_csv("name,age\nAlice,30\nBob,25\n").await;
    let response = harness.handle_upload().await;
    assert_eq!(response, Response::success());
    assert_eq!(
        harness.people().await,
        [person("Alice", "30"), person("Bob", "25")]
    );
    assert_eq!(
        harness.counters.statements(),
        [(
            "INSERT INTO `people` (`name`, `age`) VALUES (?, ?), (?, ?)".to_string(),
            2
        )]
    );
    assert_eq!(harness.counters.fetches(), 1);
    assert_eq!(harness.counters.connects(), 1);
    assert_eq!(harness.counters.closes(), 1);
}

#[tokio::test]
async fn test_header_order_is_column_order() {
    let harness = Harness::with_csv("age,name\n30,Alice\n25,Bob\n").await;
    assert_eq!(harness.handle_upload().await, Response::success());
    assert_eq!(
        harness.people().await,
        [person("Alice", "30"), person("Bob", "25")]
    );
}

#[tokio::test]
async fn test_quoted_values() {
    let harness =
        Harness::with_csv("name,age\n\"Smith, Jane\",41\n\"O\"\"Brien\",\"3\n9\"\n").await;
    assert_eq!(harness.handle_upload().await, Response::success());
    assert_eq!(
        harness.people().await,
        [person("Smith, Jane", "41"), person("O\"Brien", "3\n9")]
    );
}

#[tokio::test]
async fn test_header_only_loads_nothing() {
    let harness = Harness::with_csv("name,age\n").await;
    assert_eq!(harness.handle_upload().await, Response::success());
    assert!(harness.people().await.is_empty());
    assert!(harness.counters.statements().is_empty());
    assert_eq!(harness.counters.connects(), 1);
    assert_eq!(harness.counters.closes(), 1);
}

#[tokio::test]
async fn test_encoded_key() {
    let harness = Harness::new(
        &[("incoming/new people.csv", "name,age\nAlice,30\n".as_bytes())],
        &[],
    )
    .await;
    let response = harness
        .pipeline
        .handle(&notification("incoming/new+people.csv"))
        .await;
    assert_eq!(response, Response::success());
    assert_eq!(harness.people().await, [person("Alice", "30")]);
}

#[tokio::test]
async fn test_chunked_load() {
    let harness = Harness::new(
        &[(KEY, "name,age\na,1\nb,2\nc,3\nd,4\ne,5\n".as_bytes())],
        &["--max-rows-per-statement", "2"],
    )
    .await;
    assert_eq!(harness.handle_upload().await, Response::success());
    let names = harness
        .people()
        .await
        .into_iter()
        .map(|person| person.name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["a", "b", "c", "d", "e"]);
    assert_eq!(harness.counters.statement_sizes(), [2, 2, 1]);
    assert_eq!(harness.counters.connects(), 1);
    assert_eq!(harness.counters.closes(), 1);
}

#[tokio::test]
async fn test_chunked_load_is_atomic() {
    let harness = Harness::new(
        &[(KEY, "name,age\na,1\nb,2\nc,3\nd,4\na,5\n".as_bytes())],
        &["--max-rows-per-statement", "2"],
    )
    .await;
    let response = harness.handle_upload().await;
    assert_failure(&response, "UNIQUE constraint failed");
    assert!(harness.people().await.is_empty());
}

#[tokio::test]
async fn test_allowed_columns() {
    let harness = Harness::new(
        &[(KEY, "NAME,Age\nAlice,30\n".as_bytes())],
        &["--allowed-columns", "name,age"],
    )
    .await;
    assert_eq!(harness.handle_upload().await, Response::success());
    assert_eq!(harness.people().await, [person("Alice", "30")]);
}
