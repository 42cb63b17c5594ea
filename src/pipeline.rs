//! The per-event pipeline: validate, fetch, parse, load, report.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    config::{self, Config},
    db::{Connection, Database, LoadSummary},
    event::{self, ObjectRef},
    response::Response,
    sql::{ColumnPolicy, Identifier, IdentifierError, InsertStatement},
    storage::ObjectStore,
    table::{ParseError, Table},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures after the event passed validation. All of them are reported as
/// 500; the kind only shows up in logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to fetch object: {0}")]
    Fetch(BoxError),
    #[error("object is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
    #[error("failed to parse CSV: {0}")]
    Parse(#[from] ParseError),
    #[error("rejected column name: {0}")]
    Identifier(#[from] IdentifierError),
    #[error("failed to connect to database: {0}")]
    Connect(BoxError),
    #[error("failed to insert rows: {0}")]
    Load(BoxError),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Decode(_) => "decode",
            Self::Parse(_) => "parse",
            Self::Identifier(_) => "identifier",
            Self::Connect(_) => "connect",
            Self::Load(_) => "load",
        }
    }
}

pub struct Pipeline<S, D> {
    bucket: String,
    table: Identifier,
    columns: ColumnPolicy,
    max_rows_per_statement: usize,
    store: S,
    database: D,
}

impl<S: ObjectStore, D: Database> Pipeline<S, D> {
    /// Validates `config` up front so that a bad setting fails before the
    /// first event.
    pub fn new(config: &Config, store: S, database: D) -> Result<Self, config::Error> {
        config.validate()?;
        Ok(Self {
            bucket: config.bucket.clone(),
            table: config.table_identifier()?,
            columns: config.column_policy()?,
            max_rows_per_statement: config.max_rows_per_statement,
            store,
            database,
        })
    }

    /// Runs one invocation. Never fails; every outcome is a [`Response`].
    pub async fn handle(&self, event: &Value) -> Response {
        let object = match event::first_object(event) {
            Ok(object) => object,
            Err(reason) => {
                warn!(%reason, %event, "Event does not have the expected structure");
                return Response::invalid_event();
            }
        };
        if let Some(bucket) = object
            .bucket
            .as_deref()
            .filter(|bucket| *bucket != self.bucket)
        {
            warn!(
                event_bucket = bucket,
                bucket = %self.bucket,
                "Event names another bucket; reading from the configured one"
            );
        }
        match self.load(&object).await {
            Ok(summary) => {
                info!(
                    key = %object.key,
                    rows = summary.rows(),
                    statements = summary.statements.len(),
                    "Data inserted"
                );
                Response::success()
            }
            Err(error) => {
                error!(
                    %error,
                    kind = error.kind(),
                    key = %object.key,
                    "Failed to load object"
                );
                Response::failure(&error)
            }
        }
    }

    #[tracing::instrument(skip_all, fields(bucket = %self.bucket, key = %object.key))]
    async fn load(&self, object: &ObjectRef) -> Result<LoadSummary, Error> {
        let blob = self
            .store
            .get(&self.bucket, &object.key)
            .await
            .map_err(|error| Error::Fetch(Box::new(error)))?;
        let table = Table::parse(std::str::from_utf8(&blob)?)?;
        let columns = self.columns.columns(&table.header)?;
        let statement = InsertStatement::new(self.table.clone(), columns);

        let mut conn = self
            .database
            .connect()
            .await
            .map_err(|error| Error::Connect(Box::new(error)))?;
        let result = conn
            .insert_all(&statement, &table.rows, self.max_rows_per_statement)
            .await;
        if let Err(error) = conn.close().await {
            warn!(%error, "Failed to close database connection");
        }
        result.map_err(|error| Error::Load(Box::new(error)))
    }
}
