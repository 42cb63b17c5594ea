//! Bulk loading into a relational table
//!
//! A [`Database`] hands out one [`Connection`] per invocation. The connection
//! inserts all rows inside a single transaction and is consumed by
//! [`Connection::close`], so it can be released at most once.

pub mod mysql;
pub mod sqlite;

use tracing::{debug, error};

use crate::sql::InsertStatement;

pub trait Database {
    type Connection: Connection;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<Self::Connection, <Self::Connection as Connection>::Error>>;
}

/// What a committed load executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Value tuples carried by each INSERT, in execution order.
    pub statements: Vec<usize>,
}

impl LoadSummary {
    pub fn rows(&self) -> usize {
        self.statements.iter().sum()
    }
}

pub trait Connection {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Bind parameter limit of a single statement.
    const MAX_PARAMETERS: usize;

    /// Inserts `rows` with as few statements as the limits allow and commits
    /// once. Nothing is committed on error.
    fn insert_all(
        &mut self,
        statement: &InsertStatement,
        rows: &[Vec<String>],
        max_rows_per_statement: usize,
    ) -> impl Future<Output = Result<LoadSummary, Self::Error>>;

    fn close(self) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Runs `rows` through `statement` in chunks of at most `chunk_size` tuples,
/// all inside one transaction on `conn`.
pub(crate) async fn insert_chunks<DB>(
    conn: &mut DB::Connection,
    statement: &InsertStatement,
    rows: &[Vec<String>],
    chunk_size: usize,
) -> Result<LoadSummary, sqlx::Error>
where
    DB: sqlx::Database,
    for<'q> &'q str: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    for<'q> DB::Arguments<'q>: sqlx::IntoArguments<'q, DB>,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
{
    let mut tx = sqlx::Connection::begin(conn).await?;
    let mut summary = LoadSummary::default();
    for chunk in rows.chunks(chunk_size.max(1)) {
        let sql = statement.render(chunk.len());
        let query = chunk
            .iter()
            .flatten()
            .fold(sqlx::query::<DB>(&sql), |query, value| {
                query.bind(value.as_str())
            });
        query
            .execute(&mut *tx)
            .await
            .inspect_err(|error| error!(%error, rows = chunk.len(), "Insert failed"))?;
        debug!(rows = chunk.len(), "Inserted chunk");
        summary.statements.push(chunk.len());
    }
    tx.commit().await?;
    Ok(summary)
}
