use std::str::FromStr as _;

use sqlx::{
    Sqlite, SqlitePool,
    pool::{PoolConnection, PoolOptions},
    sqlite::SqliteConnectOptions,
};
use tracing::error;

use super::LoadSummary;
use crate::sql::InsertStatement;

/// Pool-backed SQLite database used by the test suite. A single pooled
/// connection keeps `sqlite::memory:` databases alive between invocations.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

pub struct SqliteSession {
    conn: PoolConnection<Sqlite>,
}

impl SqliteDatabase {
    pub async fn open(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)
            .inspect_err(|error| error!(%error, %url, "Failed to open sqlite db"))?;
        let pool = PoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .inspect_err(|error| error!(%error, %url, "Failed to open sqlite db"))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl super::Database for SqliteDatabase {
    type Connection = SqliteSession;

    async fn connect(&self) -> Result<SqliteSession, sqlx::Error> {
        let conn = self.pool.acquire().await?;
        Ok(SqliteSession { conn })
    }
}

impl super::Connection for SqliteSession {
    type Error = sqlx::Error;

    // SQLITE_MAX_VARIABLE_NUMBER since 3.32
    const MAX_PARAMETERS: usize = 32_766;

    async fn insert_all(
        &mut self,
        statement: &InsertStatement,
        rows: &[Vec<String>],
        max_rows_per_statement: usize,
    ) -> Result<LoadSummary, Self::Error> {
        let chunk_size =
            statement.rows_per_statement(max_rows_per_statement, Self::MAX_PARAMETERS);
        super::insert_chunks::<Sqlite>(&mut *self.conn, statement, rows, chunk_size).await
    }

    /// Returns the connection to the pool instead of closing it.
    async fn close(self) -> Result<(), Self::Error> {
        drop(self.conn);
        Ok(())
    }
}
