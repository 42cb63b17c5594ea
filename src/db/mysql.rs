use sqlx::{
    Connection as _,
    mysql::{MySqlConnectOptions, MySqlConnection},
};
use tracing::error;

use super::LoadSummary;
use crate::{config::Config, sql::InsertStatement};

/// Connection settings for the target MySQL database. No connection is held
/// between invocations.
#[derive(Clone)]
pub struct MySqlDatabase {
    options: MySqlConnectOptions,
}

pub struct MySqlSession {
    conn: MySqlConnection,
}

impl MySqlDatabase {
    pub fn new(options: MySqlConnectOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            MySqlConnectOptions::new()
                .host(&config.db_host)
                .port(config.db_port)
                .username(&config.db_user)
                .password(&config.db_password)
                .database(&config.db_name),
        )
    }
}

impl super::Database for MySqlDatabase {
    type Connection = MySqlSession;

    async fn connect(&self) -> Result<MySqlSession, sqlx::Error> {
        let conn = MySqlConnection::connect_with(&self.options)
            .await
            .inspect_err(|error| error!(%error, "Failed to connect to database"))?;
        Ok(MySqlSession { conn })
    }
}

impl super::Connection for MySqlSession {
    type Error = sqlx::Error;

    const MAX_PARAMETERS: usize = 65_535;

    async fn insert_all(
        &mut self,
        statement: &InsertStatement,
        rows: &[Vec<String>],
        max_rows_per_statement: usize,
    ) -> Result<LoadSummary, Self::Error> {
        let chunk_size =
            statement.rows_per_statement(max_rows_per_statement, Self::MAX_PARAMETERS);
        super::insert_chunks::<sqlx::MySql>(&mut self.conn, statement, rows, chunk_size).await
    }

    async fn close(self) -> Result<(), Self::Error> {
        self.conn.close().await
    }
}
