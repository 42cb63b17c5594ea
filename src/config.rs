//! Invocation settings
//!
//! Every setting can be passed as a flag or through the environment variable
//! named next to it. Required settings have no default, so a missing one stops
//! the process before the first event is accepted.

use clap::Parser;
use derive_debug::Dbg;

use crate::sql::{ColumnPolicy, Identifier, IdentifierError};

#[derive(Parser, Dbg, Clone)]
pub struct Config {
    /// Bucket the uploaded CSV objects are read from
    #[clap(long, env = "S3_BUCKET")]
    pub bucket: String,
    #[clap(long, env = "RDS_HOST")]
    pub db_host: String,
    #[clap(long, env = "RDS_PORT", default_value_t = 3306)]
    pub db_port: u16,
    #[clap(long, env = "RDS_USER")]
    pub db_user: String,
    #[clap(long, env = "RDS_PASSWORD", hide_env_values = true)]
    #[dbg(skip)]
    pub db_password: String,
    #[clap(long, env = "RDS_DB_NAME")]
    pub db_name: String,
    /// Table the rows are inserted into
    #[clap(long, env = "RDS_TABLE_NAME")]
    pub table: String,
    /// Columns a CSV header may name. Any well-formed identifier if empty
    #[clap(long, env = "ALLOWED_COLUMNS", value_delimiter = ',')]
    pub allowed_columns: Vec<String>,
    /// Upper bound of value tuples per INSERT statement
    #[clap(long, env = "MAX_ROWS_PER_STATEMENT", default_value_t = 1000)]
    pub max_rows_per_statement: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("invalid table name: {0}")]
    Table(IdentifierError),
    #[error("invalid allowed column: {0}")]
    AllowedColumn(IdentifierError),
    #[error("max_rows_per_statement must be positive")]
    ZeroRowsPerStatement,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("bucket", &self.bucket),
            ("db_host", &self.db_host),
            ("db_user", &self.db_user),
            ("db_password", &self.db_password),
            ("db_name", &self.db_name),
            ("table", &self.table),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Empty(name));
            }
        }
        if self.max_rows_per_statement == 0 {
            return Err(Error::ZeroRowsPerStatement);
        }
        self.table_identifier()?;
        self.column_policy()?;
        Ok(())
    }

    pub fn table_identifier(&self) -> Result<Identifier, Error> {
        Identifier::parse(&self.table).map_err(Error::Table)
    }

    pub fn column_policy(&self) -> Result<ColumnPolicy, Error> {
        ColumnPolicy::allow_list(&self.allowed_columns).map_err(Error::AllowedColumn)
    }
}
