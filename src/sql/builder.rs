//! Multi-row INSERT generation

use itertools::Itertools;

use super::Identifier;

/// `INSERT INTO <table> (<columns>) VALUES (?, ...), ...` for a fixed table
/// and column list. Values are always bound, never interpolated.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    table: Identifier,
    columns: Vec<Identifier>,
}

impl InsertStatement {
    pub fn new(table: Identifier, columns: Vec<Identifier>) -> Self {
        Self { table, columns }
    }

    /// Number of rows a single statement may carry without exceeding either
    /// `max_rows` or the backend's bind parameter limit. Never zero.
    pub fn rows_per_statement(&self, max_rows: usize, max_parameters: usize) -> usize {
        (max_parameters / self.columns.len().max(1))
            .min(max_rows)
            .max(1)
    }

    /// Statement text for `rows` value tuples.
    pub fn render(&self, rows: usize) -> String {
        let tuple = format!(
            "({})",
            std::iter::repeat_n("?", self.columns.len()).join(", ")
        );
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.iter().join(", "),
            std::iter::repeat_n(tuple.as_str(), rows).join(", ")
        )
    }
}
