use std::collections::HashMap;

use crate::error::{Result, SqlForgeError};

/// Rows as returned by a driver, before they are wrapped into a [`QueryResult`].
/// Drivers stringify every value; SQL NULL becomes `"NULL"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQueryResult {
    /// Column names in select order
    pub columns: Vec<String>,
    /// One vector of values per row, in column order
    pub rows: Vec<Vec<String>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Outcome of a statement that does not produce rows (INSERT, UPDATE, DELETE, DDL).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Auto-increment id generated by an INSERT, where the driver reports one.
    pub last_insert_id: Option<u64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }
}

/// A single result row, addressed by column name.
#[derive(Debug, Clone)]
pub struct Row {
    values: HashMap<String, String>,
}

impl Row {
    pub(crate) fn new(columns: &[String], values: Vec<String>) -> Self {
        let values = columns.iter().cloned().zip(values).collect();
        Self { values }
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Result<&str> {
        self.values
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| SqlForgeError::ColumnNotFound(column.to_string()))
    }

    /// Gets a value and parses it, treating `"NULL"` as `None`.
    pub fn get_parsed<T: std::str::FromStr>(&self, column: &str) -> Result<Option<T>> {
        let raw = self.get(column)?;
        if raw == "NULL" {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(|_| {
            SqlForgeError::validation(format!("column {column} holds unparsable value {raw:?}"))
        })
    }

    pub fn columns(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows produced by a select-like call.
#[derive(Debug)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryResult {
    pub fn from_raw(raw: RawQueryResult) -> Self {
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::new(&raw.columns, values))
            .collect();
        Self {
            columns: raw.columns,
            rows,
        }
    }

    /// Extracts the only row of the result.
    /// Fails if the result holds zero rows or more than one.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        let mut rows = self.rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            _ => Err(SqlForgeError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    pub fn rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn rows_ref(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
