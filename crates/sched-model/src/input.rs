//! Parsed tabular input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fingerprint::fingerprint;

/// One source row keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// Columns, rows and fingerprint of a decoded input file.
///
/// The fingerprint is derived from the columns at construction and the value is
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedInput {
    columns: Vec<String>,
    rows: Vec<Row>,
    row_count: usize,
    fingerprint: String,
}

impl ParsedInput {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let fingerprint = fingerprint(&columns);
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            fingerprint,
        }
    }

    /// Column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// First `limit` rows, used as a sample when prompting an analyzer.
    pub fn sample_rows(&self, limit: usize) -> &[Row] {
        &self.rows[..self.rows.len().min(limit)]
    }
}
