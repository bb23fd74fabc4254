//! Request types for the VR engine API.
//!
//! This module defines the JSON request structures for the `/calculate`
//! endpoint. Clients send the monthly tables already read from their
//! spreadsheets; headers go through the same normalization as file inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ColumnAliases;
use crate::ingest::{normalize_table, number_text};
use crate::models::{Dataset, Role};

/// Request body for the `/calculate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Reference month (1-12).
    pub reference_month: u32,
    /// Reference year.
    pub reference_year: i32,
    /// Input tables keyed by role.
    pub tables: BTreeMap<Role, TableRequest>,
}

/// One input table in a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRequest {
    /// Raw column headers.
    pub headers: Vec<String>,
    /// Rows of cells; strings, numbers and nulls are accepted.
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text,
        serde_json::Value::Number(number) => match number.as_f64() {
            Some(value) if number.is_f64() => number_text(value),
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

impl TableRequest {
    /// Converts the cells to text the way a spreadsheet export would.
    pub fn into_rows(self) -> (Vec<String>, Vec<Vec<String>>) {
        let rows = self
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        (self.headers, rows)
    }
}

impl CalculationRequest {
    /// Normalizes every table and collects them into a dataset.
    pub fn into_dataset(self, aliases: &ColumnAliases) -> Dataset {
        let mut dataset = Dataset::new();
        for (role, table) in self.tables {
            let (headers, rows) = table.into_rows();
            dataset.insert(role, normalize_table(&headers, rows, aliases));
        }
        dataset
    }
}
