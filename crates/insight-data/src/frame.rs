//! Dynamic tabular data produced by flattening raw JSON records.
//!
//! A [`Frame`] keeps its columns in source order: the explosion step treats
//! every column after the first as a candidate, so position is meaningful.

use chrono::{DateTime, Utc};
use insight_core::processors::{flatten_nested, DateParser};
use insight_core::validators::FieldValidator;
use serde::Serialize;
use serde_json::Value;

// ── Cell ──────────────────────────────────────────────────────────────────────

/// One value in a frame.
///
/// `List` only appears before explosion; `DateTime` only after date
/// normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    List(Vec<Cell>),
}

impl Cell {
    /// Convert a raw JSON value into a cell.
    ///
    /// Objects should not reach this point (flattening removes them); any
    /// that do are stored as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(items) => Cell::List(items.iter().map(Cell::from_json).collect()),
            Value::Object(_) => Cell::Text(value.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// An ordered-column table of cells.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Build a frame directly from columns and rows.
    ///
    /// Rows shorter than the column list are padded with `Null`.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Flatten a list of JSON objects into a frame.
    ///
    /// Nested objects become dotted columns; the column set is the union
    /// across all records, in first-seen order; cells absent from a record
    /// are `Null`.
    pub fn from_objects(records: &[Value]) -> Self {
        let flattened: Vec<serde_json::Map<String, Value>> = records
            .iter()
            .map(|record| flatten_nested(record, ""))
            .collect();

        let mut columns: Vec<String> = Vec::new();
        for map in &flattened {
            for key in map.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = flattened
            .iter()
            .map(|map| {
                columns
                    .iter()
                    .map(|col| map.get(col).map(Cell::from_json).unwrap_or(Cell::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `(row, column-name)`, when both exist.
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)
    }

    /// Expand list-valued cells into one row per element.
    ///
    /// Every column after the first is a candidate. Within one input row,
    /// the output row count is the longest list's length; list elements
    /// align positionally, shorter lists pad with `Null`, and scalar cells
    /// (including the first column) replicate across all output rows.
    pub fn explode_list_columns(&self) -> Frame {
        let mut out_rows: Vec<Vec<Cell>> = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let longest = row
                .iter()
                .skip(1)
                .filter_map(|cell| match cell {
                    Cell::List(items) => Some(items.len()),
                    _ => None,
                })
                .max();

            let Some(longest) = longest else {
                out_rows.push(row.clone());
                continue;
            };

            for i in 0..longest.max(1) {
                let exploded = row
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| match cell {
                        Cell::List(items) if col > 0 => {
                            items.get(i).cloned().unwrap_or(Cell::Null)
                        }
                        other => other.clone(),
                    })
                    .collect();
                out_rows.push(exploded);
            }
        }

        Frame {
            columns: self.columns.clone(),
            rows: out_rows,
        }
    }

    /// Apply a field validator to every text cell of the named column.
    ///
    /// A missing column is a no-op; non-text cells are left untouched.
    pub fn map_text_column(&mut self, name: &str, validator: FieldValidator) {
        let Some(idx) = self.column_index(name) else {
            return;
        };
        for row in &mut self.rows {
            if let Cell::Text(s) = &row[idx] {
                let cleaned = validator(s);
                row[idx] = Cell::Text(cleaned);
            }
        }
    }

    /// Rewrite every cell of the named column through `f`.
    ///
    /// Returns `false` when the column does not exist.
    pub fn map_column(&mut self, name: &str, f: impl Fn(&Cell) -> Cell) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            let mapped = f(&row[idx]);
            row[idx] = mapped;
        }
        true
    }

    /// Parse the listed columns into `DateTime` cells.
    ///
    /// Pure: returns a new frame. Columns absent from the frame are
    /// silently skipped; individual unparsable values become `Null`.
    pub fn normalize_dates(&self, columns: &[&str]) -> Frame {
        let mut out = self.clone();
        for name in columns {
            let Some(idx) = out.column_index(name) else {
                continue;
            };
            for row in &mut out.rows {
                let parsed = match &row[idx] {
                    Cell::Text(s) => DateParser::parse(s)
                        .map(Cell::DateTime)
                        .unwrap_or(Cell::Null),
                    Cell::DateTime(dt) => Cell::DateTime(*dt),
                    _ => Cell::Null,
                };
                row[idx] = parsed;
            }
        }
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
