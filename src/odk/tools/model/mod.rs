use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::odk::tools::error::{Result, ToolError};

/// Column carrying the submission identifier in the primary export.
pub const INSTANCE_ID_COLUMN: &str = "instanceID";
/// Column linking a repeat-group row back to its submission.
pub const PARENT_KEY_COLUMN: &str = "PARENT_KEY";
/// Prefix Central puts in front of every submission identifier.
pub const INSTANCE_ID_PREFIX: &str = "uuid:";

/// An untyped table with named columns, one `String` cell per column.
///
/// Cells that were empty in the source are kept as empty strings so every row
/// has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Human readable table name used in error messages.
    pub name: String,
    /// Column headers in source order.
    pub columns: Vec<String>,
    /// Records in source order.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the provided columns.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a record, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Returns the position of `column`, failing when the table lacks it.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|candidate| candidate == column)
            .ok_or_else(|| ToolError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Iterates over the records whose `column` cell equals `value`.
    pub fn rows_matching<'a>(
        &'a self,
        column: usize,
        value: &'a str,
    ) -> impl Iterator<Item = &'a Vec<String>> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.get(column).is_some_and(|cell| cell == value))
    }
}

/// A repeat-group export together with the sheet label derived from its file
/// name.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryTable {
    pub label: String,
    pub table: Table,
}

/// Every table staged for a single form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormExport {
    pub form_name: String,
    pub primary: Table,
    pub auxiliary: Vec<AuxiliaryTable>,
}

/// Listing of the attachment files extracted next to a form export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaIndex {
    /// Directory the attachments live in.
    pub directory: PathBuf,
    /// Bare file names present in `directory`.
    pub file_names: BTreeSet<String>,
}

impl MediaIndex {
    pub fn new(directory: impl Into<PathBuf>, file_names: BTreeSet<String>) -> Self {
        Self {
            directory: directory.into(),
            file_names,
        }
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.file_names.contains(file_name)
    }
}

/// Removes the Central `uuid:` prefix from a submission identifier.
pub fn bundle_key(instance_id: &str) -> &str {
    instance_id
        .strip_prefix(INSTANCE_ID_PREFIX)
        .unwrap_or(instance_id)
}

/// Returns the cell at `column`, treating cells past the end of a short row as
/// empty.
pub fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or_default()
}
