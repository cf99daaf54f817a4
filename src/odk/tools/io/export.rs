use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::odk::tools::error::{Result, ToolError};
use crate::odk::tools::io::csv_read;
use crate::odk::tools::model::{AuxiliaryTable, FormExport};

const CSV_EXTENSION: &str = "csv";

/// A CSV file staged in a form's data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub file_name: String,
    pub path: PathBuf,
    /// Spreadsheet range the file is published to: the file name without
    /// its `.csv` extension.
    pub range_name: String,
}

/// Lists every CSV export in `data_dir`, sorted by file name.
pub fn list_exports(data_dir: &Path) -> Result<Vec<ExportFile>> {
    if !data_dir.is_dir() {
        return Err(ToolError::MissingInput(data_dir.to_path_buf()));
    }

    let mut exports = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some(CSV_EXTENSION)
        {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let file_name = file_name.to_string();
        let range_name = range_name(&file_name).to_string();
        exports.push(ExportFile {
            file_name,
            path,
            range_name,
        });
    }

    exports.sort_by(|lhs, rhs| lhs.file_name.cmp(&rhs.file_name));
    Ok(exports)
}

/// Loads `<form>.csv` and every repeat-group export next to it.
pub fn load_form_export(data_dir: &Path, form_name: &str) -> Result<FormExport> {
    let primary_name = format!("{form_name}.{CSV_EXTENSION}");
    let primary_path = data_dir.join(&primary_name);
    if !primary_path.is_file() {
        return Err(ToolError::MissingInput(primary_path));
    }
    let primary = csv_read::read_table(&primary_path, &primary_name)?;
    debug!(rows = primary.rows.len(), "loaded submissions table");

    let mut auxiliary = Vec::new();
    for export in list_exports(data_dir)? {
        if export.file_name == primary_name {
            continue;
        }
        let table = csv_read::read_table(&export.path, &export.file_name)?;
        debug!(file = %export.file_name, rows = table.rows.len(), "loaded repeat table");
        auxiliary.push(AuxiliaryTable {
            label: auxiliary_label(form_name, &export.file_name).to_string(),
            table,
        });
    }

    Ok(FormExport {
        form_name: form_name.to_string(),
        primary,
        auxiliary,
    })
}

/// Derives the sheet label of a repeat-group export: the file name without a
/// leading `<form>-` and without the `.csv` extension.
pub fn auxiliary_label<'a>(form_name: &str, file_name: &'a str) -> &'a str {
    let stem = range_name(file_name);
    stem.strip_prefix(form_name)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(stem)
}

fn range_name(file_name: &str) -> &str {
    file_name
        .strip_suffix(".csv")
        .unwrap_or(file_name)
}
