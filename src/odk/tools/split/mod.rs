use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::odk::tools::error::{Result, ToolError};
use crate::odk::tools::io::excel_write;
use crate::odk::tools::io::media::{MediaOutcome, copy_media};
use crate::odk::tools::model::{
    FormExport, INSTANCE_ID_COLUMN, MediaIndex, PARENT_KEY_COLUMN, Table, bundle_key, cell,
};

/// Longest sheet name the xlsx format accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Sub-directory of a form's data directory holding the respondent bundles.
pub const BUNDLES_DIR: &str = "individual";

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

/// Where the splitter writes its bundles.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    /// Directory receiving one sub-directory per respondent.
    pub output_dir: PathBuf,
}

impl SplitOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

/// Result of a single media copy attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaAttempt {
    pub column: String,
    pub file_name: String,
    pub outcome: MediaOutcome,
}

/// Everything written for one respondent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleSummary {
    pub key: String,
    pub directory: PathBuf,
    pub document: PathBuf,
    pub media: Vec<MediaAttempt>,
}

/// Per-run account of the bundles produced by [`split_respondents`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SplitReport {
    pub media_columns: Vec<String>,
    pub bundles: Vec<BundleSummary>,
}

impl SplitReport {
    /// Number of media files copied into bundles.
    pub fn copied_count(&self) -> usize {
        self.attempts()
            .filter(|attempt| attempt.outcome == MediaOutcome::Copied)
            .count()
    }

    /// Number of referenced media files that could not be copied.
    pub fn skipped_count(&self) -> usize {
        self.attempts()
            .filter(|attempt| attempt.outcome != MediaOutcome::Copied)
            .count()
    }

    fn attempts(&self) -> impl Iterator<Item = &MediaAttempt> {
        self.bundles.iter().flat_map(|bundle| bundle.media.iter())
    }
}

/// Column positions and sheet names resolved before any file is written.
struct SplitPlan<'a> {
    instance_column: usize,
    primary_sheet: String,
    auxiliary: Vec<AuxiliarySheet<'a>>,
    media_columns: Vec<usize>,
    keys: Vec<&'a str>,
}

struct AuxiliarySheet<'a> {
    sheet_name: String,
    parent_column: usize,
    table: &'a Table,
}

/// Writes one bundle per submission under `options.output_dir`.
///
/// Each bundle holds `<form>.xlsx`, with the submission's row on a sheet
/// named after the form and its repeat-group rows on one sheet per auxiliary
/// table, plus a copy of every attachment the row references. Table problems
/// abort the run before anything is written; attachment problems are recorded
/// in the returned report and never abort it.
pub fn split_respondents(
    export: &FormExport,
    media: &MediaIndex,
    options: &SplitOptions,
) -> Result<SplitReport> {
    let plan = plan_split(export, media)?;
    let primary = &export.primary;
    info!(
        respondents = plan.keys.len(),
        auxiliary_sheets = plan.auxiliary.len(),
        media_columns = plan.media_columns.len(),
        "split planned"
    );

    let mut report = SplitReport {
        media_columns: plan
            .media_columns
            .iter()
            .map(|&idx| primary.columns[idx].clone())
            .collect(),
        bundles: Vec::with_capacity(primary.rows.len()),
    };

    let document_name = format!("{}.xlsx", export.form_name);

    for (row, key) in primary.rows.iter().zip(&plan.keys) {
        let instance_id = cell(row, plan.instance_column);
        debug!(instance_id, "writing bundle");

        let directory = options.output_dir.join(key);
        fs::create_dir_all(&directory)?;

        let workbook = build_bundle_workbook(primary, &plan, instance_id);
        let document = directory.join(&document_name);
        excel_write::write_workbook(&document, &workbook)?;

        let mut attempts = Vec::new();
        for &column in &plan.media_columns {
            let file_name = cell(row, column);
            if file_name.is_empty() {
                continue;
            }
            let outcome = copy_media(media, file_name, &directory);
            if outcome != MediaOutcome::Copied {
                warn!(
                    instance_id,
                    column = %primary.columns[column],
                    file_name,
                    ?outcome,
                    "attachment not copied"
                );
            }
            attempts.push(MediaAttempt {
                column: primary.columns[column].clone(),
                file_name: file_name.to_string(),
                outcome,
            });
        }

        report.bundles.push(BundleSummary {
            key: key.to_string(),
            directory,
            document,
            media: attempts,
        });
    }

    info!(
        bundles = report.bundles.len(),
        copied = report.copied_count(),
        skipped = report.skipped_count(),
        "split finished"
    );
    Ok(report)
}

fn plan_split<'a>(export: &'a FormExport, media: &MediaIndex) -> Result<SplitPlan<'a>> {
    let primary = &export.primary;
    let instance_column = primary.column_index(INSTANCE_ID_COLUMN)?;

    let mut used_names = HashSet::new();
    let primary_sheet = claim_sheet_name(&mut used_names, &export.form_name)?;

    let auxiliary = export
        .auxiliary
        .iter()
        .map(|aux| {
            Ok(AuxiliarySheet {
                sheet_name: claim_sheet_name(&mut used_names, &aux.label)?,
                parent_column: aux.table.column_index(PARENT_KEY_COLUMN)?,
                table: &aux.table,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut seen_keys = HashSet::new();
    let keys = primary
        .rows
        .iter()
        .map(|row| {
            let instance_id = cell(row, instance_column);
            let key = bundle_key(instance_id);
            if !is_valid_bundle_key(key) {
                return Err(ToolError::InvalidIdentifier(instance_id.to_string()));
            }
            if !seen_keys.insert(key) {
                return Err(ToolError::DuplicateRespondent(key.to_string()));
            }
            Ok(key)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SplitPlan {
        instance_column,
        primary_sheet,
        auxiliary,
        media_columns: media_columns(primary, media),
        keys,
    })
}

/// Columns of `table` holding at least one value that names a file in `media`.
pub fn media_columns(table: &Table, media: &MediaIndex) -> Vec<usize> {
    (0..table.columns.len())
        .filter(|&column| table.rows.iter().any(|row| media.contains(cell(row, column))))
        .collect()
}

/// Cuts `name` down to the sheet name limit, counting characters.
pub fn truncate_sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME_LEN).collect()
}

fn claim_sheet_name(used: &mut HashSet<String>, raw: &str) -> Result<String> {
    let name = truncate_sheet_name(raw);
    // Excel compares sheet names case-insensitively.
    if !used.insert(name.to_lowercase()) {
        return Err(ToolError::DuplicateSheetName(name));
    }
    Ok(name)
}

fn is_valid_bundle_key(key: &str) -> bool {
    !key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\'])
}

fn build_bundle_workbook(
    primary: &Table,
    plan: &SplitPlan<'_>,
    instance_id: &str,
) -> WorkbookData {
    let mut tables = Vec::with_capacity(plan.auxiliary.len() + 1);
    tables.push(slice_table(
        &plan.primary_sheet,
        primary,
        plan.instance_column,
        instance_id,
    ));
    for aux in &plan.auxiliary {
        tables.push(slice_table(
            &aux.sheet_name,
            aux.table,
            aux.parent_column,
            instance_id,
        ));
    }
    WorkbookData { tables }
}

fn slice_table(sheet_name: &str, table: &Table, column: usize, value: &str) -> SheetTable {
    SheetTable {
        sheet_name: sheet_name.to_string(),
        columns: table.columns.clone(),
        rows: table.rows_matching(column, value).cloned().collect(),
    }
}

/// Default bundle location for a form staged in `data_dir`.
pub fn default_output_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(BUNDLES_DIR)
}
