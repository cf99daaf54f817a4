use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool downloads, stages, splits, or emits submission data.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a CSV export cannot be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when the downloaded submissions archive cannot be extracted.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Transport failures talking to the Central server.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when the Central server answers with a non-success status.
    #[error("server answered {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook read back from disk lacks an expected sheet.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a table lacks a column the splitter relies on.
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Raised when two sheets end up with the same name after truncation.
    #[error(
        "sheet name '{0}' is used by more than one table once names are cut to 31 characters"
    )]
    DuplicateSheetName(String),

    /// Raised when two submissions map onto the same bundle directory.
    #[error("respondent '{0}' appears more than once in the submissions table")]
    DuplicateRespondent(String),

    /// Raised when an identifier cannot be used as a bundle directory name.
    #[error("identifier '{0}' cannot be used as a bundle directory name")]
    InvalidIdentifier(String),

    /// Raised when a required configuration entry is absent.
    #[error("missing configuration value {0}")]
    MissingConfig(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
