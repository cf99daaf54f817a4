//! Core library for the odk-tools command line application.
//!
//! The library downloads form submissions from an ODK Central server and
//! republishes them as one bundle per respondent: a workbook holding the
//! respondent's submission and repeat-group rows, next to copies of the
//! attachments the submission references. IO adapters live under
//! [`odk::tools::io`], table representations inside [`odk::tools::model`], the
//! per-respondent splitting in [`odk::tools::split`], and the orchestration
//! under [`odk::tools::sync`].

pub mod odk;

pub use odk::tools::{Result, ToolError, config, error, io, model, split, sync};
