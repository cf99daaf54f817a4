use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::odk::tools::error::Result;
use crate::odk::tools::model::MediaIndex;

/// Directory name Central uses for attachments inside a submissions archive.
pub const MEDIA_DIR: &str = "media";

/// Outcome of copying one attachment into a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum MediaOutcome {
    Copied,
    NotFound,
    PermissionDenied,
    Failed(String),
}

/// Lists the attachment files of a staged form export.
///
/// A form without attachments has no media directory at all, so a missing
/// directory yields an empty index.
pub fn scan_media(directory: &Path) -> Result<MediaIndex> {
    if !directory.is_dir() {
        warn!(directory = %directory.display(), "no media directory, assuming no attachments");
        return Ok(MediaIndex::new(directory, BTreeSet::new()));
    }

    let mut file_names = BTreeSet::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                file_names.insert(name.to_string());
            }
        }
    }
    Ok(MediaIndex::new(directory, file_names))
}

/// Copies `file_name` from the media directory into `destination`.
///
/// Only names present in the index are copied, so a cell holding a path can
/// never reach outside the media directory. Never fails; the returned outcome
/// says what happened.
pub fn copy_media(index: &MediaIndex, file_name: &str, destination: &Path) -> MediaOutcome {
    if !index.contains(file_name) {
        return MediaOutcome::NotFound;
    }
    let source = index.directory.join(file_name);
    match fs::copy(&source, destination.join(file_name)) {
        Ok(_) => MediaOutcome::Copied,
        Err(err) => match err.kind() {
            ErrorKind::NotFound => MediaOutcome::NotFound,
            ErrorKind::PermissionDenied => MediaOutcome::PermissionDenied,
            _ => MediaOutcome::Failed(err.to_string()),
        },
    }
}
