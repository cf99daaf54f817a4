use std::fs::{self, File};
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::odk::tools::error::Result;

/// Extracts every entry of the zip archive at `archive_path` into
/// `destination`, overwriting files already present.
///
/// Returns the number of entries in the archive.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(destination)?;
    let entries = archive.len();
    archive.extract(destination)?;
    debug!(entries, destination = %destination.display(), "archive extracted");
    Ok(entries)
}
