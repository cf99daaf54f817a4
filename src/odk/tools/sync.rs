use std::fs;
use std::path::Path;

use tracing::{info, instrument};

use crate::odk::tools::config::{CentralConfig, Workspace};
use crate::odk::tools::error::Result;
use crate::odk::tools::io::archive;
use crate::odk::tools::io::central::CentralClient;
use crate::odk::tools::io::export::{self, ExportFile};
use crate::odk::tools::io::media::{self, MEDIA_DIR};
use crate::odk::tools::split::{self, SplitOptions, SplitReport};

/// Creates the download and data directories of a workspace.
pub fn prepare_workspace(workspace: &Workspace) -> Result<()> {
    fs::create_dir_all(workspace.download_dir())?;
    fs::create_dir_all(workspace.data_dir())?;
    Ok(())
}

/// Downloads the submissions archive of a form and extracts it into the
/// form's data directory.
#[instrument(
    level = "info",
    skip_all,
    fields(form = form_name, workspace = %workspace.root.display())
)]
pub fn fetch_form(
    workspace: &Workspace,
    config: CentralConfig,
    form_name: &str,
    accept_invalid_certs: bool,
) -> Result<()> {
    prepare_workspace(workspace)?;
    let client = CentralClient::new(config, accept_invalid_certs)?;
    let archive_path = workspace.archive_path(form_name);
    client.download_submissions(form_name, &archive_path)?;
    let entries = archive::extract_archive(&archive_path, &workspace.form_dir(form_name))?;
    info!(entries, "form export staged");
    Ok(())
}

/// Splits a staged form export into one bundle per respondent under
/// `<data>/<form>/individual`.
#[instrument(
    level = "info",
    skip_all,
    fields(form = form_name, workspace = %workspace.root.display())
)]
pub fn split_form(workspace: &Workspace, form_name: &str) -> Result<SplitReport> {
    let data_dir = workspace.form_dir(form_name);
    split_export_dir(&data_dir, form_name)
}

/// Splits the export staged in `data_dir` into bundles under
/// `data_dir/individual`.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display(), form = form_name))]
pub fn split_export_dir(data_dir: &Path, form_name: &str) -> Result<SplitReport> {
    let form_export = export::load_form_export(data_dir, form_name)?;
    info!(
        submissions = form_export.primary.rows.len(),
        repeat_tables = form_export.auxiliary.len(),
        "loaded form export"
    );
    let media_index = media::scan_media(&data_dir.join(MEDIA_DIR))?;
    let options = SplitOptions::new(split::default_output_dir(data_dir));
    split::split_respondents(&form_export, &media_index, &options)
}

/// Fetches a form and splits it in one go.
pub fn export_form(
    workspace: &Workspace,
    config: CentralConfig,
    form_name: &str,
    accept_invalid_certs: bool,
) -> Result<SplitReport> {
    fetch_form(workspace, config, form_name, accept_invalid_certs)?;
    split_form(workspace, form_name)
}

/// Lists the CSV files staged for a form together with their range names.
#[instrument(level = "debug", skip_all, fields(form = form_name))]
pub fn list_form_exports(workspace: &Workspace, form_name: &str) -> Result<Vec<ExportFile>> {
    export::list_exports(&workspace.form_dir(form_name))
}

/// Writes a split report as pretty printed JSON.
pub fn write_report(report: &SplitReport, output: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(report)?;
    fs::write(output, json_string)?;
    Ok(())
}
