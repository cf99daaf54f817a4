use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::odk::tools::config::CentralConfig;
use crate::odk::tools::error::{Result, ToolError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Minimal ODK Central client able to download submission exports.
pub struct CentralClient {
    http: Client,
    config: CentralConfig,
}

impl CentralClient {
    /// Builds a client. `accept_invalid_certs` disables TLS verification for
    /// servers running with self-signed certificates.
    pub fn new(config: CentralConfig, accept_invalid_certs: bool) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { http, config })
    }

    /// Endpoint returning every submission of `form_name` as a zip of CSV
    /// files plus attachments.
    pub fn submissions_url(&self, form_name: &str) -> String {
        submissions_url(&self.config, form_name)
    }

    /// Downloads the submissions archive of `form_name` into `destination`.
    ///
    /// Returns the number of bytes written. A non-success status or a failed
    /// transfer leaves `destination` untouched.
    pub fn download_submissions(&self, form_name: &str, destination: &Path) -> Result<u64> {
        let url = self.submissions_url(form_name);
        debug!(%url, "requesting submissions archive");

        let mut response = self
            .http
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = persist_download(destination, |file| Ok(response.copy_to(file)?))?;
        info!(bytes, destination = %destination.display(), "submissions archive downloaded");
        Ok(bytes)
    }
}

/// Builds the submissions export URL for `form_name`.
pub fn submissions_url(config: &CentralConfig, form_name: &str) -> String {
    format!(
        "{}/v1/projects/{}/forms/{}/submissions.csv.zip?groupPaths=false",
        config.base_url, config.project_id, form_name
    )
}

/// Runs `write` against a temporary file next to `destination` and moves it
/// into place only when `write` succeeds. On failure the temporary file is
/// removed and `destination` keeps its previous contents.
pub fn persist_download<F>(destination: &Path, write: F) -> Result<u64>
where
    F: FnOnce(&mut File) -> Result<u64>,
{
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(parent)?;
    let bytes = write(staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    staged
        .persist(destination)
        .map_err(|err| ToolError::Io(err.error))?;
    Ok(bytes)
}
