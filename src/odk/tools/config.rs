use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::odk::tools::error::{Result, ToolError};

pub const URL_KEY: &str = "URL";
pub const PROJECT_ID_KEY: &str = "PROJECT_ID";
pub const USERNAME_KEY: &str = "USERNAME";
pub const PASSWORD_KEY: &str = "PASSWORD";

/// Connection settings for an ODK Central server.
#[derive(Clone, PartialEq, Eq)]
pub struct CentralConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
    pub project_id: String,
    pub username: String,
    pub password: String,
}

impl CentralConfig {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        if base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            project_id: project_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Loads the settings from a dotenv file without touching the process
    /// environment.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let iter = dotenvy::from_path_iter(path)
            .map_err(|err| ToolError::MissingConfig(format!("{}: {err}", path.display())))?;
        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item
                .map_err(|err| ToolError::MissingConfig(format!("{}: {err}", path.display())))?;
            values.insert(key, value);
        }
        Self::from_values(&values)
    }

    /// Builds the settings from already parsed key/value pairs.
    pub fn from_values(values: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            values
                .get(key)
                .cloned()
                .ok_or_else(|| ToolError::MissingConfig(key.to_string()))
        };
        Ok(Self::new(
            get(URL_KEY)?,
            get(PROJECT_ID_KEY)?,
            get(USERNAME_KEY)?,
            get(PASSWORD_KEY)?,
        ))
    }
}

impl fmt::Debug for CentralConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CentralConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// On-disk layout used by the fetch and split commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory receiving downloaded archives.
    pub fn download_dir(&self) -> PathBuf {
        self.root.join("download")
    }

    /// Directory holding one extracted export per form.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn archive_path(&self, form_name: &str) -> PathBuf {
        self.download_dir().join(format!("{form_name}.zip"))
    }

    pub fn form_dir(&self, form_name: &str) -> PathBuf {
        self.data_dir().join(form_name)
    }
}
