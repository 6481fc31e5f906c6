//! Shell configuration loaded from TOML.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CAIRN_CONFIG";

/// Config file name looked up beside the executable.
pub const CONFIG_FILE_NAME: &str = "cairn.toml";

/// Runtime configuration for a shell session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// File name of the script run at launch, resolved beside the executable.
    pub startup_script: String,
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Libraries registered from the catalog at start-up.
    pub autoload: Vec<String>,
    /// Extra shell variables defined at start-up.
    pub variables: BTreeMap<String, String>,
    /// Root directory for disposable temp folders (system temp when unset).
    pub temp_root: Option<PathBuf>,
    /// Where the interactive line editor persists its history.
    pub history_file: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            startup_script: "cairn.startup".to_string(),
            log_filter: "warn".to_string(),
            autoload: vec!["log".to_string(), "system".to_string()],
            variables: BTreeMap::new(),
            temp_root: None,
            history_file: None,
        }
    }
}

impl ShellConfig {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file. `None` when there is no file at `path`, in
    /// which case callers fall back to the defaults.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map(Some)
    }

    /// Resolve the config path: `$CAIRN_CONFIG`, else `cairn.toml` in `exe_dir`.
    pub fn locate(exe_dir: &Path) -> PathBuf {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(p) => PathBuf::from(p),
            None => exe_dir.join(CONFIG_FILE_NAME),
        }
    }
}
