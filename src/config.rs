use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, IoResultExt, Result};

/// default config file name, looked up in the writable directory
pub const CONFIG_FILE: &str = ".treelink.toml";

/// driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// read-only workspace to materialize when no --ro flag is given
    #[serde(default)]
    pub ro: Option<PathBuf>,

    /// directory names skipped at repository-root level in the writable tree
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
}

fn default_skip_dirs() -> Vec<String> {
    vec!["out".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ro: None,
            skip_dirs: default_skip_dirs(),
        }
    }
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// load config from file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
