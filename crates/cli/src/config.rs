//! CLI configuration.
//!
//! Precedence, lowest first: defaults, `learntrack.toml` (or `--config`),
//! `LEARNTRACK_*` environment variables, command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "learntrack.toml";

/// Resolved settings for one CLI run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the progress snapshot
    pub data_dir: PathBuf,
    /// Catalog JSON file
    pub catalog: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog: PathBuf::from("catalog.json"),
            log_level: "warn".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("learntrack"))
        .unwrap_or_else(|| PathBuf::from(".learntrack"))
}

impl Config {
    /// Load from `explicit`, else `./learntrack.toml` if present, else
    /// defaults; then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let p = PathBuf::from(CONFIG_FILE);
                p.exists().then_some(p)
            }
        };

        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|var| env::var(var).ok());
        Ok(config)
    }

    fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(v) = get("LEARNTRACK_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LEARNTRACK_CATALOG") {
            self.catalog = PathBuf::from(v);
        }
        if let Some(v) = get("LEARNTRACK_LOG") {
            self.log_level = v;
        }
    }
}
