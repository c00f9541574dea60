//! Configuration for pipe-run

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Column separator for exports
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Page size when a query does not name one
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Directory exports are written into
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// File holding the signed-in session
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_delimiter() -> char {
    crate::export::DEFAULT_DELIMITER
}

fn default_page_limit() -> usize {
    crate::DEFAULT_PAGE_LIMIT
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_session_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("record-pipeline")
        .join("session.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            page_limit: default_page_limit(),
            export_dir: default_export_dir(),
            session_path: default_session_path(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::read(config_path);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("record-pipeline").join("config.yml")),
            Some(PathBuf::from("record-pipeline.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::read(path);
            }
        }

        Ok(Config::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
