//! Settings for the checker itself (TOML)

use crate::history::UseMax;
use crate::httpd::DEFAULT_EXE_PATHS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Percent of free swap the projection may use and still be OK.
    pub swap_tolerance: u8,
    pub exe_search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub db_path: PathBuf,
    pub retain_days: u32,
    /// Compare against the largest historical average when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_max: Option<UseMax>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            swap_tolerance: 0,
            exe_search_paths: DEFAULT_EXE_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            db_path: Config::data_dir().join("history.sqlite"),
            retain_days: 30,
            use_max: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        anyhow::ensure!(
            config.general.swap_tolerance <= 100,
            "swap_tolerance must be between 0 and 100, got {}",
            config.general.swap_tolerance
        );
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "check-httpd-limits")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "check-httpd-limits")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
