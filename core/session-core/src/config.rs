//! Run configuration.
//!
//! Settings come from an optional TOML file; command-line flags override them.
//! The default file lives at `<config dir>/session-sort/config.toml`:
//!
//! ```toml
//! video_extension = ".MP4"
//! config_file_name = "Config.toml"
//! calibration_patterns = ["calib", "calib_scene"]
//! preserve_sources = false
//! # output_dir = "/data/session_traitement"
//! ```

use crate::calibration::DEFAULT_CALIBRATION_PATTERNS;
use crate::error::{Result, SortError};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Extension of the raw footage, matched case-insensitively.
    pub video_extension: String,
    /// Pipeline configuration file copied into every trial.
    pub config_file_name: String,
    /// Name fragments identifying a calibration file inside `calibration/`.
    pub calibration_patterns: Vec<String>,
    /// Copy footage instead of moving it.
    pub preserve_sources: bool,
    /// Build the classified tree here instead of inside the session.
    pub output_dir: Option<PathBuf>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            video_extension: ".MP4".to_string(),
            config_file_name: "Config.toml".to_string(),
            calibration_patterns: DEFAULT_CALIBRATION_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preserve_sources: false,
            output_dir: None,
        }
    }
}

/// Returns the path to the user configuration file.
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("session-sort").join("config.toml"))
}

/// Loads the user configuration, returning defaults if it is missing or invalid.
pub fn load_sort_config() -> SortConfig {
    let Some(path) = get_config_path() else {
        return SortConfig::default();
    };
    if !path.exists() {
        return SortConfig::default();
    }
    match load_sort_config_from(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring invalid configuration file");
            SortConfig::default()
        }
    }
}

/// Loads a configuration file that must exist and parse.
pub fn load_sort_config_from(path: &Path) -> Result<SortConfig> {
    let content =
        fs::read_to_string(path).map_err(|e| SortError::io("reading configuration", e))?;
    parse_sort_config(&content).map_err(|details| SortError::ConfigMalformed {
        path: path.to_path_buf(),
        details,
    })
}

fn parse_sort_config(content: &str) -> std::result::Result<SortConfig, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}
