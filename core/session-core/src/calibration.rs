//! Calibration state detection.
//!
//! Decides, once per run, how much calibration footage the session still
//! contains. The probe order is fixed:
//!
//! 1. `calibration/` holding a calibration artifact (`Calib.toml`,
//!    `Calib_scene.toml`, ...) → [`CalibrationState::Full`]
//! 2. a loose `intrinsics/` folder → [`CalibrationState::IntrinsicsOnly`]
//! 3. otherwise → [`CalibrationState::None`]
//!
//! Artifacts are only tested for existence, never parsed. The result is not
//! re-checked during execution.

use crate::inventory::readable_entry;
use crate::layout::SessionLayout;
use crate::patterns::ROOT_CALIBRATION_FILES;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default case-insensitive name fragments identifying a calibration artifact.
pub const DEFAULT_CALIBRATION_PATTERNS: [&str; 2] = ["calib", "calib_scene"];

/// How much calibration the session already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalibrationState {
    /// No calibration at all: intrinsics and extrinsics footage lead the session.
    None,
    /// Intrinsics already computed: only extrinsics footage leads the session.
    IntrinsicsOnly,
    /// A calibration file exists and is trusted as-is.
    Full,
}

impl CalibrationState {
    /// Number of leading file groups that hold calibration footage.
    pub fn reserved_groups(self) -> usize {
        match self {
            CalibrationState::None => 2,
            CalibrationState::IntrinsicsOnly => 1,
            CalibrationState::Full => 0,
        }
    }
}

/// Everything the detector found, with the derived state.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub state: CalibrationState,
    /// Whether `calibration/` exists under the session root.
    pub calibration_dir_present: bool,
    /// Artifacts found directly inside `calibration/`.
    pub artifacts: Vec<PathBuf>,
    /// Existing intrinsics folder to carry into `calibration/intrinsics`.
    pub intrinsics_source: Option<PathBuf>,
    /// Calibration files lying at the session root next to the footage.
    pub root_calibration_files: Vec<PathBuf>,
}

/// Probes the session root for calibration folders and artifacts.
pub fn detect_calibration_state(layout: &SessionLayout, patterns: &[String]) -> CalibrationReport {
    let calibration_dir = layout.existing_calibration_dir();
    let calibration_dir_present = calibration_dir.is_dir();
    let artifacts = if calibration_dir_present {
        find_artifacts(&calibration_dir, patterns)
    } else {
        Vec::new()
    };

    let loose_intrinsics = layout.loose_intrinsics_dir();

    let (state, intrinsics_source) = if !artifacts.is_empty() {
        (CalibrationState::Full, None)
    } else if loose_intrinsics.is_dir() {
        (CalibrationState::IntrinsicsOnly, Some(loose_intrinsics))
    } else {
        (CalibrationState::None, None)
    };

    if calibration_dir_present && artifacts.is_empty() {
        tracing::warn!(
            path = %calibration_dir.display(),
            "Calibration folder found without a calibration file"
        );
    }

    let root_calibration_files = ROOT_CALIBRATION_FILES
        .iter()
        .map(|name| layout.session_root().join(name))
        .filter(|path| path.is_file())
        .collect();

    tracing::info!(
        state = ?state,
        artifacts = artifacts.len(),
        "Calibration state detected"
    );

    CalibrationReport {
        state,
        calibration_dir_present,
        artifacts,
        intrinsics_source,
        root_calibration_files,
    }
}

/// Returns `true` when a file name contains any pattern, ignoring case.
pub fn is_calibration_artifact(file_name: &str, patterns: &[String]) -> bool {
    let lower = file_name.to_lowercase();
    patterns
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn find_artifacts(dir: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut artifacts: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(readable_entry)
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_calibration_artifact(&e.file_name().to_string_lossy(), patterns))
        .map(|e| e.into_path())
        .collect();
    artifacts.sort();
    artifacts
}
