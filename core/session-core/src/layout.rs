//! Canonical directory layout of a classified session.
//!
//! `SessionLayout` centralizes every path the classifier reads or writes so
//! the detector, the plan builder and the tests agree on one tree:
//!
//! ```text
//! <output>/calibration/intrinsics/int_cam01 .. int_camNN
//! <output>/calibration/extrinsics/ext_cam01 .. ext_camNN
//! <output>/Trial_1/Config.toml
//! <output>/Trial_1/videos_raw/<prefix>CAMERA<NN>.<ext>
//! ```
//!
//! The session root holds the raw footage. The output root defaults to the
//! session root; a separate output root builds the tree elsewhere.

use std::path::{Path, PathBuf};

pub const CALIBRATION_DIR: &str = "calibration";
pub const INTRINSICS_DIR: &str = "intrinsics";
pub const EXTRINSICS_DIR: &str = "extrinsics";
pub const VIDEOS_RAW_DIR: &str = "videos_raw";

#[derive(Debug, Clone)]
pub struct SessionLayout {
    /// Directory holding the raw recordings.
    session_root: PathBuf,
    /// Directory receiving the classified tree.
    output_root: PathBuf,
    /// Name of the pipeline configuration file (default `Config.toml`).
    config_file_name: String,
}

impl SessionLayout {
    /// Layout that reorganizes the session in place.
    pub fn in_place(session_root: PathBuf) -> Self {
        Self {
            output_root: session_root.clone(),
            session_root,
            config_file_name: "Config.toml".to_string(),
        }
    }

    /// Layout that builds the classified tree under a separate directory.
    pub fn with_output(session_root: PathBuf, output_root: PathBuf) -> Self {
        Self {
            session_root,
            output_root,
            config_file_name: "Config.toml".to_string(),
        }
    }

    pub fn with_config_file_name(mut self, name: impl Into<String>) -> Self {
        self.config_file_name = name.into();
        self
    }

    pub fn session_root(&self) -> &Path {
        &self.session_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn is_in_place(&self) -> bool {
        self.session_root == self.output_root
    }

    pub fn config_file_name(&self) -> &str {
        &self.config_file_name
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Session Inputs
    // ─────────────────────────────────────────────────────────────────────────────

    /// The session's pipeline configuration file.
    pub fn session_config_file(&self) -> PathBuf {
        self.session_root.join(&self.config_file_name)
    }

    /// Calibration folder that may already exist in the session.
    pub fn existing_calibration_dir(&self) -> PathBuf {
        self.session_root.join(CALIBRATION_DIR)
    }

    /// Loose `intrinsics/` folder dropped next to the footage.
    pub fn loose_intrinsics_dir(&self) -> PathBuf {
        self.session_root.join(INTRINSICS_DIR)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Calibration Tree
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn calibration_dir(&self) -> PathBuf {
        self.output_root.join(CALIBRATION_DIR)
    }

    pub fn intrinsics_dir(&self) -> PathBuf {
        self.calibration_dir().join(INTRINSICS_DIR)
    }

    pub fn extrinsics_dir(&self) -> PathBuf {
        self.calibration_dir().join(EXTRINSICS_DIR)
    }

    /// Example: `calibration/intrinsics/int_cam03`
    pub fn intrinsics_camera_dir(&self, camera_index: usize) -> PathBuf {
        self.intrinsics_dir()
            .join(format!("int_{}", camera_label(camera_index)))
    }

    /// Example: `calibration/extrinsics/ext_cam03`
    pub fn extrinsics_camera_dir(&self, camera_index: usize) -> PathBuf {
        self.extrinsics_dir()
            .join(format!("ext_{}", camera_label(camera_index)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Trial Tree
    // ─────────────────────────────────────────────────────────────────────────────

    /// Example: `Trial_2`
    pub fn trial_dir(&self, trial: usize) -> PathBuf {
        self.output_root.join(format!("Trial_{}", trial))
    }

    pub fn trial_videos_dir(&self, trial: usize) -> PathBuf {
        self.trial_dir(trial).join(VIDEOS_RAW_DIR)
    }

    pub fn trial_config_file(&self, trial: usize) -> PathBuf {
        self.trial_dir(trial).join(&self.config_file_name)
    }

    /// Copy of the session config at the output root, used when the tree is
    /// built outside the session directory.
    pub fn output_config_file(&self) -> PathBuf {
        self.output_root.join(&self.config_file_name)
    }
}

/// Positional camera label, zero-padded to two digits: `cam01`, `cam12`.
pub fn camera_label(camera_index: usize) -> String {
    format!("cam{:02}", camera_index)
}
