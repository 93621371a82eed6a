//! Compiled regex patterns for recognizing session files.
//!
//! Filenames come from action cameras whose basename is set to
//! `[yyyymmdd_HHMMSS]-CAMERA00-`; anything after the camera tag is
//! device-specific and ignored.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Video Filename Regexes
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed-width capture time prefix, minute precision. Seconds may follow.
pub static RE_TIMESTAMP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{8}_\d{4})").unwrap());

/// Camera tag: the `CAMERA` marker and the two digits after it.
pub static RE_CAMERA_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"CAMERA\d{2}").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Calibration Artifact Names
// ═══════════════════════════════════════════════════════════════════════════════

/// Calibration files that may sit at the session root next to the footage.
pub const ROOT_CALIBRATION_FILES: [&str; 3] = ["Calib.toml", "Calib_scene.toml", "calib.toml"];
