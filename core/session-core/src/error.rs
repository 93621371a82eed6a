//! Error types for session-core operations.
//!
//! Detection-phase errors (decoding, inventory, partitioning, planning) are
//! raised before anything touches the filesystem. Execution-phase errors are
//! wrapped by the executor together with the progress made so far.

use std::path::PathBuf;

/// All errors that can occur while classifying a session.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
    // ─────────────────────────────────────────────────────────────────────
    // Detection Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Malformed filename: {file}: {reason}")]
    MalformedFilename { file: String, reason: String },

    #[error("No video files with extension {extension} found in {dir}")]
    NoVideosFound { dir: PathBuf, extension: String },

    #[error(
        "File count mismatch: {nbfiles} files for {nbcam} cameras with {reserved_groups} reserved calibration group(s)"
    )]
    FileCountMismatch {
        nbfiles: usize,
        nbcam: usize,
        reserved_groups: usize,
    },

    #[error("Inconsistent camera set in group {group}: expected {expected:?}, found {found:?}")]
    InconsistentCameraSet {
        group: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Plan Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Plan conflict: more than one operation writes {0}")]
    PlanConflict(PathBuf),

    #[error("Plan destination has no parent created before it: {0}")]
    UnanchoredDestination(PathBuf),

    // ─────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Source missing: {0}")]
    SourceMissing(PathBuf),

    #[error("Destination conflict: {path} already exists ({details})")]
    DestinationConflict { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Ambient Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SortError {
    /// Stable identifier of the failure kind, used in CLI diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SortError::MalformedFilename { .. } => "MalformedFilename",
            SortError::NoVideosFound { .. } => "NoVideosFound",
            SortError::FileCountMismatch { .. } => "FileCountMismatch",
            SortError::InconsistentCameraSet { .. } => "InconsistentCameraSet",
            SortError::PlanConflict(_) => "PlanConflict",
            SortError::UnanchoredDestination(_) => "UnanchoredDestination",
            SortError::SourceMissing(_) => "SourceMissing",
            SortError::DestinationConflict { .. } => "DestinationConflict",
            SortError::ConfigMalformed { .. } => "ConfigMalformed",
            SortError::Io { .. } => "Io",
        }
    }

    /// Wraps an I/O error with a short description of what was attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SortError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using SortError.
pub type Result<T> = std::result::Result<T, SortError>;
