//! # session-core
//!
//! Acquisition session classifier for multi-camera motion capture.
//!
//! Takes a flat folder of raw recordings and reorganizes it into the layout a
//! calibration and pose pipeline expects: per-camera intrinsic and extrinsic
//! calibration folders, then numbered trial folders holding renamed footage
//! and a copy of the session configuration.
//!
//! ## Design Principles
//!
//! - **Synchronous**: Plain blocking filesystem I/O, no async runtime.
//! - **Detect, then mutate**: Every check runs before the first write; a
//!   detection error leaves the session untouched.
//! - **Idempotent execution**: Operations whose destination is already in
//!   place are skipped, so an interrupted run can simply be repeated.
//! - **No rollback**: On failure the executor reports what was done and stops.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use session_core::{SessionClassifier, SortConfig};
//!
//! let classifier = SessionClassifier::new(session_dir, SortConfig::default());
//! let classification = classifier.classify()?;
//! let report = classifier.execute(&classification)?;
//! ```

pub mod calibration;
pub mod classifier;
pub mod config;
pub mod decoder;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod layout;
pub mod partition;
pub mod patterns;
pub mod plan;

// Re-export commonly used items at crate root
pub use calibration::{detect_calibration_state, CalibrationReport, CalibrationState};
pub use classifier::{Classification, SessionClassifier};
pub use config::{get_config_path, load_sort_config, load_sort_config_from, SortConfig};
pub use decoder::{decode_filename, VideoRecord};
pub use error::{Result, SortError};
pub use executor::{
    execute_plan, CompletedOperation, ExecutionFailure, ExecutionReport, OpOutcome, PlanExecutor,
};
pub use inventory::{CameraSet, SessionInventory, SkippedFile};
pub use layout::SessionLayout;
pub use partition::{partition, trial_count, Group, GroupRole, Partition};
pub use plan::{Operation, Plan, PlanBuilder};
