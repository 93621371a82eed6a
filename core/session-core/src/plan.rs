//! Reorganization plans.
//!
//! A [`Plan`] is the complete, ordered list of filesystem operations for one
//! run, computed before anything is touched. Building is pure: it only reads
//! the detection results, never the disk.
//!
//! Two invariants are checked on every plan:
//! - no two operations write the same destination
//! - every destination's parent is the output root or a directory created by
//!   an earlier operation

use crate::calibration::{CalibrationReport, CalibrationState};
use crate::decoder::VideoRecord;
use crate::error::{Result, SortError};
use crate::layout::SessionLayout;
use crate::partition::{GroupRole, Partition};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// One filesystem operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateDir { path: PathBuf },
    CopyFile { src: PathBuf, dst: PathBuf },
    MoveFile { src: PathBuf, dst: PathBuf },
    CopyConfig { src: PathBuf, dst: PathBuf },
    /// Relocates a whole directory tree (rename).
    MoveDir { src: PathBuf, dst: PathBuf },
    /// Duplicates a whole directory tree, leaving the source in place.
    CopyDir { src: PathBuf, dst: PathBuf },
}

impl Operation {
    /// Path written by this operation.
    pub fn destination(&self) -> &Path {
        match self {
            Operation::CreateDir { path } => path.as_path(),
            Operation::CopyFile { dst, .. }
            | Operation::MoveFile { dst, .. }
            | Operation::CopyConfig { dst, .. }
            | Operation::MoveDir { dst, .. }
            | Operation::CopyDir { dst, .. } => dst.as_path(),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        match self {
            Operation::CreateDir { .. } => None,
            Operation::CopyFile { src, .. }
            | Operation::MoveFile { src, .. }
            | Operation::CopyConfig { src, .. }
            | Operation::MoveDir { src, .. }
            | Operation::CopyDir { src, .. } => Some(src.as_path()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateDir { .. } => "create_dir",
            Operation::CopyFile { .. } => "copy_file",
            Operation::MoveFile { .. } => "move_file",
            Operation::CopyConfig { .. } => "copy_config",
            Operation::MoveDir { .. } => "move_dir",
            Operation::CopyDir { .. } => "copy_dir",
        }
    }

    /// Whether the operation creates a directory other operations may write into.
    fn creates_dir(&self) -> bool {
        matches!(
            self,
            Operation::CreateDir { .. } | Operation::MoveDir { .. } | Operation::CopyDir { .. }
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source() {
            Some(src) => write!(
                f,
                "{} {} -> {}",
                self.name(),
                src.display(),
                self.destination().display()
            ),
            None => write!(f, "{} {}", self.name(), self.destination().display()),
        }
    }
}

/// Ordered, validated list of operations for one session.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub session_root: PathBuf,
    pub output_root: PathBuf,
    pub operations: Vec<Operation>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    /// Checks destination uniqueness and parent anchoring.
    pub fn validate(&self) -> Result<()> {
        let mut destinations: HashSet<&Path> = HashSet::new();
        let mut created: HashSet<&Path> = HashSet::new();
        created.insert(self.output_root.as_path());

        for op in &self.operations {
            let dst = op.destination();
            if !destinations.insert(dst) {
                return Err(SortError::PlanConflict(dst.to_path_buf()));
            }
            let anchored = dst == self.output_root
                || dst.parent().is_some_and(|parent| created.contains(parent));
            if !anchored {
                return Err(SortError::UnanchoredDestination(dst.to_path_buf()));
            }
            if op.creates_dir() {
                created.insert(dst);
            }
        }
        Ok(())
    }
}

/// Turns detection results into a [`Plan`].
pub struct PlanBuilder<'a> {
    layout: &'a SessionLayout,
    preserve_sources: bool,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(layout: &'a SessionLayout) -> Self {
        Self {
            layout,
            preserve_sources: false,
        }
    }

    /// Copy footage instead of moving it; the session root stays untouched.
    pub fn preserve_sources(mut self, preserve: bool) -> Self {
        self.preserve_sources = preserve;
        self
    }

    pub fn build(
        &self,
        calibration: &CalibrationReport,
        partition: &Partition,
        config_present: bool,
    ) -> Result<Plan> {
        let layout = self.layout;
        let mut ops = Vec::new();

        if !layout.is_in_place() {
            ops.push(Operation::CreateDir {
                path: layout.output_root().to_path_buf(),
            });
            if config_present {
                ops.push(Operation::CopyConfig {
                    src: layout.session_config_file(),
                    dst: layout.output_config_file(),
                });
            }
        }

        self.push_calibration_tree(&mut ops, calibration, partition.nbcam);

        for group in &partition.groups {
            match group.role {
                GroupRole::Intrinsics => {
                    for (camera, record) in group.indexed_records() {
                        let dir = layout.intrinsics_camera_dir(camera);
                        ops.push(self.transfer(record, dir.join(&record.file_name)));
                    }
                }
                GroupRole::Extrinsics => {
                    for (camera, record) in group.indexed_records() {
                        let dir = layout.extrinsics_camera_dir(camera);
                        ops.push(self.transfer(record, dir.join(&record.file_name)));
                    }
                }
                GroupRole::Trial(trial) => {
                    ops.push(Operation::CreateDir {
                        path: layout.trial_dir(trial),
                    });
                    ops.push(Operation::CreateDir {
                        path: layout.trial_videos_dir(trial),
                    });
                    if config_present {
                        ops.push(Operation::CopyConfig {
                            src: layout.session_config_file(),
                            dst: layout.trial_config_file(trial),
                        });
                    }
                    let videos = layout.trial_videos_dir(trial);
                    for (_, record) in group.indexed_records() {
                        ops.push(self.transfer(record, videos.join(record.normalized_name())));
                    }
                }
            }
        }

        let plan = Plan {
            session_root: layout.session_root().to_path_buf(),
            output_root: layout.output_root().to_path_buf(),
            operations: ops,
        };
        plan.validate()?;

        tracing::info!(
            operations = plan.len(),
            state = ?calibration.state,
            trials = partition.nbtrials,
            "Plan built"
        );
        Ok(plan)
    }

    fn push_calibration_tree(
        &self,
        ops: &mut Vec<Operation>,
        calibration: &CalibrationReport,
        nbcam: usize,
    ) {
        let layout = self.layout;
        match calibration.state {
            CalibrationState::Full => {
                // Trusted as-is; only carried over when building elsewhere.
                if !layout.is_in_place() {
                    ops.push(Operation::CopyDir {
                        src: layout.existing_calibration_dir(),
                        dst: layout.calibration_dir(),
                    });
                }
                return;
            }
            CalibrationState::None => {
                ops.push(Operation::CreateDir {
                    path: layout.calibration_dir(),
                });
                ops.push(Operation::CreateDir {
                    path: layout.intrinsics_dir(),
                });
                ops.push(Operation::CreateDir {
                    path: layout.extrinsics_dir(),
                });
                for camera in 1..=nbcam {
                    ops.push(Operation::CreateDir {
                        path: layout.intrinsics_camera_dir(camera),
                    });
                }
            }
            CalibrationState::IntrinsicsOnly => {
                ops.push(Operation::CreateDir {
                    path: layout.calibration_dir(),
                });
                ops.push(Operation::CreateDir {
                    path: layout.extrinsics_dir(),
                });
                if let Some(src) = calibration.intrinsics_source.as_ref() {
                    ops.push(self.relocate(src.clone(), layout.intrinsics_dir()));
                }
            }
        }

        for camera in 1..=nbcam {
            ops.push(Operation::CreateDir {
                path: layout.extrinsics_camera_dir(camera),
            });
        }

        // In place, a copied calibration file would turn the next run into `Full`.
        if layout.is_in_place() {
            return;
        }
        for src in &calibration.root_calibration_files {
            if let Some(name) = src.file_name() {
                ops.push(Operation::CopyConfig {
                    src: src.clone(),
                    dst: layout.calibration_dir().join(name),
                });
            }
        }
    }

    fn transfer(&self, record: &VideoRecord, dst: PathBuf) -> Operation {
        let src = record.source_path.clone();
        if self.preserve_sources {
            Operation::CopyFile { src, dst }
        } else {
            Operation::MoveFile { src, dst }
        }
    }

    fn relocate(&self, src: PathBuf, dst: PathBuf) -> Operation {
        if self.preserve_sources {
            Operation::CopyDir { src, dst }
        } else {
            Operation::MoveDir { src, dst }
        }
    }
}
