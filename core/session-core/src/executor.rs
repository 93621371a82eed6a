//! Plan execution.
//!
//! Operations run strictly in plan order, one at a time. Each one first checks
//! whether its destination already satisfies it:
//!
//! - destination present with the source's size → skipped
//! - destination present with another size → `DestinationConflict`, untouched
//! - source absent → `SourceMissing` (a move whose destination exists counts as done)
//!
//! Copies are written to a temp file next to the destination and renamed into
//! place, so a destination is either absent or complete. Nothing is rolled back
//! or retried: a failure returns the operations completed so far and the index
//! of the one that failed, which is enough to inspect and resume.

use crate::error::{Result, SortError};
use crate::plan::{Operation, Plan};
use fs_err as fs;
use serde::Serialize;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpOutcome {
    /// The filesystem was changed.
    Applied,
    /// The destination already satisfied the operation.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedOperation {
    pub index: usize,
    pub operation: Operation,
    pub outcome: OpOutcome,
}

/// Result of a run that did not fail.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    pub completed: Vec<CompletedOperation>,
    /// Set when the run stopped early at the caller's request.
    pub cancelled: bool,
}

impl ExecutionReport {
    pub fn applied(&self) -> usize {
        self.count(OpOutcome::Applied)
    }

    pub fn skipped(&self) -> usize {
        self.count(OpOutcome::Skipped)
    }

    fn count(&self, outcome: OpOutcome) -> usize {
        self.completed
            .iter()
            .filter(|c| c.outcome == outcome)
            .count()
    }
}

/// A run that stopped on an operation error. Completed operations stay in place.
#[derive(Debug, thiserror::Error)]
#[error("operation {failed_index} ({operation}) failed: {error}")]
pub struct ExecutionFailure {
    pub failed_index: usize,
    pub operation: Operation,
    pub completed: Vec<CompletedOperation>,
    #[source]
    pub error: SortError,
}

/// Applies a [`Plan`] step by step.
pub struct PlanExecutor<'a> {
    plan: &'a Plan,
    next: usize,
    completed: Vec<CompletedOperation>,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(plan: &'a Plan) -> Self {
        Self {
            plan,
            next: 0,
            completed: Vec::with_capacity(plan.len()),
        }
    }

    /// Index of the next operation to run.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.plan.len()
    }

    pub fn completed(&self) -> &[CompletedOperation] {
        &self.completed
    }

    /// Runs the next operation. Returns `Ok(None)` once the plan is exhausted.
    ///
    /// A failed step does not advance; calling it again retries the same
    /// operation against the current state of the disk.
    pub fn step(&mut self) -> Result<Option<OpOutcome>> {
        let Some(operation) = self.plan.operations.get(self.next) else {
            return Ok(None);
        };

        let outcome = apply(operation)?;
        tracing::debug!(
            index = self.next,
            operation = %operation,
            outcome = ?outcome,
            "Operation completed"
        );
        self.completed.push(CompletedOperation {
            index: self.next,
            operation: operation.clone(),
            outcome,
        });
        self.next += 1;
        Ok(Some(outcome))
    }

    /// Runs the remaining operations, asking `should_continue` before each one.
    pub fn run<F>(
        mut self,
        mut should_continue: F,
    ) -> std::result::Result<ExecutionReport, ExecutionFailure>
    where
        F: FnMut() -> bool,
    {
        while !self.is_finished() {
            if !should_continue() {
                tracing::warn!(position = self.next, "Plan execution cancelled");
                return Ok(ExecutionReport {
                    completed: self.completed,
                    cancelled: true,
                });
            }
            if let Err(error) = self.step() {
                let failed_index = self.next;
                tracing::error!(
                    index = failed_index,
                    kind = error.kind(),
                    error = %error,
                    "Plan execution stopped"
                );
                return Err(ExecutionFailure {
                    failed_index,
                    operation: self.plan.operations[failed_index].clone(),
                    completed: self.completed,
                    error,
                });
            }
        }

        let report = ExecutionReport {
            completed: self.completed,
            cancelled: false,
        };
        tracing::info!(
            applied = report.applied(),
            skipped = report.skipped(),
            "Plan executed"
        );
        Ok(report)
    }
}

/// Runs a whole plan without cancellation.
pub fn execute_plan(plan: &Plan) -> std::result::Result<ExecutionReport, ExecutionFailure> {
    PlanExecutor::new(plan).run(|| true)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════════════════════════════════════════

fn apply(operation: &Operation) -> Result<OpOutcome> {
    match operation {
        Operation::CreateDir { path } => create_dir(path),
        Operation::CopyFile { src, dst } | Operation::CopyConfig { src, dst } => {
            copy_file(src, dst)
        }
        Operation::MoveFile { src, dst } => move_file(src, dst),
        Operation::MoveDir { src, dst } => move_dir(src, dst),
        Operation::CopyDir { src, dst } => copy_dir(src, dst),
    }
}

fn create_dir(path: &Path) -> Result<OpOutcome> {
    if path.is_dir() {
        return Ok(OpOutcome::Skipped);
    }
    if path.exists() {
        return Err(SortError::DestinationConflict {
            path: path.to_path_buf(),
            details: "exists and is not a directory".to_string(),
        });
    }
    fs::create_dir_all(path).map_err(|e| SortError::io("creating directory", e))?;
    Ok(OpOutcome::Applied)
}

fn copy_file(src: &Path, dst: &Path) -> Result<OpOutcome> {
    let src_len = file_len(src).ok_or_else(|| SortError::SourceMissing(src.to_path_buf()))?;
    if let Some(outcome) = check_existing_file(dst, src_len)? {
        return Ok(outcome);
    }
    atomic_copy(src, dst)?;
    Ok(OpOutcome::Applied)
}

fn move_file(src: &Path, dst: &Path) -> Result<OpOutcome> {
    let Some(src_len) = file_len(src) else {
        if dst.is_file() {
            return Ok(OpOutcome::Skipped);
        }
        return Err(SortError::SourceMissing(src.to_path_buf()));
    };
    if let Some(outcome) = check_existing_file(dst, src_len)? {
        tracing::warn!(
            src = %src.display(),
            dst = %dst.display(),
            "Destination already holds this file; source left in place"
        );
        return Ok(outcome);
    }

    if let Err(err) = fs::rename(src, dst) {
        // Rename fails across filesystems; fall back to copy + delete.
        tracing::debug!(error = %err, "Rename failed, copying instead");
        atomic_copy(src, dst)?;
        fs::remove_file(src).map_err(|e| SortError::io("removing moved source", e))?;
    }
    Ok(OpOutcome::Applied)
}

fn move_dir(src: &Path, dst: &Path) -> Result<OpOutcome> {
    if !src.is_dir() {
        if dst.is_dir() {
            return Ok(OpOutcome::Skipped);
        }
        return Err(SortError::SourceMissing(src.to_path_buf()));
    }
    if dst.exists() {
        return Err(SortError::DestinationConflict {
            path: dst.to_path_buf(),
            details: format!("cannot relocate {} over it", src.display()),
        });
    }

    if let Err(err) = fs::rename(src, dst) {
        tracing::debug!(error = %err, "Directory rename failed, copying instead");
        copy_tree(src, dst)?;
        fs::remove_dir_all(src).map_err(|e| SortError::io("removing moved directory", e))?;
    }
    Ok(OpOutcome::Applied)
}

fn copy_dir(src: &Path, dst: &Path) -> Result<OpOutcome> {
    if !src.is_dir() {
        return Err(SortError::SourceMissing(src.to_path_buf()));
    }
    if dst.exists() && !dst.is_dir() {
        return Err(SortError::DestinationConflict {
            path: dst.to_path_buf(),
            details: "exists and is not a directory".to_string(),
        });
    }
    let existed = dst.is_dir();
    if copy_tree(src, dst)? == 0 && existed {
        return Ok(OpOutcome::Skipped);
    }
    Ok(OpOutcome::Applied)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn file_len(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// `Some(Skipped)` when `dst` already matches, `None` when it is absent.
fn check_existing_file(dst: &Path, expected_len: u64) -> Result<Option<OpOutcome>> {
    if !dst.exists() {
        return Ok(None);
    }
    match file_len(dst) {
        Some(len) if len == expected_len => Ok(Some(OpOutcome::Skipped)),
        Some(len) => Err(SortError::DestinationConflict {
            path: dst.to_path_buf(),
            details: format!("size {} differs from source size {}", len, expected_len),
        }),
        None => Err(SortError::DestinationConflict {
            path: dst.to_path_buf(),
            details: "exists and is not a file".to_string(),
        }),
    }
}

/// Copies through a temp file in the destination directory, then renames it
/// into place without clobbering.
fn atomic_copy(src: &Path, dst: &Path) -> Result<()> {
    let parent = dst.parent().ok_or_else(|| {
        SortError::io(
            format!("copying to {}", dst.display()),
            io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"),
        )
    })?;

    let mut reader = fs::File::open(src).map_err(|e| SortError::io("opening source", e))?;
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| SortError::io(format!("creating temp file in {}", parent.display()), e))?;
    io::copy(&mut reader, &mut temp)
        .map_err(|e| SortError::io(format!("copying {}", src.display()), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| SortError::io(format!("syncing copy of {}", src.display()), e))?;
    temp.persist_noclobber(dst)
        .map_err(|e| SortError::io(format!("persisting {}", dst.display()), e.error))?;
    Ok(())
}

/// Copies every file under `src` into `dst`, keeping relative paths.
///
/// Files already present with the same size are left alone. Returns the
/// number of files written.
fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut pending = Vec::new();
    let mut subdirs = Vec::new();
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            SortError::io(
                format!("walking {}", src.display()),
                io::Error::new(io::ErrorKind::Other, e.to_string()),
            )
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            if target.exists() && !target.is_dir() {
                return Err(SortError::DestinationConflict {
                    path: target,
                    details: "exists and is not a directory".to_string(),
                });
            }
            subdirs.push(target);
            continue;
        }
        let len = entry
            .metadata()
            .map(|m| m.len())
            .map_err(|e| SortError::io(format!("reading {}", entry.path().display()), e.into()))?;
        if check_existing_file(&target, len)?.is_none() {
            pending.push((entry.into_path(), target));
        }
    }

    // Every conflict is found before the first write.
    fs::create_dir_all(dst).map_err(|e| SortError::io("creating directory", e))?;
    for dir in &subdirs {
        fs::create_dir_all(dir).map_err(|e| SortError::io("creating directory", e))?;
    }
    for (from, to) in &pending {
        atomic_copy(from, to)?;
    }
    Ok(pending.len())
}
