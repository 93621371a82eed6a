//! Human-readable and JSON rendering of plans and run results.

use serde::Serialize;
use session_core::{
    Classification, CompletedOperation, ExecutionFailure, ExecutionReport, OpOutcome, Operation,
};
use std::fmt::Write;

/// Summary of a classification followed by its numbered operations.
pub fn render_plan(classification: &Classification) -> String {
    let plan = &classification.plan;
    let partition = &classification.partition;
    let mut out = String::new();

    let _ = writeln!(out, "Session:     {}", plan.session_root.display());
    let _ = writeln!(out, "Output:      {}", plan.output_root.display());
    let _ = writeln!(
        out,
        "Cameras:     {} ({})",
        partition.nbcam,
        classification.inventory.cameras.tags().join(", ")
    );
    let _ = writeln!(
        out,
        "Calibration: {:?} ({} reserved group(s))",
        partition.state, partition.reserved_groups
    );
    let _ = writeln!(out, "Trials:      {}", partition.nbtrials);
    if !classification.config_present {
        let _ = writeln!(out, "Config:      missing, trials get no copy");
    }
    for skipped in &classification.inventory.skipped {
        let _ = writeln!(
            out,
            "Ignored:     {} ({})",
            skipped.path.display(),
            skipped.reason
        );
    }

    let _ = writeln!(out, "\nPlan ({} operations):", plan.len());
    for (index, operation) in plan.iter().enumerate() {
        let _ = writeln!(out, "{:>4}. {}", index + 1, operation);
    }
    out
}

pub fn render_report(report: &ExecutionReport) -> String {
    let mut out = String::new();
    for completed in &report.completed {
        let _ = writeln!(out, "{}", completed_line(completed));
    }
    let _ = write!(
        out,
        "Done: {} applied, {} skipped",
        report.applied(),
        report.skipped()
    );
    if report.cancelled {
        out.push_str(" (cancelled)");
    }
    out.push('\n');
    out
}

/// Lists what was done before the failing operation, then the failure itself.
pub fn render_failure(failure: &ExecutionFailure) -> String {
    let mut out = String::new();
    for completed in &failure.completed {
        let _ = writeln!(out, "{}", completed_line(completed));
    }
    let _ = writeln!(
        out,
        "failed {:>4}. {}: {}",
        failure.failed_index + 1,
        failure.operation,
        failure.error
    );
    let _ = writeln!(
        out,
        "{} operation(s) completed before the failure; nothing was rolled back",
        failure.completed.len()
    );
    out
}

#[derive(Serialize)]
pub struct FailureSummary<'a> {
    pub kind: &'static str,
    pub message: String,
    pub failed_index: usize,
    pub operation: &'a Operation,
    pub completed: &'a [CompletedOperation],
}

impl<'a> From<&'a ExecutionFailure> for FailureSummary<'a> {
    fn from(failure: &'a ExecutionFailure) -> Self {
        Self {
            kind: failure.error.kind(),
            message: failure.error.to_string(),
            failed_index: failure.failed_index,
            operation: &failure.operation,
            completed: &failure.completed,
        }
    }
}

fn completed_line(completed: &CompletedOperation) -> String {
    let marker = match completed.outcome {
        OpOutcome::Applied => "done   ",
        OpOutcome::Skipped => "skipped",
    };
    format!("{} {:>4}. {}", marker, completed.index + 1, completed.operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_core::SortError;
    use std::path::PathBuf;

    fn create(path: &str) -> Operation {
        Operation::CreateDir {
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_report_counts_outcomes() {
        let report = ExecutionReport {
            completed: vec![
                CompletedOperation {
                    index: 0,
                    operation: create("/s/calibration"),
                    outcome: OpOutcome::Applied,
                },
                CompletedOperation {
                    index: 1,
                    operation: create("/s/Trial_1"),
                    outcome: OpOutcome::Skipped,
                },
            ],
            cancelled: false,
        };

        let text = render_report(&report);
        assert!(text.contains("done       1. create_dir /s/calibration"));
        assert!(text.contains("skipped    2. create_dir /s/Trial_1"));
        assert!(text.ends_with("Done: 1 applied, 1 skipped\n"));
    }

    #[test]
    fn test_cancelled_report_is_flagged() {
        let report = ExecutionReport {
            completed: Vec::new(),
            cancelled: true,
        };
        assert!(render_report(&report).contains("(cancelled)"));
    }

    #[test]
    fn test_failure_names_operation_and_kind() {
        let failure = ExecutionFailure {
            failed_index: 1,
            operation: Operation::MoveFile {
                src: PathBuf::from("/s/a.MP4"),
                dst: PathBuf::from("/s/Trial_1/videos_raw/a.MP4"),
            },
            completed: vec![CompletedOperation {
                index: 0,
                operation: create("/s/Trial_1"),
                outcome: OpOutcome::Applied,
            }],
            error: SortError::SourceMissing(PathBuf::from("/s/a.MP4")),
        };

        let text = render_failure(&failure);
        assert!(text.contains("failed    2. move_file /s/a.MP4 -> /s/Trial_1/videos_raw/a.MP4"));
        assert!(text.contains("1 operation(s) completed"));

        let summary = FailureSummary::from(&failure);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "SourceMissing");
        assert_eq!(json["failed_index"], 1);
        assert_eq!(json["operation"]["op"], "move_file");
        assert_eq!(json["completed"].as_array().unwrap().len(), 1);
    }
}
