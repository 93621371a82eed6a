//! Single-pass session classification.
//!
//! `SessionClassifier` wires the components together:
//!
//! ```text
//! inventory → calibration state → partition → plan → execution
//! ```
//!
//! [`SessionClassifier::classify`] runs every detection step and returns a
//! validated plan without touching the disk; any error there means nothing
//! was changed. [`SessionClassifier::execute`] is the only mutating step.

use crate::calibration::{detect_calibration_state, CalibrationReport};
use crate::config::SortConfig;
use crate::error::Result;
use crate::executor::{ExecutionFailure, ExecutionReport, PlanExecutor};
use crate::inventory::SessionInventory;
use crate::layout::SessionLayout;
use crate::partition::{partition, Partition};
use crate::plan::{Plan, PlanBuilder};
use serde::Serialize;
use std::path::PathBuf;

/// Everything learned about a session before execution.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub inventory: SessionInventory,
    pub calibration: CalibrationReport,
    pub partition: Partition,
    pub config_present: bool,
    pub plan: Plan,
}

pub struct SessionClassifier {
    layout: SessionLayout,
    config: SortConfig,
}

impl SessionClassifier {
    pub fn new(session_root: PathBuf, config: SortConfig) -> Self {
        let layout = match config.output_dir.clone() {
            Some(output) if output != session_root => {
                SessionLayout::with_output(session_root, output)
            }
            _ => SessionLayout::in_place(session_root),
        }
        .with_config_file_name(config.config_file_name.clone());
        Self { layout, config }
    }

    pub fn layout(&self) -> &SessionLayout {
        &self.layout
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Runs the detection phase and builds the plan. Read-only.
    pub fn classify(&self) -> Result<Classification> {
        let layout = &self.layout;
        let inventory =
            SessionInventory::scan(layout.session_root(), &self.config.video_extension)?;
        let calibration = detect_calibration_state(layout, &self.config.calibration_patterns);
        let partition = partition(&inventory.records, &inventory.cameras, calibration.state)?;

        let config_present = layout.session_config_file().is_file();
        if !config_present {
            tracing::warn!(
                path = %layout.session_config_file().display(),
                "No configuration file found; trials will not get a copy"
            );
        }

        let plan = PlanBuilder::new(layout)
            .preserve_sources(self.config.preserve_sources)
            .build(&calibration, &partition, config_present)?;

        Ok(Classification {
            inventory,
            calibration,
            partition,
            config_present,
            plan,
        })
    }

    /// Applies a classification's plan.
    pub fn execute(
        &self,
        classification: &Classification,
    ) -> std::result::Result<ExecutionReport, ExecutionFailure> {
        self.execute_until(classification, || true)
    }

    /// Applies a classification's plan, checking `should_continue` between
    /// operations.
    pub fn execute_until<F>(
        &self,
        classification: &Classification,
        should_continue: F,
    ) -> std::result::Result<ExecutionReport, ExecutionFailure>
    where
        F: FnMut() -> bool,
    {
        let report = PlanExecutor::new(&classification.plan).run(should_continue)?;
        tracing::info!(
            session = %self.layout.session_root().display(),
            output = %self.layout.output_root().display(),
            cameras = classification.partition.nbcam,
            trials = classification.partition.nbtrials,
            applied = report.applied(),
            skipped = report.skipped(),
            "Session classified"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationState;
    use fs_err as fs;
    use tempfile::tempdir;

    #[test]
    fn test_output_dir_equal_to_session_is_in_place() {
        let config = SortConfig {
            output_dir: Some(PathBuf::from("/data/session")),
            ..SortConfig::default()
        };
        let classifier = SessionClassifier::new(PathBuf::from("/data/session"), config);
        assert!(classifier.layout().is_in_place());
    }

    #[test]
    fn test_custom_config_file_name_reaches_layout() {
        let config = SortConfig {
            config_file_name: "Pose2Sim.toml".to_string(),
            ..SortConfig::default()
        };
        let classifier = SessionClassifier::new(PathBuf::from("/data/session"), config);
        assert_eq!(
            classifier.layout().trial_config_file(1),
            PathBuf::from("/data/session/Trial_1/Pose2Sim.toml")
        );
    }

    #[test]
    fn test_classify_is_read_only() {
        let dir = tempdir().unwrap();
        for minute in 0..3 {
            for cam in 1..=2 {
                let name = format!("20240917_10{:02}00-CAMERA{:02}.MP4", minute, cam);
                fs::write(dir.path().join(name), "x").unwrap();
            }
        }

        let classifier = SessionClassifier::new(dir.path().to_path_buf(), SortConfig::default());
        let classification = classifier.classify().unwrap();

        assert_eq!(classification.calibration.state, CalibrationState::None);
        assert_eq!(classification.partition.nbtrials, 1);
        assert!(!classification.config_present);
        assert!(!dir.path().join("calibration").exists());
        assert!(!dir.path().join("Trial_1").exists());
    }
}
