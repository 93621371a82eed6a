//! session-sort: reorganizes a motion-capture acquisition session.
//!
//! Reads a flat folder of camera recordings, works out which groups are
//! calibration footage and which are trials, then builds the calibration and
//! `Trial_N` folders the pose pipeline expects.
//!
//! ## Usage
//!
//! ```bash
//! session-sort /data/session_0917 --dry-run
//! session-sort /data/session_0917 --copy --output /data/session_0917_traitement
//! ```

mod logging;
mod report;

use clap::Parser;
use session_core::{
    load_sort_config, load_sort_config_from, ExecutionFailure, SessionClassifier, SortConfig,
    SortError,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "session-sort")]
#[command(about = "Sort acquisition footage into calibration and trial folders")]
#[command(version)]
struct Cli {
    /// Session folder holding the raw recordings (defaults to the current directory)
    #[arg(value_name = "SESSION")]
    session: Option<PathBuf>,

    /// Video file extension, matched case-insensitively (e.g. .MP4)
    #[arg(long, value_name = "EXT")]
    ext: Option<String>,

    /// Build the classified tree in this directory instead of the session
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Copy footage instead of moving it
    #[arg(long)]
    copy: bool,

    /// Print the plan without touching the disk
    #[arg(long)]
    dry_run: bool,

    /// Print the plan or run result as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file to use instead of the user default
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Sort(#[from] SortError),

    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    #[error("Cannot resolve the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn kind(&self) -> &'static str {
        match self {
            CliError::Sort(e) => e.kind(),
            CliError::Execution(failure) => failure.error.kind(),
            CliError::CurrentDir(_) => "Io",
            CliError::Json(_) => "Output",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let _logging_guard = logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        tracing::error!(kind = e.kind(), error = %e, "session-sort failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let base = match &cli.config {
        Some(path) => load_sort_config_from(path)?,
        None => load_sort_config(),
    };
    let config = apply_overrides(base, &cli);

    let session = match cli.session {
        Some(path) => path,
        None => std::env::current_dir().map_err(CliError::CurrentDir)?,
    };

    let classifier = SessionClassifier::new(session, config);
    let classification = classifier.classify()?;

    if cli.dry_run {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&classification)?);
        } else {
            print!("{}", report::render_plan(&classification));
        }
        return Ok(());
    }

    match classifier.execute(&classification) {
        Ok(run_report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&run_report)?);
            } else {
                print!("{}", report::render_report(&run_report));
            }
            Ok(())
        }
        Err(failure) => {
            if cli.json {
                let summary = report::FailureSummary::from(&failure);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                eprint!("{}", report::render_failure(&failure));
            }
            Err(failure.into())
        }
    }
}

/// Command-line flags win over the configuration file.
fn apply_overrides(mut config: SortConfig, cli: &Cli) -> SortConfig {
    if let Some(ext) = &cli.ext {
        config.video_extension = ext.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = Some(output.clone());
    }
    if cli.copy {
        config.preserve_sources = true;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "session-sort",
            "/data/session",
            "--ext",
            "mov",
            "--output",
            "/data/out",
            "--copy",
        ]);
        let config = apply_overrides(SortConfig::default(), &cli);

        assert_eq!(cli.session, Some(PathBuf::from("/data/session")));
        assert_eq!(config.video_extension, "mov");
        assert_eq!(config.output_dir, Some(PathBuf::from("/data/out")));
        assert!(config.preserve_sources);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::parse_from(["session-sort", "--dry-run"]);
        let base = SortConfig {
            preserve_sources: true,
            ..SortConfig::default()
        };
        let config = apply_overrides(base.clone(), &cli);

        assert!(cli.dry_run);
        assert!(cli.session.is_none());
        assert_eq!(config, base);
    }

    #[test]
    fn test_error_kind_comes_from_core() {
        let err = CliError::from(SortError::FileCountMismatch {
            nbfiles: 11,
            nbcam: 3,
            reserved_groups: 2,
        });
        assert_eq!(err.kind(), "FileCountMismatch");
    }
}
