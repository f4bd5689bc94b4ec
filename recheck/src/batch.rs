//! Directory-level batch orchestration.
//!
//! Discovers `*.py` artifacts, runs the recover-then-check pipeline on each,
//! and writes the CSV report at the end. One readable artifact yields
//! exactly one row; a malformed filename or unreadable file is logged and
//! skipped, never aborting the batch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::artifact::{SourceArtifact, parse_filename};
use crate::execute::run_checker;
use crate::python::PythonRuntime;
use crate::recover::recover;
use crate::report::{ReportRow, write_report};

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory of artifacts, one `.py` file per task.
    pub indir: PathBuf,
    /// Destination CSV report.
    pub outfile: PathBuf,
    /// Name of the checker function to run from each artifact.
    pub checker: String,
}

/// Totals for a completed batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// List artifact files (`*.py`) in `indir`, sorted by path.
pub fn discover_artifacts(indir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(indir).with_context(|| format!("read {}", indir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("py") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Process every artifact in the input directory and write the CSV report.
#[instrument(skip_all, fields(indir = %config.indir.display()))]
pub fn run_batch(config: &BatchConfig, runtime: &PythonRuntime) -> Result<BatchSummary> {
    let paths = discover_artifacts(&config.indir)?;
    info!(artifacts = paths.len(), checker = %config.checker, "batch started");

    let mut summary = BatchSummary::default();
    let mut rows = Vec::with_capacity(paths.len());
    for path in &paths {
        match process_artifact(path, &config.checker, runtime) {
            Ok(row) => {
                if row.result {
                    summary.passed += 1;
                } else {
                    summary.failed += 1;
                }
                rows.push(row);
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(artifact = %path.display(), error = %reason, "skipping artifact");
                summary.skipped += 1;
            }
        }
    }
    summary.rows = rows.len();

    write_report(&config.outfile, &rows).context("write report")?;
    info!(
        rows = summary.rows,
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch complete"
    );
    Ok(summary)
}

/// Recover one artifact and run its checker. Errors here mean the artifact
/// itself was unusable (bad filename, unreadable file); checker failures
/// become rows, not errors.
#[instrument(skip_all, fields(artifact = %path.display()))]
fn process_artifact(path: &Path, checker: &str, runtime: &PythonRuntime) -> Result<ReportRow> {
    let artifact = SourceArtifact::load(path)?;
    let meta = parse_filename(&artifact.filename)?;

    let mut evaluator = runtime.clone();
    let set = recover(&artifact.text, &mut evaluator)?;
    debug!(functions = set.functions().len(), "recovery finished");

    let verdict = run_checker(&set, checker, runtime)?;
    Ok(ReportRow::new(&artifact.filename, meta, &verdict, checker))
}
