use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use recheck::batch::{BatchConfig, run_batch};
use recheck::logging;
use recheck::python::{ExecLimits, PythonRuntime};

/// Check generated code artifacts: recover loadable function definitions
/// from each file and run its checker under timeout and fault isolation.
#[derive(Parser)]
#[command(name = "recheck", version, about)]
struct Cli {
    /// Directory with generated artifacts, one `.py` file per task.
    #[arg(long)]
    indir: PathBuf,
    /// Destination CSV report.
    #[arg(long)]
    outfile: PathBuf,
    /// Checker function to run from each artifact.
    #[arg(long, default_value = "test_check")]
    checker: String,
    /// Wall-clock deadline in seconds for each child interpreter.
    #[arg(long, default_value_t = 2)]
    timeout_secs: u64,
    /// Interpreter used for trial loads and checker runs.
    #[arg(long, default_value = "python3")]
    python: String,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let limits = ExecLimits {
        deadline: Duration::from_secs(cli.timeout_secs),
    };
    let runtime = PythonRuntime::new(cli.python, limits);
    let config = BatchConfig {
        indir: cli.indir,
        outfile: cli.outfile,
        checker: cli.checker,
    };

    let summary = run_batch(&config, &runtime)?;
    println!(
        "batch: rows={} passed={} failed={} skipped={} report={}",
        summary.rows,
        summary.passed,
        summary.failed,
        summary.skipped,
        config.outfile.display()
    );
    Ok(())
}
