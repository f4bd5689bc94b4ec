//! Deadline-enforced checker execution.
//!
//! The checker runs in a child interpreter so that a CPU-bound infinite loop
//! can be killed outright. The parent's only blocking point is the bounded
//! wait on the child; per artifact the lifecycle is
//! `Start → ChildLaunched → {Completed | TimedOut | Crashed}`, mapped onto
//! [`ExecutionVerdict`]. No retries: one timeout or exception is terminal
//! for the artifact.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::python::PythonRuntime;
use crate::recover::RecoveredSet;
use crate::verdict::ExecutionVerdict;

/// Run `checker` from the recovered set under isolation.
///
/// A missing checker is a recovery failure, not a checker failure: it yields
/// [`ExecutionVerdict::NotFound`] without spawning a child. Checker
/// assertion failures, runtime errors, and timeouts all come back as
/// verdicts rather than errors, so one hostile artifact cannot abort a
/// batch.
#[instrument(skip_all, fields(checker = %checker))]
pub fn run_checker(
    set: &RecoveredSet,
    checker: &str,
    runtime: &PythonRuntime,
) -> Result<ExecutionVerdict> {
    if !set.contains(checker) {
        debug!("checker not recovered");
        return Ok(ExecutionVerdict::NotFound);
    }
    let verdict = runtime.run_checker(&set.program(), checker)?;
    debug!(verdict = ?verdict, "checker finished");
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::ExecLimits;

    #[test]
    fn empty_set_is_not_found_without_spawning() {
        // An interpreter that cannot exist proves no child was launched.
        let runtime = PythonRuntime::new(
            "definitely-not-an-interpreter",
            ExecLimits::default_limits(),
        );
        let set = RecoveredSet::default();
        let verdict = run_checker(&set, "test_check", &runtime).expect("verdict");
        assert_eq!(verdict, ExecutionVerdict::NotFound);
    }
}
