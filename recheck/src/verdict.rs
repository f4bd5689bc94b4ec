//! Structured outcome of one checker run.

use serde::{Deserialize, Serialize};

/// Four-way verdict for one artifact's checker.
///
/// Produced exactly once per artifact. Carries no reference to the recovered
/// source; the source is discarded once the verdict exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionVerdict {
    /// Checker returned within the deadline; carries the decoded return
    /// value (JSON where possible, `repr` string otherwise).
    Success { value: serde_json::Value },
    /// Checker exceeded the deadline and the child was killed.
    Timeout,
    /// Checker (or the program load inside the child) raised. Assertion
    /// failures land here with kind `AssertionError`.
    Exception { kind: String, message: String },
    /// No definition with the checker's name was recovered. A recovery
    /// failure, distinct from a checker failure.
    NotFound,
}

impl ExecutionVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, ExecutionVerdict::Success { .. })
    }
}
