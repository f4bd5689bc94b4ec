//! Report rows and CSV emission.
//!
//! One row per readable artifact: the checker verdict flattened next to the
//! metadata parsed from the filename. Rows accumulate into a flat table with
//! no cross-row relationships; duplicate test id / parameter tuples are
//! tolerated.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::artifact::ArtifactMeta;
use crate::verdict::ExecutionVerdict;

/// One row of the batch report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub filename: String,
    /// Failure description, `None` when the checker passed.
    pub error: Option<String>,
    pub result: bool,
    pub test_id: String,
    pub t: Option<f64>,
    pub s: Option<i64>,
    pub k: Option<i64>,
    pub p: Option<f64>,
}

impl ReportRow {
    pub fn new(
        filename: &str,
        meta: ArtifactMeta,
        verdict: &ExecutionVerdict,
        checker: &str,
    ) -> Self {
        let error = error_message(verdict, checker);
        Self {
            filename: filename.to_string(),
            result: error.is_none(),
            error,
            test_id: meta.test_id,
            t: meta.t,
            s: meta.s,
            k: meta.k,
            p: meta.p,
        }
    }
}

fn error_message(verdict: &ExecutionVerdict, checker: &str) -> Option<String> {
    match verdict {
        ExecutionVerdict::Success { .. } => None,
        ExecutionVerdict::Timeout => Some("Too long execution".to_string()),
        ExecutionVerdict::Exception { kind, message } if kind == "AssertionError" => {
            Some(format!("Assertion error encountered: {message}"))
        }
        ExecutionVerdict::Exception { kind, message } => Some(format!("{kind}: {message}")),
        ExecutionVerdict::NotFound => Some(format!("No {checker} function found.")),
    }
}

/// Write all rows as CSV, header first. Column order matches [`ReportRow`]
/// field order.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut out = String::from("filename,error,result,test_id,t,s,k,p\n");
    for row in rows {
        let fields = [
            csv_field(&row.filename),
            csv_field(row.error.as_deref().unwrap_or("")),
            row.result.to_string(),
            csv_field(&row.test_id),
            optional(row.t),
            optional(row.s),
            optional(row.k),
            optional(row.p),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("write report {}", path.display()))?;
    Ok(())
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|inner| inner.to_string()).unwrap_or_default()
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn meta(test_id: &str) -> ArtifactMeta {
        ArtifactMeta {
            test_id: test_id.to_string(),
            t: Some(0.2),
            s: Some(2),
            k: Some(50),
            p: Some(0.9),
        }
    }

    #[test]
    fn success_row_has_empty_error() {
        let verdict = ExecutionVerdict::Success {
            value: serde_json::Value::Null,
        };
        let row = ReportRow::new("task7_t0.2.py", meta("task7"), &verdict, "test_check");
        assert!(row.result);
        assert_eq!(row.error, None);
    }

    #[test]
    fn assertion_failures_keep_the_original_phrasing() {
        let verdict = ExecutionVerdict::Exception {
            kind: "AssertionError".to_string(),
            message: "expected 3".to_string(),
        };
        let row = ReportRow::new("task7.py", meta("task7"), &verdict, "test_check");
        assert_eq!(
            row.error.as_deref(),
            Some("Assertion error encountered: expected 3")
        );
        assert!(!row.result);
    }

    #[test]
    fn generic_exceptions_carry_their_kind() {
        let verdict = ExecutionVerdict::Exception {
            kind: "ZeroDivisionError".to_string(),
            message: "division by zero".to_string(),
        };
        let row = ReportRow::new("task7.py", meta("task7"), &verdict, "test_check");
        assert_eq!(
            row.error.as_deref(),
            Some("ZeroDivisionError: division by zero")
        );
    }

    #[test]
    fn timeout_and_not_found_messages() {
        let row = ReportRow::new("a.py", meta("a"), &ExecutionVerdict::Timeout, "test_check");
        assert_eq!(row.error.as_deref(), Some("Too long execution"));

        let row = ReportRow::new("a.py", meta("a"), &ExecutionVerdict::NotFound, "test_check");
        assert_eq!(row.error.as_deref(), Some("No test_check function found."));
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn writes_header_and_rows() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("report.csv");

        let verdict = ExecutionVerdict::Success {
            value: serde_json::Value::Null,
        };
        let rows = vec![ReportRow::new(
            "task7_t0.2_s2_k50_p0.9.py",
            meta("task7"),
            &verdict,
            "test_check",
        )];
        write_report(&path, &rows).expect("write");

        let contents = fs::read_to_string(&path).expect("read back");
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("filename,error,result,test_id,t,s,k,p"));
        assert_eq!(
            lines.next(),
            Some("task7_t0.2_s2_k50_p0.9.py,,true,task7,0.2,2,50,0.9")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn absent_parameters_are_empty_fields() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("report.csv");

        let rows = vec![ReportRow::new(
            "task7.py",
            ArtifactMeta {
                test_id: "task7".to_string(),
                ..ArtifactMeta::default()
            },
            &ExecutionVerdict::NotFound,
            "test_check",
        )];
        write_report(&path, &rows).expect("write");

        let contents = fs::read_to_string(&path).expect("read back");
        assert!(contents.contains("task7.py,No test_check function found.,false,task7,,,,\n"));
    }
}
