//! Artifact loading and filename metadata parsing.
//!
//! An artifact is one generated source file, named by the convention
//! `<test_id>_t<float>_s<int>_k<int>_p<float>.py` where each generation
//! parameter token is optional and may appear in any position. Tokens that
//! match none of the parameter patterns are joined by `_` to form the test
//! identifier.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

/// One generated source file. Immutable once read; consumed by recovery.
#[derive(Debug, Clone)]
pub struct SourceArtifact {
    pub filename: String,
    pub text: String,
}

impl SourceArtifact {
    /// Read an artifact from disk. An unreadable file (missing, not UTF-8)
    /// is an input error for that artifact only.
    pub fn load(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .with_context(|| format!("artifact path {} has no usable filename", path.display()))?;
        let text = fs::read_to_string(path)
            .with_context(|| format!("read artifact {}", path.display()))?;
        Ok(Self { filename, text })
    }
}

/// Generation metadata encoded in an artifact's filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArtifactMeta {
    /// Leftover filename tokens joined by `_`.
    pub test_id: String,
    /// Sampling temperature (`t` token).
    pub t: Option<f64>,
    /// Random seed (`s` token).
    pub s: Option<i64>,
    /// Top-k (`k` token).
    pub k: Option<i64>,
    /// Top-p (`p` token).
    pub p: Option<f64>,
}

static T_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^t(\d+(\.\d+)?)$").unwrap());
static S_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^s(\d+)$").unwrap());
static K_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^k(\d+)$").unwrap());
static P_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^p(\d+(\.\d+)?)$").unwrap());

/// Parse generation metadata out of an artifact filename.
///
/// The `.py` suffix is stripped before tokenizing; a filename without it is
/// an input-format error.
pub fn parse_filename(filename: &str) -> Result<ArtifactMeta> {
    let stem = filename
        .strip_suffix(".py")
        .with_context(|| format!("artifact filename {filename:?} must end with .py"))?;

    let mut meta = ArtifactMeta::default();
    let mut id_parts = Vec::new();
    for part in stem.split('_') {
        if let Some(caps) = T_TOKEN.captures(part) {
            meta.t = Some(caps[1].parse().context("parse t token")?);
        } else if let Some(caps) = S_TOKEN.captures(part) {
            meta.s = Some(caps[1].parse().context("parse s token")?);
        } else if let Some(caps) = K_TOKEN.captures(part) {
            meta.k = Some(caps[1].parse().context("parse k token")?);
        } else if let Some(caps) = P_TOKEN.captures(part) {
            meta.p = Some(caps[1].parse().context("parse p token")?);
        } else {
            id_parts.push(part);
        }
    }
    meta.test_id = id_parts.join("_");
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_parameter_set() {
        let meta = parse_filename("task7_t0.2_s2_k50_p0.9.py").expect("parse");
        assert_eq!(meta.test_id, "task7");
        assert_eq!(meta.t, Some(0.2));
        assert_eq!(meta.s, Some(2));
        assert_eq!(meta.k, Some(50));
        assert_eq!(meta.p, Some(0.9));
    }

    #[test]
    fn bare_name_has_no_parameters() {
        let meta = parse_filename("task7.py").expect("parse");
        assert_eq!(meta.test_id, "task7");
        assert_eq!(meta.t, None);
        assert_eq!(meta.s, None);
        assert_eq!(meta.k, None);
        assert_eq!(meta.p, None);
    }

    #[test]
    fn leftover_tokens_join_across_parameters() {
        // Parameter tokens are classified wherever they appear; everything
        // else keeps its relative order in the test id.
        let meta = parse_filename("mbpp_t0.5_56_checks_s1.py").expect("parse");
        assert_eq!(meta.test_id, "mbpp_56_checks");
        assert_eq!(meta.t, Some(0.5));
        assert_eq!(meta.s, Some(1));
    }

    #[test]
    fn integer_temperature_parses() {
        let meta = parse_filename("task_t1.py").expect("parse");
        assert_eq!(meta.t, Some(1.0));
    }

    #[test]
    fn lookalike_tokens_stay_in_test_id() {
        // `t` followed by non-digits is not a temperature token.
        let meta = parse_filename("true_story_s3.py").expect("parse");
        assert_eq!(meta.test_id, "true_story");
        assert_eq!(meta.s, Some(3));
        assert_eq!(meta.t, None);
    }

    #[test]
    fn missing_extension_is_an_error() {
        let err = parse_filename("task7").expect_err("no extension");
        assert!(err.to_string().contains("must end with .py"));
    }
}
