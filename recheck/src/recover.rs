//! Block recovery from malformed generated source.
//!
//! Walks an artifact line by line, accumulating a candidate block and
//! trial-loading the program after every append. A block that fails to parse
//! or raises on load is dropped whole and accumulation resumes at the next
//! line, so one broken block never poisons the blocks before or after it.
//!
//! Body absorption is deliberately lexical, not indentation-aware: once a
//! complete `def` header is seen, every following line up to the next line
//! containing `def` is treated as body. Nested and decorated definitions are
//! absorbed into the enclosing block.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, trace};

/// Outcome of trial-loading a candidate program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Parsed and executed without raising.
    Loaded,
    /// Did not parse.
    SyntaxError,
    /// Parsed but raised while being defined or evaluated.
    RuntimeError,
    /// Evaluation exceeded the trial deadline and was killed. Happens when
    /// garbage contains a stray top-level statement that loops forever.
    TimedOut,
}

/// Trial evaluation of an accumulated program in a scratch namespace.
///
/// The scratch namespace is discarded on failure; the recoverer merges the
/// candidate block into its registry only on [`LoadOutcome::Loaded`].
pub trait BlockEvaluator {
    fn try_load(&mut self, program: &str) -> Result<LoadOutcome>;
}

/// One successfully recovered definition and the exact block it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredDefinition {
    pub name: String,
    pub source: String,
}

/// Registry of everything recovered from one artifact.
///
/// Rebuilt fresh per artifact; nothing leaks between artifacts. Blocks are
/// kept in source order, stray top-level statements included, since later
/// definitions may depend on them. The name map keeps the last successful
/// definition for each name, mirroring normal redefinition semantics.
#[derive(Debug, Default)]
pub struct RecoveredSet {
    blocks: Vec<String>,
    functions: BTreeMap<String, RecoveredDefinition>,
}

impl RecoveredSet {
    /// Named definitions recovered from the artifact.
    pub fn functions(&self) -> &BTreeMap<String, RecoveredDefinition> {
        &self.functions
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Full program text replaying every recovered block in source order.
    pub fn program(&self) -> String {
        self.blocks.concat()
    }

    fn push(&mut self, block: String) {
        if let Some(name) = definition_name(&block) {
            self.functions.insert(
                name.clone(),
                RecoveredDefinition {
                    name,
                    source: block.clone(),
                },
            );
        }
        self.blocks.push(block);
    }
}

static DEF_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*def\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());

fn definition_name(block: &str) -> Option<String> {
    let header = block.lines().next()?;
    DEF_NAME.captures(header).map(|caps| caps[1].to_string())
}

/// A `def` line whose header is complete on that line.
fn is_def_header(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("def ") && trimmed.ends_with(':')
}

/// Recover every independently loadable definition from `text`.
///
/// Each candidate block is trial-loaded together with everything already
/// recovered, so a definition may freely call earlier recovered ones. An
/// artifact with no loadable definitions yields an empty set, not an error.
pub fn recover(text: &str, evaluator: &mut dyn BlockEvaluator) -> Result<RecoveredSet> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut set = RecoveredSet::default();
    let mut block = String::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        block.push_str(line);
        block.push('\n');

        if is_def_header(line) {
            // Absorb the body up to the next def-ish line. Blank lines are
            // preserved in the block text but do not count as body.
            let mut body_lines = 0;
            while i + 1 < lines.len() && !lines[i + 1].contains("def") {
                i += 1;
                let body = lines[i];
                if !body.trim().is_empty() {
                    body_lines += 1;
                }
                block.push_str(body);
                block.push('\n');
            }
            if body_lines == 0 {
                block.push_str("\tpass\n");
            }
        }

        let candidate = format!("{}{}", set.program(), block);
        match evaluator.try_load(&candidate)? {
            LoadOutcome::Loaded => {
                trace!(block_bytes = block.len(), "block loaded");
                set.push(std::mem::take(&mut block));
            }
            outcome => {
                trace!(?outcome, block_bytes = block.len(), "block dropped");
                block.clear();
            }
        }
        i += 1;
    }

    debug!(
        functions = set.functions.len(),
        blocks = set.blocks.len(),
        "recovery complete"
    );
    Ok(set)
}
