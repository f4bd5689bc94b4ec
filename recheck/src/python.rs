//! Child-interpreter plumbing shared by trial loading and checker execution.
//!
//! Every evaluation spawns a fresh `python3` child with the program delivered
//! on stdin. The child is the fault domain: it is killed unconditionally when
//! the deadline passes, and its standard streams never reach this process's
//! own. Cooperative cancellation is not an option here: the code under test
//! is untrusted and a CPU-bound loop never reaches a cancellation point.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{trace, warn};
use wait_timeout::ChildExt;

use crate::recover::{BlockEvaluator, LoadOutcome};
use crate::verdict::ExecutionVerdict;

/// Limits applied to every child interpreter.
#[derive(Debug, Clone, Copy)]
pub struct ExecLimits {
    /// Maximum wall-clock time before the child is killed.
    pub deadline: Duration,
}

impl ExecLimits {
    /// Default deadline: 2 seconds. Checkers are unit-style tests; a hang
    /// means the recovered code is broken, not slow.
    pub fn default_limits() -> Self {
        Self {
            deadline: Duration::from_secs(2),
        }
    }
}

const LOAD_EXIT_SYNTAX: i32 = 3;
const LOAD_EXIT_RUNTIME: i32 = 4;

/// Trial-load driver. Reads the candidate program from stdin and reports the
/// load outcome through the exit code. `input()` is replaced up front so a
/// stray interactive read cannot stall the trial, and both streams are
/// pointed at the null device.
const LOAD_DRIVER: &str = r#"
import builtins, os, sys
src = sys.stdin.read()
builtins.input = lambda prompt='': '42'
sink = open(os.devnull, 'w')
sys.stdout = sink
sys.stderr = sink
try:
    code = compile(src, '<artifact>', 'exec')
except SyntaxError:
    sys.exit(3)
try:
    exec(code, {'__name__': '__recovery__'})
except BaseException:
    sys.exit(4)
"#;

/// Checker driver. Runs the recovered program from stdin in a fresh
/// namespace, then calls the checker named at the `__CHECKER__` marker. The
/// real stdout is duplicated onto a private channel fd before fds 1 and 2
/// are pointed at the null device. Anything the checker prints (even via
/// `sys.__stdout__` or raw fd writes) is discarded while the single JSON
/// verdict record still reaches the parent.
const CHECK_DRIVER: &str = r#"
import builtins, json, os, sys
src = sys.stdin.read()
builtins.input = lambda prompt='': '42'
channel = os.fdopen(os.dup(1), 'w')
sink = open(os.devnull, 'w')
os.dup2(sink.fileno(), 1)
os.dup2(sink.fileno(), 2)
sys.stdout = sink
sys.stderr = sink
try:
    ns = {'__name__': '__recovery__'}
    exec(compile(src, '<artifact>', 'exec'), ns)
    fn = ns.get('__CHECKER__')
    if not callable(fn):
        record = {'status': 'missing'}
    else:
        value = fn()
        try:
            encoded = json.dumps(value)
        except (TypeError, ValueError):
            encoded = json.dumps(repr(value))
        record = {'status': 'success', 'value': json.loads(encoded)}
except BaseException as exc:
    record = {'status': 'exception', 'kind': type(exc).__name__, 'message': str(exc)}
channel.write(json.dumps(record) + '\n')
channel.flush()
"#;

/// One-shot record the child writes on its verdict channel.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ChildRecord {
    Success {
        #[serde(default)]
        value: serde_json::Value,
    },
    Exception {
        kind: String,
        message: String,
    },
    Missing,
}

/// Spawns child interpreters for trial loads and checker runs.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    python: String,
    limits: ExecLimits,
}

impl PythonRuntime {
    pub fn new(python: impl Into<String>, limits: ExecLimits) -> Self {
        Self {
            python: python.into(),
            limits,
        }
    }

    pub fn with_default_limits() -> Self {
        Self::new("python3", ExecLimits::default_limits())
    }

    pub fn limits(&self) -> ExecLimits {
        self.limits
    }

    /// Run the checker named `checker` against the recovered program.
    ///
    /// Callers decide `NotFound` before spawning; the child's own `missing`
    /// record is only a backstop and maps to the same verdict.
    pub fn run_checker(&self, program: &str, checker: &str) -> Result<ExecutionVerdict> {
        validate_identifier(checker)?;
        let driver = CHECK_DRIVER.replace("__CHECKER__", checker);

        let mut child = Command::new(&self.python)
            .arg("-c")
            .arg(driver)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn {}", self.python))?;
        feed_stdin(&mut child, program)?;

        let status = match child
            .wait_timeout(self.limits.deadline)
            .context("wait for checker")?
        {
            Some(status) => status,
            None => {
                warn!(
                    deadline_secs = self.limits.deadline.as_secs_f64(),
                    "checker deadline exceeded, killing child"
                );
                child.kill().ok();
                child.wait().context("reap killed checker")?;
                return Ok(ExecutionVerdict::Timeout);
            }
        };

        let mut raw = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut raw).context("read verdict channel")?;
        }
        trace!(exit_code = ?status.code(), channel_bytes = raw.len(), "checker child exited");
        Ok(decode_record(&raw, status.code()))
    }
}

impl BlockEvaluator for PythonRuntime {
    fn try_load(&mut self, program: &str) -> Result<LoadOutcome> {
        let mut child = Command::new(&self.python)
            .arg("-c")
            .arg(LOAD_DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn {}", self.python))?;
        feed_stdin(&mut child, program)?;

        let status = match child
            .wait_timeout(self.limits.deadline)
            .context("wait for trial load")?
        {
            Some(status) => status,
            None => {
                child.kill().ok();
                child.wait().context("reap killed trial")?;
                return Ok(LoadOutcome::TimedOut);
            }
        };
        Ok(match status.code() {
            Some(0) => LoadOutcome::Loaded,
            Some(LOAD_EXIT_SYNTAX) => LoadOutcome::SyntaxError,
            Some(LOAD_EXIT_RUNTIME) => LoadOutcome::RuntimeError,
            // Killed by a signal or an interpreter abort: not loadable.
            _ => LoadOutcome::RuntimeError,
        })
    }
}

fn feed_stdin(child: &mut Child, program: &str) -> Result<()> {
    let mut stdin = child.stdin.take().context("child stdin unavailable")?;
    stdin
        .write_all(program.as_bytes())
        .context("write program to child")?;
    // Dropping stdin closes the pipe; the driver reads until EOF.
    Ok(())
}

/// Decode the last parseable record on the channel. The checker cannot write
/// to the channel fd, but scanning from the end keeps decoding robust if the
/// interpreter itself emits anything unexpected.
fn decode_record(raw: &str, exit_code: Option<i32>) -> ExecutionVerdict {
    for line in raw.lines().rev() {
        if let Ok(record) = serde_json::from_str::<ChildRecord>(line) {
            return match record {
                ChildRecord::Success { value } => ExecutionVerdict::Success { value },
                ChildRecord::Exception { kind, message } => {
                    ExecutionVerdict::Exception { kind, message }
                }
                ChildRecord::Missing => ExecutionVerdict::NotFound,
            };
        }
    }
    // Child died without reporting (os._exit, interpreter abort).
    let message = match exit_code {
        Some(code) => format!("child exited with code {code} without a verdict"),
        None => "child was killed by a signal without a verdict".to_string(),
    };
    ExecutionVerdict::Exception {
        kind: "ChildExit".to_string(),
        message,
    }
}

fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        bail!("checker name must be non-empty");
    };
    let head_ok = first.is_ascii_alphabetic() || first == '_';
    if !head_ok || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        bail!("checker name {name:?} is not a plain identifier");
    }
    Ok(())
}
