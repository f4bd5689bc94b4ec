//! Recovery and checked execution of generated code artifacts.
//!
//! Generated source files are frequently truncated, interleaved with prose,
//! or outright malformed. This crate recovers every independently loadable
//! function definition from such a file and runs a designated checker
//! function under process-level isolation: bounded wall-clock time,
//! suppressed output, and full fault containment. The calling process never
//! crashes or hangs on account of a hostile artifact.
//!
//! The pipeline per artifact:
//!
//! - **[`recover`]**: line-driven block recovery with trial evaluation.
//!   Produces a per-artifact registry of loadable blocks and named
//!   definitions; a malformed block is dropped whole without poisoning its
//!   neighbors.
//! - **[`execute`]**: runs the checker from the recovered set in a child
//!   interpreter with a hard deadline, mapping the result to a four-way
//!   [`verdict::ExecutionVerdict`].
//! - **[`batch`]**: iterates a directory of artifacts and writes one CSV
//!   report row per readable artifact.

pub mod artifact;
pub mod batch;
pub mod execute;
pub mod logging;
pub mod python;
pub mod recover;
pub mod report;
pub mod verdict;
