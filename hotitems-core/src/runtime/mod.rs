//! Task runtime: the source loop and the per-operator task loop.
//!
//! ```text
//! SourceTask ──(partitioned records, broadcast watermarks)──▶ Task × N ──▶ Task × M ──▶ collector
//! ```
//!
//! Every task runs on its own thread and owns its operator and state.

pub mod source;
pub mod task;

pub use source::{SourceSummary, SourceTask};
pub use task::{Task, TaskSummary};

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
