//! Event-time progress: watermark generation, multi-input alignment, and
//! event-time timers.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{EventTime, Watermark};

mod timer_service;
mod tracker;
mod watermark;

pub use timer_service::*;
pub use tracker::*;
pub use watermark::*;

#[cfg(test)]
#[path = "tests/time_tests.rs"]
mod tests;
