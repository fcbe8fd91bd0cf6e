//! Event-time windowing: window assigners, window functions, and the
//! incremental aggregating window operator.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use anyhow::{Result, ensure};

use crate::operator::Operator;
use crate::time::{EVENT_TIME_MIN, TimerService};
use crate::types::{EventTime, StreamData, StreamRecord};

mod assigners;
mod functions;
mod operator;
mod primitives;

pub use assigners::*;
pub use functions::*;
pub use operator::*;
pub use primitives::*;

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
