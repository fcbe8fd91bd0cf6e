//! Job configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Tunables for a hot-items run.
///
/// Every field has a default, so a config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    pub window_length_minutes: u64,
    pub slide_minutes: u64,
    pub top_n: usize,
    /// Only events with this behavior are counted.
    pub filter_action: String,
    pub window_parallelism: usize,
    pub ranker_parallelism: usize,
    pub channel_capacity: usize,
    /// Ranking buffers per ranker task above which an alarm is logged.
    pub max_pending_windows: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            window_length_minutes: 60,
            slide_minutes: 5,
            top_n: 10,
            filter_action: "pv".to_string(),
            window_parallelism: 1,
            ranker_parallelism: 1,
            channel_capacity: 1024,
            max_pending_windows: 1024,
        }
    }
}

impl JobConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.window_length_minutes > 0, "window_length_minutes must be positive");
        ensure!(self.slide_minutes > 0, "slide_minutes must be positive");
        ensure!(
            self.slide_minutes <= self.window_length_minutes,
            "slide_minutes ({}) must not exceed window_length_minutes ({})",
            self.slide_minutes,
            self.window_length_minutes
        );
        ensure!(self.top_n > 0, "top_n must be positive");
        ensure!(!self.filter_action.is_empty(), "filter_action must not be empty");
        ensure!(self.window_parallelism > 0, "window_parallelism must be positive");
        ensure!(self.ranker_parallelism > 0, "ranker_parallelism must be positive");
        ensure!(self.channel_capacity > 0, "channel_capacity must be positive");
        ensure!(self.max_pending_windows > 0, "max_pending_windows must be positive");
        Ok(())
    }

    pub fn window_length(&self) -> Duration {
        Duration::from_secs(self.window_length_minutes.saturating_mul(60))
    }

    pub fn slide(&self) -> Duration {
        Duration::from_secs(self.slide_minutes.saturating_mul(60))
    }
}
