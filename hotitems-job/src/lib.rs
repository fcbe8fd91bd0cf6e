//! # hotitems-job
//!
//! Real-time top-N hot items: counts item views over sliding event-time
//! windows and ranks the items of every window once it closes.
//!
//! ```no_run
//! use hotitems_job::{CollectSink, HotItemsJob, JobConfig, UserBehavior};
//!
//! let job = HotItemsJob::new(JobConfig::default())?;
//! let events = vec![UserBehavior::new(1, 42, 7, "pv", 1_511_658_000)];
//! let mut sink = CollectSink::new();
//! job.run(events, &mut sink)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod functions;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod source;

pub use config::JobConfig;
pub use functions::{BehaviorFilter, CountAgg, TopNHotItems, WindowResultFunction};
pub use metrics::{JobMetrics, MetricsSnapshot};
pub use pipeline::{CancelHandle, HotItemsJob, JobSummary};
pub use record::{ItemViewCount, RecordError, UserBehavior};
pub use report::{CollectSink, RankedItem, RankingReport, ReportSink, WriterSink};
pub use source::{BehaviorReader, open_behaviors, read_behaviors};
