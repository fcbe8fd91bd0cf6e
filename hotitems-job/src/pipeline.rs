//! Wiring of the hot-items dataflow onto threads.
//!
//! ```text
//!                     hash(item_id)              hash(window_end)
//! source ──────────────▶ window-0..N ──────────────▶ ranker-0..M ──▶ collector ──▶ ReportSink
//! (timestamps,           (sliding windows,           (buffer per window,
//!  watermarks, filter)    incremental counts)         timer at end + 1)
//! ```
//!
//! Every ranker reads from every window task, so its event-time clock is the
//! minimum watermark over all of them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use anyhow::{Result, anyhow};
use hotitems_core::channel::{ChannelClosed, LocalChannelReceiver, LocalChannelSender, local_channel};
use hotitems_core::input_gate::InputGate;
use hotitems_core::operator::FilterOperator;
use hotitems_core::output_gate::OutputGate;
use hotitems_core::partitioner::{ForwardPartitioner, HashPartitioner};
use hotitems_core::process::KeyedProcessOperator;
use hotitems_core::runtime::{SourceSummary, SourceTask, Task};
use hotitems_core::state::HashMapStateBackend;
use hotitems_core::time::{AscendingTimestamps, EVENT_TIME_MAX};
use hotitems_core::types::StreamElement;
use hotitems_core::window::{AggregatingWindowOperator, SlidingEventTimeWindows};
use tracing::{debug, error, info, warn};

use crate::config::JobConfig;
use crate::functions::{BehaviorFilter, CountAgg, TopNHotItems, WindowResultFunction};
use crate::metrics::{JobMetrics, MetricsSnapshot};
use crate::record::{ItemViewCount, UserBehavior};
use crate::report::{RankingReport, ReportSink};

/// Stops a running job from another thread.
///
/// The source stops reading at its next event and closes the pipeline
/// without a final watermark: windows and ranking buffers that have not
/// fired yet are dropped, nothing partial is reported.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Outcome of [`HotItemsJob::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSummary {
    pub cancelled: bool,
    pub metrics: MetricsSnapshot,
}

/// The top-N hot items job.
pub struct HotItemsJob {
    config: JobConfig,
    metrics: JobMetrics,
    cancelled: Arc<AtomicBool>,
}

impl HotItemsJob {
    pub fn new(config: JobConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: JobMetrics::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn metrics(&self) -> JobMetrics {
        self.metrics.clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Run the job over `events`, delivering reports to `sink` on the
    /// calling thread. Returns once the input is exhausted (every window
    /// ranked) or the job was cancelled.
    ///
    /// Events that fail [`UserBehavior::validate`] are counted as malformed
    /// and skipped.
    pub fn run<I, S>(&self, events: I, sink: &mut S) -> Result<JobSummary>
    where
        I: IntoIterator<Item = UserBehavior>,
        I::IntoIter: Send,
        S: ReportSink + ?Sized,
    {
        let config = &self.config;
        let assigner = SlidingEventTimeWindows::of(config.window_length(), config.slide())?;
        let window_tasks = config.window_parallelism;
        let ranker_tasks = config.ranker_parallelism;
        let capacity = config.channel_capacity;

        let (source_txs, source_rxs): (Vec<_>, Vec<_>) =
            (0..window_tasks).map(|_| local_channel::<UserBehavior>(capacity)).unzip();

        let mut window_outputs: Vec<Vec<LocalChannelSender<ItemViewCount>>> =
            (0..window_tasks).map(|_| Vec::with_capacity(ranker_tasks)).collect();
        let mut ranker_inputs: Vec<Vec<LocalChannelReceiver<ItemViewCount>>> =
            (0..ranker_tasks).map(|_| Vec::with_capacity(window_tasks)).collect();
        for outputs in &mut window_outputs {
            for inputs in &mut ranker_inputs {
                let (tx, rx) = local_channel(capacity);
                outputs.push(tx);
                inputs.push(rx);
            }
        }

        let (report_txs, report_rxs): (Vec<_>, Vec<_>) =
            (0..ranker_tasks).map(|_| local_channel::<RankingReport>(capacity)).unzip();

        info!(
            window_minutes = config.window_length_minutes,
            slide_minutes = config.slide_minutes,
            top_n = config.top_n,
            action = %config.filter_action,
            window_tasks,
            ranker_tasks,
            "starting hot items job"
        );
        let started = Instant::now();

        let outcome = thread::scope(|scope| {
            let filter = BehaviorFilter::new(config.filter_action.clone());
            let source = SourceTask::new(
                // Intake has already dropped events without an event time.
                AscendingTimestamps::new(|e: &UserBehavior| {
                    e.event_time_ms().unwrap_or(EVENT_TIME_MAX)
                }),
                FilterOperator::new(move |e: &UserBehavior| filter.accept(e)),
                OutputGate::new(source_txs),
                HashPartitioner::new(|e: &UserBehavior| e.item_id),
            )
            .with_cancel_flag(Arc::clone(&self.cancelled));
            let metrics = self.metrics.clone();
            let events = events.into_iter().filter(move |event| match event.validate() {
                Ok(()) => true,
                Err(err) => {
                    metrics.inc_malformed_records(1);
                    warn!(user_id = event.user_id, item_id = event.item_id, %err, "skipping invalid event");
                    false
                }
            });
            let source_handle = scope.spawn(move || source.run(events));

            let window_handles: Vec<_> = source_rxs
                .into_iter()
                .zip(window_outputs)
                .enumerate()
                .map(|(idx, (input, outputs))| {
                    let metrics = self.metrics.clone();
                    let operator = AggregatingWindowOperator::new(
                        |e: &UserBehavior| e.item_id,
                        assigner.clone(),
                        CountAgg,
                        WindowResultFunction,
                    )
                    .with_late_data_handler(move |e: &UserBehavior, event_time| {
                        metrics.inc_late_events(1);
                        debug!(item_id = e.item_id, event_time, "dropping late event");
                    });
                    let task = Task::new(
                        format!("window-{idx}"),
                        InputGate::new(vec![input]),
                        operator,
                        OutputGate::new(outputs),
                        HashPartitioner::new(|r: &ItemViewCount| r.window_end),
                    );
                    scope.spawn(move || task.run())
                })
                .collect();

            let ranker_handles: Vec<_> = ranker_inputs
                .into_iter()
                .zip(report_txs)
                .enumerate()
                .map(|(idx, (inputs, output))| {
                    let ranker = TopNHotItems::new(config.top_n)
                        .with_pending_alarm(config.max_pending_windows)
                        .with_metrics(self.metrics.clone());
                    let task = Task::new(
                        format!("ranker-{idx}"),
                        InputGate::new(inputs),
                        KeyedProcessOperator::new(
                            |r: &ItemViewCount| r.window_end,
                            ranker,
                            HashMapStateBackend::new(),
                        ),
                        OutputGate::new(vec![output]),
                        ForwardPartitioner,
                    );
                    scope.spawn(move || task.run())
                })
                .collect();

            let collected = self.collect_reports(InputGate::new(report_rxs), sink);

            let source = join("source", source_handle);
            let windows: Vec<_> = window_handles
                .into_iter()
                .enumerate()
                .map(|(idx, handle)| join(&format!("window-{idx}"), handle))
                .collect();
            let rankers: Vec<_> = ranker_handles
                .into_iter()
                .enumerate()
                .map(|(idx, handle)| join(&format!("ranker-{idx}"), handle))
                .collect();
            (collected, source, windows, rankers)
        });

        let (collected, source, windows, rankers) = outcome;
        // Dataflow order, so the first failure listed is the furthest upstream.
        let mut failures = Vec::new();
        let mut cancelled = self.cancelled.load(Ordering::Relaxed);
        match source {
            Ok(summary) => {
                cancelled = summary.cancelled;
                self.record_source(&summary);
            }
            Err(err) => failures.push(("source".to_string(), err)),
        }
        for (idx, result) in windows.into_iter().enumerate() {
            match result {
                Ok(summary) => self.metrics.inc_window_results(summary.records_out),
                Err(err) => failures.push((format!("window-{idx}"), err)),
            }
        }
        for (idx, result) in rankers.into_iter().enumerate() {
            if let Err(err) = result {
                failures.push((format!("ranker-{idx}"), err));
            }
        }
        if let Err(err) = collected {
            failures.push(("collector".to_string(), err));
        }

        for (task, err) in &failures {
            error!(task = %task, error = %format!("{err:#}"), "task failed");
        }
        if let Some((task, err)) = root_failure(failures) {
            return Err(err.context(format!("hot items job failed in {task}")));
        }

        let summary = JobSummary {
            cancelled,
            metrics: self.metrics.snapshot(),
        };
        info!(
            cancelled = summary.cancelled,
            reports = summary.metrics.reports_emitted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "hot items job finished"
        );
        Ok(summary)
    }

    fn collect_reports<S>(&self, mut gate: InputGate<RankingReport>, sink: &mut S) -> Result<()>
    where
        S: ReportSink + ?Sized,
    {
        loop {
            match gate.next()? {
                (_, StreamElement::Record(record)) => {
                    sink.emit(&record.value)?;
                    self.metrics.inc_reports_emitted(1);
                }
                (_, StreamElement::Watermark(_)) => {}
                (_, StreamElement::End) => return Ok(()),
            }
        }
    }

    fn record_source(&self, summary: &SourceSummary) {
        self.metrics.inc_events_read(summary.records_read);
        self.metrics
            .inc_events_filtered(summary.records_read - summary.records_emitted);
        self.metrics
            .inc_out_of_order_events(summary.timestamp_violations);
    }
}

/// Pick the failure that caused the others.
///
/// A failing task drops its channels, so its neighbours fail with
/// [`ChannelClosed`] as the pipeline unwinds. The first failure with any other
/// cause wins. Only when every failure is a closed channel is the first one
/// reported.
fn root_failure(failures: Vec<(String, anyhow::Error)>) -> Option<(String, anyhow::Error)> {
    let root = failures
        .iter()
        .position(|(_, err)| !ChannelClosed::caused(err))
        .unwrap_or(0);
    failures.into_iter().nth(root)
}

fn join<T>(name: &str, handle: ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("{name} thread panicked"))?
}
