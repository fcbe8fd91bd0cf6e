//! The job's user functions: filter, counting, window results and ranking.

use anyhow::Result;
use hotitems_core::process::{KeyedProcessFunction, ProcessContext};
use hotitems_core::state::{KeyedStateBackend, ListStateHandle};
use hotitems_core::types::EventTime;
use hotitems_core::window::{AggregateFunction, TimeWindow, WindowFunction};
use tracing::{debug, warn};

use crate::metrics::JobMetrics;
use crate::record::{ItemViewCount, UserBehavior};
use crate::report::{RankedItem, RankingReport};

/// Keeps only events of one behavior type.
#[derive(Debug, Clone)]
pub struct BehaviorFilter {
    action: String,
}

impl BehaviorFilter {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }

    pub fn accept(&self, event: &UserBehavior) -> bool {
        event.behavior == self.action
    }
}

/// Counts events; the accumulator is the count.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountAgg;

impl AggregateFunction<UserBehavior, u64, u64> for CountAgg {
    fn create_accumulator(&self) -> u64 {
        0
    }

    fn add(&self, acc: &mut u64, _element: &UserBehavior) {
        *acc += 1;
    }

    fn get_result(&self, acc: u64) -> u64 {
        acc
    }

    fn merge(&self, acc: &mut u64, other: u64) {
        *acc += other;
    }
}

/// Tags a window's count with its item and window end.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowResultFunction;

impl WindowFunction<i64, u64, ItemViewCount> for WindowResultFunction {
    fn apply(&mut self, item_id: &i64, window: &TimeWindow, counts: &[u64], output: &mut Vec<ItemViewCount>) {
        output.extend(counts.iter().map(|&view_count| ItemViewCount {
            item_id: *item_id,
            window_end: window.end,
            view_count,
        }));
    }
}

/// Ranks the results of each window once all of them have arrived.
///
/// Keyed by `window_end`. Results are buffered in list state and a timer is
/// set one millisecond past the window end; upstream results for a window
/// are all sent before the watermark that closes it, so by the time the
/// timer fires the buffer is complete. The buffer is cleared on firing and
/// the window is never ranked again.
pub struct TopNHotItems {
    top_n: usize,
    items: ListStateHandle<ItemViewCount>,
    max_pending_windows: usize,
    alarm_raised: bool,
    metrics: Option<JobMetrics>,
}

impl TopNHotItems {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            items: ListStateHandle::new("item-state"),
            max_pending_windows: usize::MAX,
            alarm_raised: false,
            metrics: None,
        }
    }

    /// Log an alarm when more than `limit` windows are buffered at once.
    pub fn with_pending_alarm(mut self, limit: usize) -> Self {
        self.max_pending_windows = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: JobMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn observe_pending(&mut self, pending: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.record_pending_windows(pending as u64);
        }
        if pending > self.max_pending_windows {
            if !self.alarm_raised {
                warn!(
                    pending,
                    limit = self.max_pending_windows,
                    "ranking buffers piling up; is the watermark advancing?"
                );
                self.alarm_raised = true;
            }
        } else {
            self.alarm_raised = false;
        }
    }
}

impl<B: KeyedStateBackend> KeyedProcessFunction<i64, ItemViewCount, RankingReport, B> for TopNHotItems {
    fn process_element(
        &mut self,
        window_end: &i64,
        result: ItemViewCount,
        ctx: &mut ProcessContext<'_, RankingReport, B>,
    ) -> Result<()> {
        self.items.add(ctx.state_mut(), result)?;
        if ctx.register_event_time_timer(window_end.saturating_add(1))? {
            let pending = self.items.key_count(ctx.state());
            self.observe_pending(pending);
        }
        Ok(())
    }

    fn on_timer(
        &mut self,
        _timestamp: EventTime,
        window_end: &i64,
        ctx: &mut ProcessContext<'_, RankingReport, B>,
    ) -> Result<()> {
        let mut items = self.items.get(ctx.state())?;
        self.items.clear(ctx.state_mut())?;

        // Stable: equal counts keep arrival order.
        items.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        let buffered = items.len();
        items.truncate(self.top_n);
        debug!(window_end, buffered, ranked = items.len(), "ranking window");

        ctx.collect(RankingReport {
            window_end: *window_end,
            entries: items
                .into_iter()
                .enumerate()
                .map(|(rank, item)| RankedItem {
                    rank,
                    item_id: item.item_id,
                    view_count: item.view_count,
                })
                .collect(),
        });

        let pending = self.items.key_count(ctx.state());
        self.observe_pending(pending);
        Ok(())
    }
}
