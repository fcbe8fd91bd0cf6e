//! Run counters shared between pipeline threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;

#[derive(Clone, Debug, Default)]
pub struct JobMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    events_read: AtomicU64,
    events_filtered: AtomicU64,
    malformed_records: AtomicU64,
    out_of_order_events: AtomicU64,
    late_events: AtomicU64,
    window_results: AtomicU64,
    reports_emitted: AtomicU64,
    pending_windows_peak: AtomicU64,
}

impl JobMetrics {
    pub fn inc_events_read(&self, delta: u64) {
        self.inner.events_read.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_events_filtered(&self, delta: u64) {
        self.inner.events_filtered.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_malformed_records(&self, delta: u64) {
        self.inner.malformed_records.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_out_of_order_events(&self, delta: u64) {
        self.inner.out_of_order_events.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_late_events(&self, delta: u64) {
        self.inner.late_events.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_window_results(&self, delta: u64) {
        self.inner.window_results.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_reports_emitted(&self, delta: u64) {
        self.inner.reports_emitted.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn record_pending_windows(&self, pending: u64) {
        self.inner
            .pending_windows_peak
            .fetch_max(pending, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            events_read: load(&self.inner.events_read),
            events_filtered: load(&self.inner.events_filtered),
            malformed_records: load(&self.inner.malformed_records),
            out_of_order_events: load(&self.inner.out_of_order_events),
            late_events: load(&self.inner.late_events),
            window_results: load(&self.inner.window_results),
            reports_emitted: load(&self.inner.reports_emitted),
            pending_windows_peak: load(&self.inner.pending_windows_peak),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub events_read: u64,
    pub events_filtered: u64,
    pub malformed_records: u64,
    pub out_of_order_events: u64,
    pub late_events: u64,
    pub window_results: u64,
    pub reports_emitted: u64,
    pub pending_windows_peak: u64,
}

impl MetricsSnapshot {
    /// One-line JSON rendering for logs.
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        json!({
            "label": label,
            "events_read": self.events_read,
            "events_filtered": self.events_filtered,
            "malformed_records": self.malformed_records,
            "out_of_order_events": self.out_of_order_events,
            "late_events": self.late_events,
            "window_results": self.window_results,
            "reports_emitted": self.reports_emitted,
            "pending_windows_peak": self.pending_windows_peak,
            "elapsed_ms": elapsed.map(|d| d.as_millis() as u64),
        })
        .to_string()
    }
}
