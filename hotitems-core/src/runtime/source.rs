//! Source loop: pulls events from an iterator, stamps them with event time,
//! generates watermarks and routes the survivors of a stateless operator.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::{debug, info};

use crate::operator::Operator;
use crate::output_gate::OutputGate;
use crate::partitioner::Partitioner;
use crate::time::{EVENT_TIME_MAX, WatermarkGenerator, WatermarkStrategy};
use crate::types::{StreamData, StreamElement, StreamRecord, Watermark};

/// What the source saw before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub records_read: u64,
    pub records_emitted: u64,
    pub timestamp_violations: u64,
    pub cancelled: bool,
}

/// Head of a pipeline.
///
/// On exhaustion the source emits `Watermark(EVENT_TIME_MAX)` followed by
/// `End`, which flushes every downstream window and timer. When the cancel
/// flag is raised it stops at the next event and emits only `End`, so
/// downstream state that has not fired yet is discarded.
pub struct SourceTask<T, S, Op, P>
where
    Op: Operator<T>,
{
    strategy: S,
    operator: Op,
    output_gate: OutputGate<Op::OUT>,
    partitioner: P,
    cancelled: Arc<AtomicBool>,
    _phantom: PhantomData<fn(T)>,
}

impl<T, S, Op, P> SourceTask<T, S, Op, P>
where
    T: Send,
    S: WatermarkStrategy<T>,
    Op: Operator<T>,
    Op::OUT: StreamData,
    P: Partitioner<Op::OUT>,
{
    pub fn new(strategy: S, operator: Op, output_gate: OutputGate<Op::OUT>, partitioner: P) -> Self {
        Self {
            strategy,
            operator,
            output_gate,
            partitioner,
            cancelled: Arc::new(AtomicBool::new(false)),
            _phantom: PhantomData,
        }
    }

    /// Share a cancel flag with the caller.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Drain `events` into the pipeline.
    pub fn run<I>(mut self, events: I) -> Result<SourceSummary>
    where
        I: IntoIterator<Item = T>,
    {
        let mut generator = self.strategy.create_watermark_generator();
        let mut summary = SourceSummary::default();
        let mut buffer = Vec::new();
        let mut last_watermark: Option<Watermark> = None;

        for event in events {
            if self.cancelled.load(Ordering::Relaxed) {
                summary.cancelled = true;
                break;
            }
            summary.records_read += 1;

            let timestamp = self.strategy.extract_timestamp(&event);
            let watermark = generator.advance(timestamp);

            self.operator
                .process_record(StreamRecord::with_timestamp(event, timestamp), &mut buffer)?;
            summary.records_emitted += self.route(&mut buffer)?;

            if let Some(wm) = watermark.filter(|wm| last_watermark.map_or(true, |last| *wm > last)) {
                self.emit_watermark(wm, &mut buffer, &mut summary)?;
                last_watermark = Some(wm);
            }
        }
        summary.timestamp_violations = generator.violations();

        if summary.cancelled {
            info!(records_read = summary.records_read, "source cancelled");
        } else {
            debug!(records_read = summary.records_read, "source exhausted, flushing");
            self.emit_watermark(Watermark::new(EVENT_TIME_MAX), &mut buffer, &mut summary)?;
        }
        self.output_gate.broadcast(StreamElement::End)?;
        Ok(summary)
    }

    fn emit_watermark(
        &mut self,
        watermark: Watermark,
        buffer: &mut Vec<StreamRecord<Op::OUT>>,
        summary: &mut SourceSummary,
    ) -> Result<()> {
        self.operator.on_event_time(watermark.timestamp, buffer)?;
        summary.records_emitted += self.route(buffer)?;
        self.output_gate.broadcast(StreamElement::Watermark(watermark))
    }

    fn route(&self, buffer: &mut Vec<StreamRecord<Op::OUT>>) -> Result<u64> {
        let mut routed = 0;
        for record in buffer.drain(..) {
            self.output_gate.emit_partitioned(record, &self.partitioner)?;
            routed += 1;
        }
        Ok(routed)
    }
}
