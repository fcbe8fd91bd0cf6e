//! Single-threaded task loop around one operator.
//!
//! ```text
//! loop {
//!     (channel, element) = input_gate.next()
//!     match element {
//!         Record    => operator.process_record() -> route outputs
//!         Watermark => tracker.advance(channel)
//!                      if the minimum moved: operator.on_event_time() -> route outputs
//!                                            broadcast watermark
//!         End       => broadcast End, stop
//!     }
//! }
//! ```
//!
//! Timer output is always sent before the watermark that triggered it, so a
//! downstream task never sees a watermark ahead of the results it covers.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::input_gate::InputGate;
use crate::operator::Operator;
use crate::output_gate::OutputGate;
use crate::partitioner::Partitioner;
use crate::time::WatermarkTracker;
use crate::types::{StreamData, StreamElement, StreamRecord, Watermark};

/// Counters reported when a task finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub records_in: u64,
    pub records_out: u64,
    pub watermarks_out: u64,
}

/// Execution unit: one operator instance on one thread.
pub struct Task<IN, Op, P>
where
    Op: Operator<IN>,
{
    name: String,
    input_gate: InputGate<IN>,
    watermark_tracker: WatermarkTracker,
    operator: Op,
    output_gate: OutputGate<Op::OUT>,
    partitioner: P,
    output_buffer: Vec<StreamRecord<Op::OUT>>,
    summary: TaskSummary,
}

impl<IN, Op, P> Task<IN, Op, P>
where
    IN: Send,
    Op: Operator<IN>,
    Op::OUT: StreamData,
    P: Partitioner<Op::OUT>,
{
    pub fn new(
        name: impl Into<String>,
        input_gate: InputGate<IN>,
        operator: Op,
        output_gate: OutputGate<Op::OUT>,
        partitioner: P,
    ) -> Self {
        let watermark_tracker = WatermarkTracker::new(input_gate.num_channels());
        Self {
            name: name.into(),
            input_gate,
            watermark_tracker,
            operator,
            output_gate,
            partitioner,
            output_buffer: Vec::new(),
            summary: TaskSummary::default(),
        }
    }

    /// Run until every input channel has ended.
    pub fn run(mut self) -> Result<TaskSummary> {
        debug!(
            task = %self.name,
            inputs = self.input_gate.num_channels(),
            outputs = self.output_gate.num_channels(),
            "task started"
        );
        loop {
            let (channel, element) = self
                .input_gate
                .next()
                .with_context(|| format!("task {} input", self.name))?;
            match element {
                StreamElement::Record(record) => {
                    self.summary.records_in += 1;
                    self.operator.process_record(record, &mut self.output_buffer)?;
                    self.flush_output()?;
                }
                StreamElement::Watermark(wm) => {
                    if let Some(aligned) = self.watermark_tracker.advance(channel, wm) {
                        self.advance_event_time(aligned)?;
                    }
                }
                StreamElement::End => {
                    self.output_gate.broadcast(StreamElement::End)?;
                    break;
                }
            }
        }
        info!(
            task = %self.name,
            records_in = self.summary.records_in,
            records_out = self.summary.records_out,
            "task finished"
        );
        Ok(self.summary)
    }

    fn advance_event_time(&mut self, watermark: Watermark) -> Result<()> {
        self.operator
            .on_event_time(watermark.timestamp, &mut self.output_buffer)?;
        self.flush_output()?;
        self.output_gate.broadcast(StreamElement::Watermark(watermark))?;
        self.summary.watermarks_out += 1;
        Ok(())
    }

    fn flush_output(&mut self) -> Result<()> {
        for record in self.output_buffer.drain(..) {
            self.output_gate
                .emit_partitioned(record, &self.partitioner)?;
            self.summary.records_out += 1;
        }
        Ok(())
    }
}
