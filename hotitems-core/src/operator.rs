//! The operator abstraction executed by a [`Task`](crate::runtime::Task).
//!
//! An operator consumes timestamped records and event-time progress and
//! pushes its outputs into a caller-owned buffer:
//!
//! ```text
//! Record(rec)    -> operator.process_record(rec, &mut out)
//! Watermark(wm)  -> operator.on_event_time(wm.timestamp, &mut out)
//! ```
//!
//! The output buffer is reused by the caller across calls, so operators only
//! ever push into it.

use anyhow::Result;

use crate::types::{EventTime, StreamRecord};

/// A single-input stream operator.
///
/// Uses an associated `OUT` type so each `Operator<IN>` has exactly one output
/// type and operators compose by type.
pub trait Operator<IN>: Send {
    /// Output type of this operator.
    type OUT: Send;

    /// Process one record, pushing any results to `output`.
    fn process_record(
        &mut self,
        record: StreamRecord<IN>,
        output: &mut Vec<StreamRecord<Self::OUT>>,
    ) -> Result<()>;

    /// Event time advanced to `event_time`: fire everything that is due.
    ///
    /// Called after every record delivered before the watermark has been
    /// processed. Stateless operators keep the default no-op.
    fn on_event_time(
        &mut self,
        _event_time: EventTime,
        _output: &mut Vec<StreamRecord<Self::OUT>>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Stateless operator that forwards the records accepted by a predicate.
pub struct FilterOperator<F> {
    predicate: F,
}

impl<F> FilterOperator<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<T, F> Operator<T> for FilterOperator<F>
where
    T: Send,
    F: Fn(&T) -> bool + Send,
{
    type OUT = T;

    #[inline]
    fn process_record(
        &mut self,
        record: StreamRecord<T>,
        output: &mut Vec<StreamRecord<T>>,
    ) -> Result<()> {
        if (self.predicate)(&record.value) {
            output.push(record);
        }
        Ok(())
    }
}
