//! Records flowing through the hot-items job.

use std::io::Read;
use std::str::FromStr;

use csv::StringRecord;
use hotitems_core::types::EventTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fields per input record: `userId,itemId,categoryId,behavior,timestamp`.
pub const FIELD_COUNT: usize = 5;

/// One user action on an item. `timestamp` is in epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBehavior {
    pub user_id: i64,
    pub item_id: i64,
    pub category_id: i32,
    pub behavior: String,
    pub timestamp: i64,
}

impl UserBehavior {
    pub fn new(
        user_id: i64,
        item_id: i64,
        category_id: i32,
        behavior: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            user_id,
            item_id,
            category_id,
            behavior: behavior.into(),
            timestamp,
        }
    }

    /// Event time in milliseconds, or `None` when `timestamp` seconds do
    /// not fit in an `EventTime`.
    pub fn event_time_ms(&self) -> Option<EventTime> {
        self.timestamp.checked_mul(1000)
    }

    /// Checks what deserialization cannot: a non-empty behavior and an
    /// event time that can be represented in milliseconds.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.behavior.is_empty() {
            return Err(RecordError::EmptyBehavior);
        }
        if self.event_time_ms().is_none() {
            return Err(RecordError::TimestampOutOfRange(self.timestamp));
        }
        Ok(())
    }

    /// Decode one CSV record, positionally.
    pub fn from_record(record: &StringRecord) -> Result<Self, RecordError> {
        if record.len() != FIELD_COUNT {
            return Err(RecordError::FieldCount(record.len()));
        }
        let event: Self = record.deserialize(None)?;
        event.validate()?;
        Ok(event)
    }
}

/// Why an input record could not be turned into a [`UserBehavior`].
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),
    #[error("empty behavior field")]
    EmptyBehavior,
    #[error("timestamp {0}s is outside the event-time range")]
    TimestampOutOfRange(i64),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// CSV reader settings for behavior input: no header row, fields trimmed,
/// record lengths checked per record rather than against the first one.
pub(crate) fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

impl FromStr for UserBehavior {
    type Err = RecordError;

    /// Parses a single `userId,itemId,categoryId,behavior,timestamp` line.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut record = StringRecord::new();
        if !csv_reader(line.as_bytes()).read_record(&mut record)? {
            return Err(RecordError::FieldCount(0));
        }
        Self::from_record(&record)
    }
}

/// Count of views for one item in one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemViewCount {
    pub item_id: i64,
    /// Exclusive end of the window, in milliseconds.
    pub window_end: EventTime,
    pub view_count: u64,
}
