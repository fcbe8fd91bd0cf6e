use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type EventTime = i64;

/// A value in flight, stamped with its event time once the source has
/// assigned one.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord<T> {
    pub value: T,
    pub timestamp: Option<EventTime>,
}

impl<T> StreamRecord<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            timestamp: None,
        }
    }

    pub fn with_timestamp(value: T, timestamp: EventTime) -> Self {
        Self {
            value,
            timestamp: Some(timestamp),
        }
    }
}

/// Event-time progress: the sender promises that every later record on the
/// same channel has a timestamp greater than `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    pub timestamp: EventTime,
}

impl Watermark {
    pub fn new(timestamp: EventTime) -> Self {
        Self { timestamp }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Watermark({}ms)", self.timestamp)
    }
}

/// What a channel carries between two tasks.
///
/// `End` is the last element a sender ever puts on a channel. A sender that
/// disappears without it has failed.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamElement<T> {
    Record(StreamRecord<T>),
    Watermark(Watermark),
    End,
}

impl<T> StreamElement<T> {
    pub fn record(value: T) -> Self {
        StreamRecord::new(value).into()
    }

    pub fn timestamped_record(value: T, timestamp: EventTime) -> Self {
        StreamRecord::with_timestamp(value, timestamp).into()
    }

    pub fn watermark(timestamp: EventTime) -> Self {
        Self::Watermark(Watermark::new(timestamp))
    }
}

impl<T> From<StreamRecord<T>> for StreamElement<T> {
    fn from(record: StreamRecord<T>) -> Self {
        Self::Record(record)
    }
}

/// Keys and values kept in operator state. They are stored bincode-encoded,
/// so they must round-trip through serde and move between task threads.
pub trait StreamData: Send + Clone + Serialize + for<'de> Deserialize<'de> + 'static {}

impl<T> StreamData for T where T: Send + Clone + Serialize + for<'de> Deserialize<'de> + 'static {}
