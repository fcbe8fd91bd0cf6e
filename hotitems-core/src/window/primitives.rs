use super::*;

/// Span of event time covered by one window: `start` inclusive, `end`
/// exclusive, both in milliseconds.
///
/// Windows are compared and hashed by their bounds, so the same span
/// produced for two different elements identifies the same accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    pub start: EventTime,
    pub end: EventTime,
}

impl TimeWindow {
    pub fn new(start: EventTime, end: EventTime) -> Self {
        Self { start, end }
    }

    /// Last millisecond inside the window. Once the event-time clock reaches
    /// it, nothing more can land in the window and its result is final.
    pub fn max_timestamp(&self) -> EventTime {
        self.end - 1
    }

    pub fn contains(&self, timestamp: EventTime) -> bool {
        (self.start..self.end).contains(&timestamp)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimeWindow([{}, {}))", self.start, self.end)
    }
}

/// Maps an element's event time to the windows it counts toward.
///
/// An empty result means the element belongs to no window the assigner can
/// represent; the window operator then treats it as late.
pub trait WindowAssigner<T>: Send + Sync {
    fn assign_windows(&self, element: &T, timestamp: EventTime) -> Vec<TimeWindow>;
}
