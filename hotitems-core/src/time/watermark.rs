use super::*;

/// Minimum possible event time. Used as the initial "no watermark" sentinel.
pub const EVENT_TIME_MIN: EventTime = i64::MIN;

/// Maximum possible event time. A watermark at this value flushes everything.
pub const EVENT_TIME_MAX: EventTime = i64::MAX;

/// Extracts timestamps from stream elements and creates watermark generators.
///
/// The strategy is split into two responsibilities:
/// - `extract_timestamp`: pure function, called per element
/// - `create_watermark_generator`: factory, called once per source at startup
pub trait WatermarkStrategy<T>: Send + Sync {
    /// Extract the event time timestamp (milliseconds) from an element.
    fn extract_timestamp(&self, element: &T) -> EventTime;

    /// Create a fresh [`WatermarkGenerator`] for this strategy.
    fn create_watermark_generator(&self) -> Box<dyn WatermarkGenerator>;
}

/// Observes events and decides when to advance the watermark.
pub trait WatermarkGenerator: Send {
    /// Notify the generator that an event with the given timestamp was observed.
    fn on_event(&mut self, timestamp: EventTime);

    /// Return the current watermark, or `None` if no watermark has been emitted yet.
    fn current_watermark(&self) -> Option<Watermark>;

    /// Observe `timestamp` and return the resulting watermark.
    fn advance(&mut self, timestamp: EventTime) -> Option<Watermark> {
        self.on_event(timestamp);
        self.current_watermark()
    }

    /// Number of events that arrived out of order. Zero unless the
    /// generator tracks ordering.
    fn violations(&self) -> u64 {
        0
    }
}

/// Watermark strategy for sources whose timestamps never decrease.
///
/// The generator tracks the maximum timestamp seen so far. Because several
/// events may share that maximum, the emitted watermark is `max_seen - 1`:
/// every event with a timestamp `<= watermark` has already been observed.
///
/// # Example
/// ```
/// use hotitems_core::time::AscendingTimestamps;
///
/// let strategy = AscendingTimestamps::new(|secs: &i64| *secs * 1000);
/// ```
pub struct AscendingTimestamps<T, F> {
    timestamp_extractor: F,
    _phantom: std::marker::PhantomData<fn(&T)>,
}

impl<T, F: Fn(&T) -> EventTime + Send + Sync> AscendingTimestamps<T, F> {
    pub fn new(timestamp_extractor: F) -> Self {
        Self {
            timestamp_extractor,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T, F> WatermarkStrategy<T> for AscendingTimestamps<T, F>
where
    F: Fn(&T) -> EventTime + Send + Sync,
{
    fn extract_timestamp(&self, element: &T) -> EventTime {
        (self.timestamp_extractor)(element)
    }

    fn create_watermark_generator(&self) -> Box<dyn WatermarkGenerator> {
        Box::new(AscendingTimestampsGenerator::new())
    }
}

/// Generator backing [`AscendingTimestamps`].
///
/// A timestamp below the current maximum violates the ascending contract.
/// It is logged and counted, and the watermark stays where it is.
#[derive(Debug)]
pub struct AscendingTimestampsGenerator {
    max_seen_timestamp: EventTime,
    violations: u64,
}

impl AscendingTimestampsGenerator {
    pub fn new() -> Self {
        Self {
            max_seen_timestamp: EVENT_TIME_MIN,
            violations: 0,
        }
    }
}

impl Default for AscendingTimestampsGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WatermarkGenerator for AscendingTimestampsGenerator {
    fn on_event(&mut self, timestamp: EventTime) {
        if timestamp < self.max_seen_timestamp {
            self.violations += 1;
            tracing::warn!(
                timestamp,
                max_seen = self.max_seen_timestamp,
                violations = self.violations,
                "timestamp monotony violated"
            );
            return;
        }
        self.max_seen_timestamp = timestamp;
    }

    fn current_watermark(&self) -> Option<Watermark> {
        if self.max_seen_timestamp == EVENT_TIME_MIN {
            // No event seen yet; don't emit a watermark.
            return None;
        }
        Some(Watermark::new(self.max_seen_timestamp.saturating_sub(1)))
    }

    fn violations(&self) -> u64 {
        self.violations
    }
}
