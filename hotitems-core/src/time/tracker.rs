use super::*;

/// Tracks per-channel watermarks inside a task and computes the global minimum.
///
/// A task with several upstream channels can only advance its event-time
/// clock to the minimum of all channel watermarks, because a lagging channel
/// might still deliver records with earlier timestamps.
///
/// The global minimum is monotonically non-decreasing: a channel reporting a
/// watermark below the current minimum is clamped.
pub struct WatermarkTracker {
    /// Per-channel last-seen watermark timestamp. Starts at EVENT_TIME_MIN.
    channel_watermarks: Vec<EventTime>,
    /// The global min watermark timestamp last emitted downstream.
    current_min: EventTime,
}

impl WatermarkTracker {
    /// Create a tracker for `num_channels` upstream input channels.
    pub fn new(num_channels: usize) -> Self {
        Self {
            channel_watermarks: vec![EVENT_TIME_MIN; num_channels],
            current_min: EVENT_TIME_MIN,
        }
    }

    /// Notify the tracker that `channel_id` received a new watermark.
    ///
    /// Returns `Some(watermark)` if the global min has advanced and the
    /// operator should fire timers and forward the watermark.  Returns `None`
    /// if unchanged.
    pub fn advance(&mut self, channel_id: usize, watermark: Watermark) -> Option<Watermark> {
        let slot = &mut self.channel_watermarks[channel_id];
        *slot = (*slot).max(watermark.timestamp).max(self.current_min);
        let new_min = self.compute_min();
        if new_min > self.current_min {
            self.current_min = new_min;
            Some(Watermark::new(new_min))
        } else {
            None
        }
    }

    fn compute_min(&self) -> EventTime {
        self.channel_watermarks
            .iter()
            .copied()
            .min()
            .unwrap_or(EVENT_TIME_MIN)
    }
}
