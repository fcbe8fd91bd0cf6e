use super::*;

fn duration_ms(duration: Duration) -> Result<i64> {
    let ms = i64::try_from(duration.as_millis())?;
    ensure!(ms > 0, "window durations must be at least 1ms, got {:?}", duration);
    Ok(ms)
}

/// Fixed-size, possibly overlapping event-time windows.
///
/// Windows start at every multiple of `slide`; an element belongs to
/// `size / slide` windows when `size` is a multiple of `slide`.
#[derive(Debug, Clone)]
pub struct SlidingEventTimeWindows {
    size_ms: i64,
    slide_ms: i64,
}

impl SlidingEventTimeWindows {
    /// Create sliding windows of the given `size` advancing every `slide`.
    ///
    /// Fails if either duration is zero or `slide` exceeds `size` (which would
    /// leave gaps no window covers).
    pub fn of(size: Duration, slide: Duration) -> Result<Self> {
        let size_ms = duration_ms(size)?;
        let slide_ms = duration_ms(slide)?;
        ensure!(
            slide_ms <= size_ms,
            "slide ({slide_ms}ms) must not exceed window size ({size_ms}ms)"
        );
        Ok(Self { size_ms, slide_ms })
    }
}

impl<T> WindowAssigner<T> for SlidingEventTimeWindows {
    /// Windows whose bounds do not fit in an `EventTime` are skipped, so a
    /// timestamp near either end of the range yields fewer windows (or none).
    fn assign_windows(&self, _element: &T, timestamp: EventTime) -> Vec<TimeWindow> {
        // Walk back from the latest window start until no window covers ts.
        let Some(last_start) = timestamp.checked_sub(timestamp.rem_euclid(self.slide_ms)) else {
            return Vec::new();
        };
        let earliest = timestamp.saturating_sub(self.size_ms);
        let mut windows = Vec::with_capacity((self.size_ms / self.slide_ms) as usize);
        let mut start = last_start;
        while start > earliest {
            if let Some(end) = start.checked_add(self.size_ms) {
                windows.push(TimeWindow::new(start, end));
            }
            match start.checked_sub(self.slide_ms) {
                Some(prev) => start = prev,
                None => break,
            }
        }
        windows
    }
}
