use super::*;

/// Event-time timers for one operator instance.
///
/// Timers are keyed by `(fire_at, key_bytes)` and kept in fire-time order, so
/// draining everything due at a watermark is a range scan. Timers for the same
/// `fire_at` come out in key-byte order, which keeps firing deterministic.
///
/// # Invariant
/// A `(key_bytes, fire_at)` pair is pending at most once. Registering it again
/// before it fires does nothing, so a timer can never fire twice.
#[derive(Debug, Clone, Default)]
pub struct TimerService {
    timers: BTreeMap<EventTime, BTreeSet<Vec<u8>>>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a timer for `key_bytes` at `fire_at`.
    ///
    /// Returns `true` if the timer was not already pending.
    pub fn register(&mut self, key_bytes: Vec<u8>, fire_at: EventTime) -> bool {
        self.timers.entry(fire_at).or_default().insert(key_bytes)
    }

    /// Remove and return every timer with `fire_at <= watermark_ts`, in
    /// ascending `fire_at` order.
    pub fn drain_due(&mut self, watermark_ts: EventTime) -> Vec<(Vec<u8>, EventTime)> {
        let pending = match watermark_ts.checked_add(1) {
            Some(bound) => self.timers.split_off(&bound),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.timers, pending);

        due.into_iter()
            .flat_map(|(fire_at, keys)| keys.into_iter().map(move |key| (key, fire_at)))
            .collect()
    }

    /// Total count of pending `(key, fire_at)` pairs.
    pub fn len(&self) -> usize {
        self.timers.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
