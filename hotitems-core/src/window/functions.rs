use super::*;

// ── WindowFunction ────────────────────────────────────────────────────────────

/// Evaluates a fired window.
///
/// With incremental aggregation `elements` holds exactly one value: the
/// aggregate result for the `(key, window)` pair.
pub trait WindowFunction<K, IN, OUT>: Send {
    /// Called when a window fires.
    ///
    /// - `key`: the group key
    /// - `window`: the time window that fired
    /// - `elements`: the values evaluated for this (key, window) pair
    /// - `output`: push computed results here
    fn apply(&mut self, key: &K, window: &TimeWindow, elements: &[IN], output: &mut Vec<OUT>);
}

// ── AggregateFunction ─────────────────────────────────────────────────────────

/// Incremental aggregation function.
///
/// The accumulator is updated on each incoming element, so only `O(1)` state
/// is kept per `(key, window)` instead of the elements themselves.
///
/// `merge` must be associative and commutative.
pub trait AggregateFunction<IN, ACC, OUT>: Send {
    /// Create a fresh accumulator for a new window.
    fn create_accumulator(&self) -> ACC;
    /// Fold one element into the accumulator.
    fn add(&self, acc: &mut ACC, element: &IN);
    /// Convert the final accumulator into the window result.
    fn get_result(&self, acc: ACC) -> OUT;
    /// Merge `other` into `acc`.
    fn merge(&self, acc: &mut ACC, other: ACC);
}
