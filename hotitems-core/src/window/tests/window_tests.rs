use super::*;

const MINUTE: i64 = 60_000;

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

// ── TimeWindow ────────────────────────────────────────────────────────────

#[test]
fn test_time_window_contains() {
    let w = TimeWindow::new(0, 10_000);
    assert!(w.contains(0));
    assert!(w.contains(5_000));
    assert!(!w.contains(10_000)); // end is exclusive
}

#[test]
fn test_time_window_max_timestamp() {
    let w = TimeWindow::new(0, 10_000);
    assert_eq!(w.max_timestamp(), 9_999);
    assert_eq!(w.to_string(), "TimeWindow([0, 10000))");
}

// ── Sliding ───────────────────────────────────────────────────────────────

#[test]
fn test_sliding_hour_by_five_minutes_gives_twelve_windows() {
    let assigner = SlidingEventTimeWindows::of(minutes(60), minutes(5)).unwrap();
    let ts = 12 * 60 * MINUTE; // 12:00
    let wins = assigner.assign_windows(&(), ts);

    assert_eq!(wins.len(), 12);
    for w in &wins {
        assert!(w.contains(ts), "{w} should contain {ts}");
        assert_eq!(w.end % (5 * MINUTE), 0);
        assert_eq!(w.end - w.start, 60 * MINUTE);
    }
    // Distinct windows, latest first.
    assert_eq!(wins[0], TimeWindow::new(ts, ts + 60 * MINUTE));
    assert_eq!(wins[11], TimeWindow::new(ts - 55 * MINUTE, ts + 5 * MINUTE));
}

#[test]
fn test_sliding_equal_size_and_slide_gives_one_window() {
    let assigner = SlidingEventTimeWindows::of(Duration::from_secs(60), Duration::from_secs(60)).unwrap();
    assert_eq!(
        assigner.assign_windows(&(), 2_000),
        vec![TimeWindow::new(0, 60_000)]
    );
    assert_eq!(
        assigner.assign_windows(&(), 60_000),
        vec![TimeWindow::new(60_000, 120_000)]
    );
    assert_eq!(
        assigner.assign_windows(&(), -1),
        vec![TimeWindow::new(-60_000, 0)]
    );
}

#[test]
fn test_sliding_skips_windows_past_the_time_range() {
    let assigner = SlidingEventTimeWindows::of(minutes(60), minutes(5)).unwrap();

    // Every window holding this timestamp would end beyond i64::MAX.
    let top = (i64::MAX / 1000) * 1000;
    assert!(assigner.assign_windows(&(), top).is_empty());
    assert!(assigner.assign_windows(&(), EventTime::MAX).is_empty());

    // Only the windows that still fit are returned.
    let near_top = i64::MAX - 30 * MINUTE;
    let wins = assigner.assign_windows(&(), near_top);
    assert!(!wins.is_empty() && wins.len() < 12);
    for w in &wins {
        assert!(w.contains(near_top));
        assert_eq!(w.end - w.start, 60 * MINUTE);
    }

    // The latest window start at or before i64::MIN is below the range.
    assert!(assigner.assign_windows(&(), EventTime::MIN).is_empty());
}

#[test]
fn test_sliding_rejects_slide_larger_than_size() {
    assert!(SlidingEventTimeWindows::of(minutes(5), minutes(60)).is_err());
    assert!(SlidingEventTimeWindows::of(minutes(60), Duration::ZERO).is_err());
}

// ── AggregatingWindowOperator ─────────────────────────────────────────────

struct Count;

impl AggregateFunction<(i64, &'static str), u64, u64> for Count {
    fn create_accumulator(&self) -> u64 {
        0
    }
    fn add(&self, acc: &mut u64, _element: &(i64, &'static str)) {
        *acc += 1;
    }
    fn get_result(&self, acc: u64) -> u64 {
        acc
    }
    fn merge(&self, acc: &mut u64, other: u64) {
        *acc += other;
    }
}

struct KeyWindowCount;

impl WindowFunction<i64, u64, (i64, EventTime, u64)> for KeyWindowCount {
    fn apply(
        &mut self,
        key: &i64,
        window: &TimeWindow,
        elements: &[u64],
        output: &mut Vec<(i64, EventTime, u64)>,
    ) {
        for count in elements {
            output.push((*key, window.end, *count));
        }
    }
}

fn counting_operator(
    size: Duration,
    slide: Duration,
) -> impl Operator<(i64, &'static str), OUT = (i64, EventTime, u64)> {
    AggregatingWindowOperator::new(
        |e: &(i64, &'static str)| e.0,
        SlidingEventTimeWindows::of(size, slide).unwrap(),
        Count,
        KeyWindowCount,
    )
}

fn feed<O: Operator<(i64, &'static str)>>(op: &mut O, events: &[(i64, EventTime)]) {
    let mut out = Vec::new();
    for &(item, ts) in events {
        op.process_record(StreamRecord::with_timestamp((item, "pv"), ts), &mut out)
            .unwrap();
    }
    assert!(out.is_empty(), "records alone never fire windows");
}

#[test]
fn test_operator_counts_per_key_and_window() {
    let mut op = counting_operator(Duration::from_secs(60), Duration::from_secs(60));
    feed(&mut op, &[(1, 0), (1, 1_000), (2, 2_000)]);

    let mut out = Vec::new();
    op.on_event_time(59_998, &mut out).unwrap();
    assert!(out.is_empty());

    op.on_event_time(59_999, &mut out).unwrap();
    let mut values: Vec<_> = out.iter().map(|r| r.value).collect();
    values.sort();
    assert_eq!(values, vec![(1, 60_000, 2), (2, 60_000, 1)]);
    assert!(out.iter().all(|r| r.timestamp == Some(59_999)));
}

#[test]
fn test_operator_fires_each_window_once() {
    let mut op = AggregatingWindowOperator::new(
        |e: &(i64, &'static str)| e.0,
        SlidingEventTimeWindows::of(Duration::from_secs(10), Duration::from_secs(10)).unwrap(),
        Count,
        KeyWindowCount,
    );
    feed(&mut op, &[(7, 1_000)]);
    assert_eq!(op.buffered_window_count(), 1);

    let mut out = Vec::new();
    op.on_event_time(20_000, &mut out).unwrap();
    op.on_event_time(30_000, &mut out).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(op.buffered_window_count(), 0);
}

#[test]
fn test_operator_overlapping_windows_count_independently() {
    let mut op = counting_operator(Duration::from_secs(10), Duration::from_secs(5));
    // 7s falls in [0,10) and [5,15); 12s only in [5,15) and [10,20).
    feed(&mut op, &[(1, 7_000), (1, 12_000)]);

    let mut out = Vec::new();
    op.on_event_time(EventTime::MAX, &mut out).unwrap();
    let values: Vec<_> = out.into_iter().map(|r| r.value).collect();
    assert_eq!(
        values,
        vec![(1, 10_000, 1), (1, 15_000, 2), (1, 20_000, 1)]
    );
}

#[test]
fn test_operator_emits_sparse_results_only() {
    let mut op = counting_operator(Duration::from_secs(10), Duration::from_secs(10));
    feed(&mut op, &[(1, 1_000), (2, 25_000)]);

    let mut out = Vec::new();
    op.on_event_time(EventTime::MAX, &mut out).unwrap();
    let values: Vec<_> = out.into_iter().map(|r| r.value).collect();
    // No result for the empty window [10s, 20s) nor for (key 1, [20s, 30s)).
    assert_eq!(values, vec![(1, 10_000, 1), (2, 30_000, 1)]);
}

#[test]
fn test_operator_drops_late_records() {
    let late = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
    let late_seen = std::sync::Arc::clone(&late);
    let mut op = AggregatingWindowOperator::new(
        |e: &(i64, &'static str)| e.0,
        SlidingEventTimeWindows::of(Duration::from_secs(10), Duration::from_secs(10)).unwrap(),
        Count,
        KeyWindowCount,
    )
    .with_late_data_handler(move |_, _| {
        late_seen.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    });

    let mut out = Vec::new();
    op.on_event_time(9_999, &mut out).unwrap();
    feed(&mut op, &[(1, 5_000)]);

    assert_eq!(op.late_records(), 1);
    assert_eq!(late.load(std::sync::atomic::Ordering::Relaxed), 1);
    assert_eq!(op.buffered_window_count(), 0);
}

#[test]
fn test_operator_rejects_untimestamped_record() {
    let mut op = counting_operator(Duration::from_secs(10), Duration::from_secs(10));
    let mut out = Vec::new();
    assert!(op.process_record(StreamRecord::new((1, "pv")), &mut out).is_err());
}

#[test]
fn test_count_merge_is_associative() {
    let agg = Count;
    for (a, b, c) in [(0u64, 0u64, 0u64), (1, 2, 3), (5, 0, 7), (100, 250, 1)] {
        let mut left = a;
        agg.merge(&mut left, b);
        agg.merge(&mut left, c);

        let mut bc = b;
        agg.merge(&mut bc, c);
        let mut right = a;
        agg.merge(&mut right, bc);

        assert_eq!(left, right);
        assert_eq!(left, a + b + c);
    }
}
