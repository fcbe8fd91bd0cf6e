use std::collections::{BTreeMap, HashMap};

use hotitems_job::{
    CollectSink, HotItemsJob, JobConfig, RankingReport, ReportSink, UserBehavior, WriterSink,
    read_behaviors,
};

const MINUTE: i64 = 60;

fn config(window_minutes: u64, slide_minutes: u64, top_n: usize) -> JobConfig {
    JobConfig {
        window_length_minutes: window_minutes,
        slide_minutes,
        top_n,
        ..JobConfig::default()
    }
}

fn pv(item_id: i64, timestamp: i64) -> UserBehavior {
    UserBehavior::new(1, item_id, 1, "pv", timestamp)
}

fn run(config: JobConfig, events: Vec<UserBehavior>) -> Vec<RankingReport> {
    let job = HotItemsJob::new(config).unwrap();
    let mut sink = CollectSink::new();
    let summary = job.run(events, &mut sink).unwrap();
    assert!(!summary.cancelled);
    sink.into_reports()
}

fn ranks(report: &RankingReport) -> Vec<(i64, u64)> {
    report
        .entries
        .iter()
        .map(|e| (e.item_id, e.view_count))
        .collect()
}

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    *state >> 33
}

/// Ascending event stream over a few hours with a skewed item distribution.
fn gen_events(seed: u64, n: usize, num_items: u64) -> Vec<UserBehavior> {
    let mut state = seed;
    let mut ts = 1_511_658_000;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        ts += (lcg_next(&mut state) % 20) as i64;
        let a = lcg_next(&mut state) % num_items;
        let b = lcg_next(&mut state) % num_items;
        let item = a.min(b) as i64;
        let behavior = match lcg_next(&mut state) % 10 {
            0 => "buy",
            1 => "cart",
            _ => "pv",
        };
        out.push(UserBehavior::new(
            (lcg_next(&mut state) % 1000) as i64,
            item,
            (item % 7) as i32,
            behavior,
            ts,
        ));
    }
    out
}

/// Per window end, the exact view count of every item in `[end - L, end)`.
fn expected_counts(events: &[UserBehavior], config: &JobConfig) -> BTreeMap<i64, HashMap<i64, u64>> {
    let size = config.window_length_minutes as i64 * MINUTE * 1000;
    let slide = config.slide_minutes as i64 * MINUTE * 1000;
    let mut out: BTreeMap<i64, HashMap<i64, u64>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.behavior == config.filter_action) {
        let t = event.event_time_ms().unwrap();
        let mut end = t - t.rem_euclid(slide) + slide;
        while end - size <= t {
            *out.entry(end).or_default().entry(event.item_id).or_default() += 1;
            end += slide;
        }
    }
    out
}

fn check_against_oracle(reports: &[RankingReport], events: &[UserBehavior], config: &JobConfig) {
    let expected = expected_counts(events, config);
    let mut seen = BTreeMap::new();
    for report in reports {
        assert!(
            seen.insert(report.window_end, ()).is_none(),
            "window {} reported twice",
            report.window_end
        );
        let counts = &expected[&report.window_end];
        assert_eq!(report.entries.len(), config.top_n.min(counts.len()));

        let listed: Vec<u64> = report.entries.iter().map(|e| e.view_count).collect();
        assert!(listed.windows(2).all(|w| w[0] >= w[1]), "not descending: {:?}", listed);

        let mut all: Vec<u64> = counts.values().copied().collect();
        all.sort_unstable_by(|a, b| b.cmp(a));
        all.truncate(config.top_n);
        assert_eq!(listed, all, "window {}", report.window_end);

        for (rank, entry) in report.entries.iter().enumerate() {
            assert_eq!(entry.rank, rank);
            assert_eq!(counts[&entry.item_id], entry.view_count);
        }
    }
    assert_eq!(
        seen.keys().collect::<Vec<_>>(),
        expected.keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_single_tumbling_window_ranks_items() {
    let reports = run(config(1, 1, 2), vec![pv(1, 0), pv(1, 1), pv(2, 2)]);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].window_end, 60_000);
    assert_eq!(ranks(&reports[0]), vec![(1, 2), (2, 1)]);
}

#[test]
fn test_non_view_behaviors_are_ignored() {
    let job = HotItemsJob::new(config(1, 1, 10)).unwrap();
    let mut sink = CollectSink::new();
    let events = vec![pv(1, 0), UserBehavior::new(1, 2, 1, "buy", 1), pv(1, 2)];
    let summary = job.run(events, &mut sink).unwrap();

    let reports = sink.into_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(ranks(&reports[0]), vec![(1, 2)]);
    assert_eq!(summary.metrics.events_read, 3);
    assert_eq!(summary.metrics.events_filtered, 1);
    assert_eq!(summary.metrics.window_results, 1);
    assert_eq!(summary.metrics.reports_emitted, 1);
}

#[test]
fn test_overlapping_windows_count_independently() {
    let events = vec![pv(9, 12 * MINUTE), pv(9, 17 * MINUTE)];
    let reports = run(config(60, 5, 10), events);

    assert_eq!(reports.len(), 13);
    let by_end: BTreeMap<i64, Vec<(i64, u64)>> =
        reports.iter().map(|r| (r.window_end, ranks(r))).collect();
    assert_eq!(by_end.len(), 13);

    let first_end = 15 * MINUTE * 1000;
    let last_end = 75 * MINUTE * 1000;
    assert_eq!(by_end[&first_end], vec![(9, 1)]);
    assert_eq!(by_end[&last_end], vec![(9, 1)]);
    for (end, ranked) in &by_end {
        if *end != first_end && *end != last_end {
            assert_eq!(ranked, &vec![(9, 2)], "window {}", end);
        }
    }
    let ends: Vec<_> = reports.iter().map(|r| r.window_end).collect();
    assert!(ends.windows(2).all(|w| w[0] < w[1]), "single ranker reports in order");
}

#[test]
fn test_under_populated_window_is_clamped() {
    let reports = run(config(1, 1, 10), vec![pv(5, 0), pv(6, 10), pv(5, 20)]);
    assert_eq!(ranks(&reports[0]), vec![(5, 2), (6, 1)]);
}

#[test]
fn test_generated_stream_matches_brute_force() {
    let events = gen_events(7, 3_000, 40);
    let config = config(60, 5, 5);
    let reports = run(config.clone(), events.clone());
    assert!(reports.len() > 12);
    check_against_oracle(&reports, &events, &config);
}

#[test]
fn test_parallel_tasks_deliver_complete_windows() {
    let events = gen_events(42, 5_000, 60);
    let config = JobConfig {
        window_parallelism: 4,
        ranker_parallelism: 3,
        channel_capacity: 8,
        ..config(30, 5, 4)
    };
    let reports = run(config.clone(), events.clone());
    check_against_oracle(&reports, &events, &config);

    let sequential = run(
        JobConfig {
            window_parallelism: 1,
            ranker_parallelism: 1,
            ..config.clone()
        },
        events,
    );
    let key = |r: &RankingReport| {
        (
            r.window_end,
            r.entries.iter().map(|e| e.view_count).collect::<Vec<_>>(),
        )
    };
    let mut parallel: Vec<_> = reports.iter().map(key).collect();
    parallel.sort();
    let sequential: Vec<_> = sequential.iter().map(key).collect();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_out_of_order_event_is_dropped_as_late() {
    let job = HotItemsJob::new(config(1, 1, 10)).unwrap();
    let mut sink = CollectSink::new();
    let summary = job
        .run(vec![pv(1, 0), pv(2, 120), pv(3, 5)], &mut sink)
        .unwrap();

    let reports = sink.into_reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(ranks(&reports[0]), vec![(1, 1)]);
    assert_eq!(ranks(&reports[1]), vec![(2, 1)]);
    assert_eq!(summary.metrics.out_of_order_events, 1);
    assert_eq!(summary.metrics.late_events, 1);
}

#[test]
fn test_cancel_before_start_reports_nothing() {
    let job = HotItemsJob::new(config(1, 1, 10)).unwrap();
    job.cancel_handle().cancel();
    let mut sink = CollectSink::new();
    let summary = job.run(vec![pv(1, 0), pv(1, 70)], &mut sink).unwrap();
    assert!(summary.cancelled);
    assert!(sink.reports().is_empty());
    assert_eq!(summary.metrics.events_read, 0);
}

#[test]
fn test_cancel_drops_open_windows() {
    let job = HotItemsJob::new(config(1, 1, 10)).unwrap();
    let handle = job.cancel_handle();
    let events = vec![pv(1, 0), pv(1, 30), pv(2, 61), pv(3, 125), pv(3, 200)];
    let stream = events.into_iter().enumerate().map(move |(idx, event)| {
        if idx == 3 {
            handle.cancel();
        }
        event
    });

    let mut sink = CollectSink::new();
    let summary = job.run(stream, &mut sink).unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.metrics.events_read, 3);

    let reports = sink.into_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].window_end, 60_000);
    assert_eq!(ranks(&reports[0]), vec![(1, 2)]);
}

#[test]
fn test_csv_to_text_report() {
    let csv = "\
1,1,1,pv,0
2,1,1,pv,1
bad line
3,2,1,pv,2
4,3,1,fav,3
";
    let job = HotItemsJob::new(config(1, 1, 2)).unwrap();
    let mut sink = WriterSink::new(Vec::new());
    let events = read_behaviors(csv.as_bytes(), job.metrics());
    let summary = job.run(events, &mut sink).unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        text,
        "\
====================================
Time: 1970-01-01 00:00:59.999
No0:  ItemID=1  Views=2
No1:  ItemID=2  Views=1
====================================

"
    );
    assert_eq!(summary.metrics.malformed_records, 1);
    assert_eq!(summary.metrics.events_filtered, 1);
}

#[test]
fn test_quoted_csv_fields_are_counted() {
    let csv = "1,7,1,\"pv\",0\n2,7,1,pv,1\n\"3\",8,1,pv,70\n";
    let job = HotItemsJob::new(config(1, 1, 3)).unwrap();
    let mut sink = CollectSink::new();
    let events = read_behaviors(csv.as_bytes(), job.metrics());
    let summary = job.run(events, &mut sink).unwrap();

    let reports = sink.into_reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].window_end, 60_000);
    assert_eq!(ranks(&reports[0]), vec![(7, 2)]);
    assert_eq!(reports[1].window_end, 120_000);
    assert_eq!(ranks(&reports[1]), vec![(8, 1)]);
    assert_eq!(summary.metrics.malformed_records, 0);
}

#[test]
fn test_timestamp_at_end_of_time_does_not_fail_the_job() {
    let reports = run(config(60, 5, 3), vec![pv(1, i64::MAX / 1000)]);
    assert!(reports.is_empty());

    let job = HotItemsJob::new(config(1, 1, 3)).unwrap();
    let mut sink = CollectSink::new();
    let events = vec![pv(3, 0), pv(1, i64::MAX / 1000), pv(2, i64::MAX), pv(4, i64::MIN)];
    let summary = job.run(events, &mut sink).unwrap();

    let reports = sink.into_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].window_end, 60_000);
    assert_eq!(ranks(&reports[0]), vec![(3, 1)]);
    // Seconds that overflow milliseconds never reach the source.
    assert_eq!(summary.metrics.malformed_records, 2);
    assert_eq!(summary.metrics.events_read, 2);
    // No window around i64::MAX fits in the time range.
    assert_eq!(summary.metrics.late_events, 1);
}

struct FailingSink;

impl ReportSink for FailingSink {
    fn emit(&mut self, _report: &RankingReport) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

#[test]
fn test_sink_failure_is_reported_by_its_task() {
    let config = JobConfig {
        window_parallelism: 3,
        ranker_parallelism: 2,
        channel_capacity: 1,
        ..config(10, 1, 3)
    };
    let job = HotItemsJob::new(config).unwrap();
    let err = job.run(gen_events(7, 2_000, 40), &mut FailingSink).unwrap_err();
    assert_eq!(format!("{err:#}"), "hot items job failed in collector: disk full");
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(HotItemsJob::new(config(5, 10, 3)).is_err());
    assert!(HotItemsJob::new(config(60, 5, 0)).is_err());
}
