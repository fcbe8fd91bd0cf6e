use super::*;

// ── AggregatingWindowOperator ─────────────────────────────────────────────────

/// Callback receiving records that arrive after all of their windows fired.
pub type LateDataHandler<T> = Box<dyn FnMut(&T, EventTime) + Send>;

/// Keyed event-time window operator with incremental aggregation.
///
/// # Processing model
///
/// - **Records**: assigned to one or more windows by the `WindowAssigner`.
///   Each `(key, window)` pair keeps a single accumulator that the
///   `AggregateFunction` folds the record into; records are never buffered.
///   The first record of a pair registers a timer at `window.max_timestamp()`.
/// - **Event time**: every due timer removes its accumulator, converts it with
///   `get_result`, and hands it to the `WindowFunction`. Outputs carry the
///   window's max timestamp as event time.
/// - **Late records**: a record whose windows have all fired already is
///   dropped and passed to the late-data handler, if any.
///
/// Pairs that never received a record hold no state and emit nothing.
pub struct AggregatingWindowOperator<K, T, ACC, AGG, OUT, KF, WA, AF, WF> {
    key_fn: KF,
    assigner: WA,
    aggregate_fn: AF,
    window_fn: WF,
    /// (key_bytes, window) -> (original key, accumulator).
    windows: HashMap<(Vec<u8>, TimeWindow), (K, ACC)>,
    timer_service: TimerService,
    current_watermark: EventTime,
    late_records: u64,
    late_data_handler: Option<LateDataHandler<T>>,
    _phantom: PhantomData<fn() -> (AGG, OUT)>,
}

impl<K, T, ACC, AGG, OUT, KF, WA, AF, WF> AggregatingWindowOperator<K, T, ACC, AGG, OUT, KF, WA, AF, WF>
where
    K: StreamData,
    T: Send,
    ACC: Send,
    OUT: Send,
    KF: Fn(&T) -> K + Send,
    WA: WindowAssigner<T>,
    AF: AggregateFunction<T, ACC, AGG>,
    WF: WindowFunction<K, AGG, OUT>,
{
    /// Create a new operator.
    ///
    /// - `key_fn`: extracts the grouping key from each element
    /// - `assigner`: assigns windows to each element
    /// - `aggregate_fn`: incremental per-window aggregation
    /// - `window_fn`: turns the aggregate of a fired window into outputs
    pub fn new(key_fn: KF, assigner: WA, aggregate_fn: AF, window_fn: WF) -> Self {
        Self {
            key_fn,
            assigner,
            aggregate_fn,
            window_fn,
            windows: HashMap::new(),
            timer_service: TimerService::new(),
            current_watermark: EVENT_TIME_MIN,
            late_records: 0,
            late_data_handler: None,
            _phantom: PhantomData,
        }
    }

    /// Route late records to `handler` instead of dropping them silently.
    pub fn with_late_data_handler(mut self, handler: impl FnMut(&T, EventTime) + Send + 'static) -> Self {
        self.late_data_handler = Some(Box::new(handler));
        self
    }

    /// Number of `(key, window)` pairs currently holding an accumulator.
    pub fn buffered_window_count(&self) -> usize {
        self.windows.len()
    }

    /// Number of records dropped because all of their windows had fired.
    pub fn late_records(&self) -> u64 {
        self.late_records
    }

    pub fn current_watermark(&self) -> EventTime {
        self.current_watermark
    }

    fn accumulate(&mut self, key: &K, key_bytes: &[u8], window: TimeWindow, value: &T) -> Result<()> {
        let map_key = (key_bytes.to_vec(), window);
        if let Some((_, acc)) = self.windows.get_mut(&map_key) {
            self.aggregate_fn.add(acc, value);
            return Ok(());
        }

        let mut acc = self.aggregate_fn.create_accumulator();
        self.aggregate_fn.add(&mut acc, value);
        self.timer_service
            .register(bincode::serialize(&map_key)?, window.max_timestamp());
        self.windows.insert(map_key, (key.clone(), acc));
        Ok(())
    }
}

impl<K, T, ACC, AGG, OUT, KF, WA, AF, WF> Operator<T> for AggregatingWindowOperator<K, T, ACC, AGG, OUT, KF, WA, AF, WF>
where
    K: StreamData,
    T: Send,
    ACC: Send,
    OUT: Send,
    KF: Fn(&T) -> K + Send,
    WA: WindowAssigner<T>,
    AF: AggregateFunction<T, ACC, AGG>,
    WF: WindowFunction<K, AGG, OUT>,
{
    type OUT = OUT;

    fn process_record(
        &mut self,
        record: StreamRecord<T>,
        _output: &mut Vec<StreamRecord<OUT>>,
    ) -> Result<()> {
        let Some(timestamp) = record.timestamp else {
            anyhow::bail!("window operator received a record without event time");
        };
        let key = (self.key_fn)(&record.value);
        let key_bytes = bincode::serialize(&key)?;

        let mut assigned = false;
        for window in self.assigner.assign_windows(&record.value, timestamp) {
            if window.max_timestamp() <= self.current_watermark {
                continue;
            }
            self.accumulate(&key, &key_bytes, window, &record.value)?;
            assigned = true;
        }

        if !assigned {
            self.late_records += 1;
            if let Some(handler) = self.late_data_handler.as_mut() {
                handler(&record.value, timestamp);
            }
        }
        Ok(())
    }

    fn on_event_time(
        &mut self,
        event_time: EventTime,
        output: &mut Vec<StreamRecord<OUT>>,
    ) -> Result<()> {
        self.current_watermark = self.current_watermark.max(event_time);

        let mut results = Vec::new();
        for (timer_key, _) in self.timer_service.drain_due(event_time) {
            let (key_bytes, window): (Vec<u8>, TimeWindow) = bincode::deserialize(&timer_key)?;
            let Some((key, acc)) = self.windows.remove(&(key_bytes, window)) else {
                continue;
            };
            let aggregate = self.aggregate_fn.get_result(acc);
            self.window_fn
                .apply(&key, &window, std::slice::from_ref(&aggregate), &mut results);
            output.extend(
                results
                    .drain(..)
                    .map(|value| StreamRecord::with_timestamp(value, window.max_timestamp())),
            );
        }
        Ok(())
    }
}
