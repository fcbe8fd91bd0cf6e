//! Keyed process functions: per-key state plus event-time timers.
//!
//! A [`KeyedProcessFunction`] sees one element at a time together with its
//! key, reads and writes keyed state through a [`ProcessContext`], and can
//! schedule event-time timers for the current key. [`KeyedProcessOperator`]
//! drives such a function inside a task: it sets the current key before every
//! call and fires due timers when event time advances.
//!
//! ## Example
//!
//! ```ignore
//! struct Buffer {
//!     items: ListStateHandle<i64>,
//! }
//!
//! impl<B: KeyedStateBackend> KeyedProcessFunction<String, i64, i64, B> for Buffer {
//!     fn process_element(&mut self, _key: &String, value: i64, ctx: &mut ProcessContext<i64, B>) -> Result<()> {
//!         self.items.add(ctx.state_mut(), value)?;
//!         ctx.register_event_time_timer(1_000)?;
//!         Ok(())
//!     }
//!
//!     fn on_timer(&mut self, _ts: EventTime, _key: &String, ctx: &mut ProcessContext<i64, B>) -> Result<()> {
//!         let sum = self.items.get(ctx.state())?.into_iter().sum();
//!         self.items.clear(ctx.state_mut())?;
//!         ctx.collect(sum);
//!         Ok(())
//!     }
//! }
//! ```

use std::marker::PhantomData;

use anyhow::{Result, anyhow};

use crate::operator::Operator;
use crate::state::KeyedStateBackend;
use crate::time::TimerService;
use crate::types::{EventTime, StreamData, StreamRecord};

/// Stateful transformation on a keyed stream.
///
/// **Generic parameter `B`**: the concrete state backend type, so state calls
/// are statically dispatched.
pub trait KeyedProcessFunction<K, IN, OUT, B>: Send
where
    B: KeyedStateBackend,
{
    /// Process a single element. The backend's current key is `key`.
    fn process_element(
        &mut self,
        key: &K,
        value: IN,
        ctx: &mut ProcessContext<'_, OUT, B>,
    ) -> Result<()>;

    /// Called when an event-time timer registered for `key` fires.
    ///
    /// `timestamp` is the timer's fire time. Default implementation does nothing.
    fn on_timer(
        &mut self,
        _timestamp: EventTime,
        _key: &K,
        _ctx: &mut ProcessContext<'_, OUT, B>,
    ) -> Result<()> {
        Ok(())
    }
}

/// Context handed to process functions.
///
/// Provides keyed state, timer registration for the current key, and output
/// collection. Collected values inherit the timestamp of the element (or
/// timer) being processed.
pub struct ProcessContext<'a, OUT, B: KeyedStateBackend> {
    state_backend: &'a mut B,
    timer_service: &'a mut TimerService,
    output_buffer: &'a mut Vec<StreamRecord<OUT>>,
    timestamp: Option<EventTime>,
}

impl<'a, OUT, B: KeyedStateBackend> ProcessContext<'a, OUT, B> {
    pub fn new(
        state_backend: &'a mut B,
        timer_service: &'a mut TimerService,
        output_buffer: &'a mut Vec<StreamRecord<OUT>>,
        timestamp: Option<EventTime>,
    ) -> Self {
        Self {
            state_backend,
            timer_service,
            output_buffer,
            timestamp,
        }
    }

    /// Immutable access to the state backend, for handle reads.
    pub fn state(&self) -> &B {
        self.state_backend
    }

    /// Mutable access to the state backend, for handle writes.
    pub fn state_mut(&mut self) -> &mut B {
        self.state_backend
    }

    /// Register an event-time timer for the current key.
    ///
    /// Registering a timer that is already pending is a no-op; returns
    /// `true` only when a new timer was created.
    pub fn register_event_time_timer(&mut self, fire_at: EventTime) -> Result<bool> {
        let key = self
            .state_backend
            .current_key()
            .ok_or_else(|| anyhow!("timer registration outside of a keyed context"))?;
        Ok(self.timer_service.register(key.to_vec(), fire_at))
    }

    /// Emit a value downstream.
    pub fn collect(&mut self, value: OUT) {
        self.output_buffer.push(StreamRecord {
            value,
            timestamp: self.timestamp,
        });
    }
}

/// Operator that runs a [`KeyedProcessFunction`].
///
/// Owns the state backend and timer service for all keys routed to its task.
/// Timers fire in ascending fire time when event time reaches them; each
/// `(key, fire_at)` fires exactly once.
pub struct KeyedProcessOperator<K, IN, OUT, KF, F, B> {
    key_fn: KF,
    process_fn: F,
    state_backend: B,
    timer_service: TimerService,
    _phantom: PhantomData<fn(IN) -> (K, OUT)>,
}

impl<K, IN, OUT, KF, F, B> KeyedProcessOperator<K, IN, OUT, KF, F, B>
where
    K: StreamData,
    KF: Fn(&IN) -> K + Send,
    F: KeyedProcessFunction<K, IN, OUT, B>,
    B: KeyedStateBackend,
{
    pub fn new(key_fn: KF, process_fn: F, state_backend: B) -> Self {
        Self {
            key_fn,
            process_fn,
            state_backend,
            timer_service: TimerService::new(),
            _phantom: PhantomData,
        }
    }

    pub fn state_backend(&self) -> &B {
        &self.state_backend
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.timer_service.len()
    }
}

impl<K, IN, OUT, KF, F, B> Operator<IN> for KeyedProcessOperator<K, IN, OUT, KF, F, B>
where
    K: StreamData,
    OUT: Send,
    KF: Fn(&IN) -> K + Send,
    F: KeyedProcessFunction<K, IN, OUT, B>,
    B: KeyedStateBackend,
{
    type OUT = OUT;

    fn process_record(
        &mut self,
        record: StreamRecord<IN>,
        output: &mut Vec<StreamRecord<OUT>>,
    ) -> Result<()> {
        let key = (self.key_fn)(&record.value);
        self.state_backend.set_current_key(bincode::serialize(&key)?);

        let mut ctx = ProcessContext::new(
            &mut self.state_backend,
            &mut self.timer_service,
            output,
            record.timestamp,
        );
        self.process_fn.process_element(&key, record.value, &mut ctx)
    }

    fn on_event_time(
        &mut self,
        event_time: EventTime,
        output: &mut Vec<StreamRecord<OUT>>,
    ) -> Result<()> {
        for (key_bytes, fire_at) in self.timer_service.drain_due(event_time) {
            let key: K = bincode::deserialize(&key_bytes)?;
            self.state_backend.set_current_key(key_bytes);

            let mut ctx = ProcessContext::new(
                &mut self.state_backend,
                &mut self.timer_service,
                output,
                Some(fire_at),
            );
            self.process_fn.on_timer(fire_at, &key, &mut ctx)?;
        }
        Ok(())
    }
}
