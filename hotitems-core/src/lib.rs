//! # hotitems-core
//!
//! Event-time stream processing building blocks used by the hot-items job.
//!
//! - [`types`]: [`StreamElement`](types::StreamElement),
//!   [`StreamRecord`](types::StreamRecord), [`Watermark`](types::Watermark)
//!   and the [`StreamData`](types::StreamData) bound.
//! - [`time`]: watermark strategies, multi-input watermark alignment and the
//!   event-time [`TimerService`](time::TimerService).
//! - [`window`]: window assigners and the incremental
//!   [`AggregatingWindowOperator`](window::AggregatingWindowOperator).
//! - [`state`]: keyed list state on a [`HashMapStateBackend`](state::HashMapStateBackend).
//! - [`process`]: keyed process functions with event-time timers.
//! - [`runtime`]: the source loop and the per-operator [`Task`](runtime::Task),
//!   wired together with [`channel`]s, gates and [`partitioner`]s.

pub mod channel;
pub mod input_gate;
pub mod operator;
pub mod output_gate;
pub mod partitioner;
pub mod process;
pub mod runtime;
pub mod state;
pub mod time;
pub mod types;
pub mod window;
