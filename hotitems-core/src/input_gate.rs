//! Fan-in over several upstream channels.

use anyhow::{Result, bail};
use crossbeam_channel::Select;

use crate::channel::{ChannelClosed, LocalChannelReceiver};
use crate::types::StreamElement;

/// Channel identifier (index in the input gate).
pub type ChannelIndex = usize;

/// Reads from every upstream channel of a task.
///
/// Channels are selected fairly. Per-channel `End` markers are swallowed;
/// a single `End` is returned once every channel has ended.
pub struct InputGate<T> {
    channels: Vec<LocalChannelReceiver<T>>,
    ended: Vec<bool>,
    ended_count: usize,
}

impl<T> InputGate<T> {
    pub fn new(channels: Vec<LocalChannelReceiver<T>>) -> Self {
        let n = channels.len();
        Self {
            channels,
            ended: vec![false; n],
            ended_count: 0,
        }
    }

    /// Block until any live channel yields an element.
    ///
    /// Returns `(channel, element)`. Errors if called after the final `End`,
    /// or if an upstream sender vanished without sending `End`.
    pub fn next(&mut self) -> Result<(ChannelIndex, StreamElement<T>)> {
        loop {
            if self.all_ended() {
                bail!("all input channels have ended");
            }

            let mut select = Select::new();
            let mut live = Vec::with_capacity(self.channels.len() - self.ended_count);
            for (idx, channel) in self.channels.iter().enumerate() {
                if !self.ended[idx] {
                    select.recv(&channel.receiver);
                    live.push(idx);
                }
            }

            let oper = select.select();
            let channel_idx = live[oper.index()];
            let element = oper
                .recv(&self.channels[channel_idx].receiver)
                .map_err(|_| ChannelClosed::MissingEnd(channel_idx))?;

            if let StreamElement::End = element {
                self.ended[channel_idx] = true;
                self.ended_count += 1;
                if self.all_ended() {
                    return Ok((channel_idx, StreamElement::End));
                }
                continue;
            }
            return Ok((channel_idx, element));
        }
    }

    pub fn all_ended(&self) -> bool {
        self.ended_count == self.channels.len()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }
}
