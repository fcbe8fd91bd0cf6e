//! Fan-out to downstream tasks.

use anyhow::{Result, bail};

use crate::channel::LocalChannelSender;
use crate::partitioner::Partitioner;
use crate::types::{StreamElement, StreamRecord};

/// Sends elements to the downstream channels of a task.
///
/// Records are routed to exactly one channel; watermarks and end markers
/// are broadcast to all of them.
pub struct OutputGate<T> {
    channels: Vec<LocalChannelSender<T>>,
}

impl<T> OutputGate<T> {
    pub fn new(channels: Vec<LocalChannelSender<T>>) -> Self {
        Self { channels }
    }

    /// Send to the channel at `channel_idx`.
    pub fn emit_to(&self, channel_idx: usize, element: StreamElement<T>) -> Result<()> {
        match self.channels.get(channel_idx) {
            Some(channel) => channel.send(element),
            None => bail!(
                "output channel {} out of range ({} channels)",
                channel_idx,
                self.channels.len()
            ),
        }
    }

    /// Route a record to the channel chosen by `partitioner`.
    pub fn emit_partitioned<P>(&self, record: StreamRecord<T>, partitioner: &P) -> Result<()>
    where
        P: Partitioner<T> + ?Sized,
    {
        if self.channels.is_empty() {
            return Ok(());
        }
        let target = partitioner.partition(&record.value, self.channels.len());
        self.emit_to(target, StreamElement::Record(record))
    }

    /// Send a copy of `element` to every channel.
    pub fn broadcast(&self, element: StreamElement<T>) -> Result<()>
    where
        T: Clone,
    {
        let Some((last, rest)) = self.channels.split_last() else {
            return Ok(());
        };
        for channel in rest {
            channel.send(element.clone())?;
        }
        last.send(element)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }
}
