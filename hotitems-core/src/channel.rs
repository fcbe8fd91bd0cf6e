//! Local channels between tasks.
//!
//! Bounded crossbeam channels carrying [`StreamElement`]s. A full channel
//! blocks the sender, which propagates backpressure up the pipeline.

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use thiserror::Error;

use crate::types::StreamElement;

/// The other end of a local channel went away.
///
/// Once one task fails, its neighbours see this error as the pipeline
/// unwinds, so it is rarely the root cause of a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelClosed {
    #[error("channel closed: receiver dropped")]
    ReceiverDropped,
    #[error("channel closed: sender dropped")]
    SenderDropped,
    #[error("input channel {0} closed without end marker")]
    MissingEnd(usize),
}

impl ChannelClosed {
    /// Whether `err` was caused by a closed channel.
    pub fn caused(err: &anyhow::Error) -> bool {
        err.chain().any(|cause| cause.is::<ChannelClosed>())
    }
}

/// Sender side of a local channel.
pub struct LocalChannelSender<T> {
    sender: Sender<StreamElement<T>>,
}

impl<T> Clone for LocalChannelSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> LocalChannelSender<T> {
    /// Send an element, blocking while the channel is full.
    pub fn send(&self, element: StreamElement<T>) -> Result<()> {
        self.sender
            .send(element)
            .map_err(|_| ChannelClosed::ReceiverDropped)?;
        Ok(())
    }

    /// Number of elements waiting in the channel.
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

/// Receiver side of a local channel.
pub struct LocalChannelReceiver<T> {
    pub(crate) receiver: Receiver<StreamElement<T>>,
}

impl<T> LocalChannelReceiver<T> {
    /// Block until the next element arrives.
    pub fn recv(&self) -> Result<StreamElement<T>> {
        Ok(self
            .receiver
            .recv()
            .map_err(|_| ChannelClosed::SenderDropped)?)
    }

    /// Non-blocking receive. `Ok(None)` means nothing is buffered yet.
    pub fn try_recv(&self) -> Result<Option<StreamElement<T>>> {
        match self.receiver.try_recv() {
            Ok(elem) => Ok(Some(elem)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelClosed::SenderDropped.into()),
        }
    }
}

/// Create a bounded channel pair.
///
/// `capacity` is clamped to at least 1 so a zero setting never turns the
/// channel into a rendezvous point.
pub fn local_channel<T>(capacity: usize) -> (LocalChannelSender<T>, LocalChannelReceiver<T>) {
    let (sender, receiver) = bounded(capacity.max(1));
    (
        LocalChannelSender { sender },
        LocalChannelReceiver { receiver },
    )
}
