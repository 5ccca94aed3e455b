//! In-memory duplex transport over tokio channels.
//!
//! The adapter of choice for tests and for embedding the core behind an
//! existing event loop: the driving side pushes [`InboundEvent`]s into an
//! mpsc sender and drains [`OutboundFrame`]s from a receiver, while the core
//! sees the ordinary port traits.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ports::transport::{EventSource, FrameSink, InboundEvent, OutboundFrame, TransportError};

/// Receiving half of an in-memory connection.
pub struct ChannelEventSource {
    events: mpsc::Receiver<InboundEvent>,
}

impl ChannelEventSource {
    /// Build a source plus the sender the transport side feeds.
    pub fn with_capacity(capacity: usize) -> (mpsc::Sender<InboundEvent>, Self) {
        let (sender, events) = mpsc::channel(capacity);
        (sender, Self { events })
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn next_event(&mut self) -> Result<InboundEvent, TransportError> {
        self.events.recv().await.ok_or(TransportError::Closed)
    }
}

/// Sending half of an in-memory connection.
pub struct ChannelFrameSink {
    frames: mpsc::UnboundedSender<OutboundFrame>,
}

impl ChannelFrameSink {
    /// Build a sink plus the receiver the transport side drains.
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (frames, receiver) = mpsc::unbounded_channel();
        (Self { frames }, receiver)
    }
}

#[async_trait]
impl FrameSink for ChannelFrameSink {
    async fn send_frame(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.frames.send(frame).map_err(|_| TransportError::Closed)
    }
}
