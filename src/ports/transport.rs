//! The transport port: the abstract duplex channel the core is driven by.
//!
//! A transport (socket server, test harness, embedded bridge) hands the core
//! one [`ConnectionScope`] per connection plus a stream of [`InboundEvent`]s,
//! and consumes the [`OutboundFrame`]s the core produces. The core never
//! touches sockets; everything below these traits is somebody else's problem.

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use thiserror::Error;

/// Error type for duplex-channel operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The peer (or the surrounding event loop) closed the channel
    #[error("transport channel closed")]
    Closed,

    /// The transport delivered an event the current protocol state cannot accept
    #[error("unexpected {kind} event while {context}")]
    UnexpectedEvent {
        /// What the adapter was doing when the event arrived
        context: &'static str,
        /// The event kind that arrived
        kind: &'static str,
    },
}

/// Connection metadata for one HTTP request.
///
/// Header names arrive as raw byte pairs in transport order. Transports are
/// expected to deliver lowercase header names (the usual event-protocol
/// convention); the core preserves whatever it is given.
#[derive(Debug, Clone)]
pub struct HttpScope {
    pub path: String,
    pub method: Method,
    pub headers: Vec<(Bytes, Bytes)>,
    pub query_string: Bytes,
}

/// Connection metadata for one WebSocket session.
#[derive(Debug, Clone)]
pub struct WsScope {
    pub path: String,
    pub headers: Vec<(Bytes, Bytes)>,
    pub query_string: Bytes,
}

/// What kind of connection the transport accepted.
#[derive(Debug, Clone)]
pub enum ConnectionScope {
    Http(HttpScope),
    WebSocket(WsScope),
}

/// One WebSocket message payload, text or binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePayload {
    Text(String),
    Binary(Bytes),
}

/// Events the transport feeds into the core.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// One HTTP body chunk; repeated while `more_body` is true.
    HttpBody { body: Bytes, more_body: bool },
    /// WebSocket handshake request.
    WsConnect,
    /// One WebSocket message.
    WsMessage(MessagePayload),
    /// The WebSocket peer went away.
    WsDisconnect,
}

impl InboundEvent {
    /// Stable event name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::HttpBody { .. } => "http.request",
            InboundEvent::WsConnect => "websocket.connect",
            InboundEvent::WsMessage(_) => "websocket.receive",
            InboundEvent::WsDisconnect => "websocket.disconnect",
        }
    }
}

/// Frames the core hands back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// HTTP status + accumulated headers; sent exactly once per response.
    ResponseStart {
        status: http::StatusCode,
        headers: Vec<(Bytes, Bytes)>,
    },
    /// HTTP response body.
    ResponseBody { body: Bytes },
    /// Accept a WebSocket handshake.
    WsAccept,
    /// One outbound WebSocket message.
    WsSend(MessagePayload),
    /// Reject or terminate a WebSocket session.
    WsClose,
}

/// EventSource defines the receiving half of the duplex channel.
///
/// A connection's adapter owns its source exclusively and awaits events in
/// sequence; the core never polls two receives concurrently.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next inbound event on this connection.
    async fn next_event(&mut self) -> Result<InboundEvent, TransportError>;
}

/// FrameSink defines the sending half of the duplex channel.
///
/// Shared (via `Arc`) between the adapter and the response objects it builds,
/// which is why sending takes `&self`.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Queue one outbound frame for delivery to the peer.
    async fn send_frame(&self, frame: OutboundFrame) -> Result<(), TransportError>;
}
