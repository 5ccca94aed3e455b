pub mod transport;

pub use transport::{
    ConnectionScope, EventSource, FrameSink, HttpScope, InboundEvent, MessagePayload,
    OutboundFrame, TransportError, WsScope,
};
