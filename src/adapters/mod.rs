pub mod channel;
pub(crate) mod http;
pub mod protocol;
pub(crate) mod websocket;

/// Re-export commonly used types from adapters
pub use channel::{ChannelEventSource, ChannelFrameSink};
pub use protocol::{ProtocolAdapter, ServeError};
