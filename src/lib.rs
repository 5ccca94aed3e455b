//! Synapse - a minimal event-protocol web core.
//!
//! Synapse turns a stream of inbound connection events (HTTP request events
//! or WebSocket lifecycle events) into calls to registered handlers, and
//! turns handler results back into outbound protocol frames. It implements a
//! **hexagonal architecture**: the transport that actually accepts sockets is
//! a black-box duplex channel behind the `ports` traits, and the crate ships
//! an in-memory channel adapter for tests and embedding.
//!
//! # Features
//! - Literal and regex pattern routing with positional captures
//! - Per-route method sets and content-type overrides
//! - Lazily decoded, memoized request views (query, headers, cookies, body)
//! - Response lifecycle state machine with redirect and abort short-circuits
//! - Synthesized `OPTIONS` preflight responses with CORS headers
//! - Persistent WebSocket channels with in-band decode error reporting
//! - Configuration loading (TOML / YAML / JSON / INI) & validation
//! - Structured tracing via `tracing`
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use http::Method;
//! use synapse::{
//!     adapters::{ChannelEventSource, ChannelFrameSink, ProtocolAdapter},
//!     config::AppConfig,
//!     core::{App, BodyValue, BoxFuture, HandlerResult, HttpRequest, HttpResponse, RouteDef},
//!     ports::transport::{ConnectionScope, HttpScope, InboundEvent},
//! };
//!
//! fn root<'a>(
//!     _request: &'a HttpRequest,
//!     _response: &'a mut HttpResponse,
//!     _args: &'a [String],
//! ) -> BoxFuture<'a, HandlerResult> {
//!     Box::pin(async move { Ok(BodyValue::Text("hello".to_string())) })
//! }
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let mut app = App::new(AppConfig::default());
//! app.route(RouteDef::at("/").content_type("text/plain"), Arc::new(root))?;
//! let app = Arc::new(app);
//!
//! // One connection: the transport side feeds events and drains frames.
//! let (events, mut source) = ChannelEventSource::with_capacity(4);
//! let (sink, _frames) = ChannelFrameSink::unbounded();
//! events
//!     .send(InboundEvent::HttpBody { body: Bytes::new(), more_body: false })
//!     .await?;
//!
//! ProtocolAdapter::new(app)
//!     .handle_connection(
//!         ConnectionScope::Http(HttpScope {
//!             path: "/".to_string(),
//!             method: Method::GET,
//!             headers: Vec::new(),
//!             query_string: Bytes::new(),
//!         }),
//!         &mut source,
//!         Arc::new(sink),
//!     )
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping business logic inside `core`. Route tables are populated
//! with `&mut App` during startup and frozen behind an `Arc` for the serving
//! lifetime; each connection is then one sequential async path with no state
//! shared across connections.
//!
//! # Error Handling
//! Fallible APIs return a domain specific error type; opaque handler
//! failures travel as `eyre::Report` and propagate out of the one connection
//! that raised them.
//!
//! # Concurrency
//! The core spawns no tasks. A surrounding scheduler runs many connections'
//! adapters concurrently, one logical sequence per connection.
// Re-export public modules with explicit visibility controls
pub mod adapters;
pub mod config;
pub mod core;
pub mod ports;
pub mod tracing_setup;

// Re-export the types most embedders need
pub use crate::{
    adapters::{ChannelEventSource, ChannelFrameSink, ProtocolAdapter, ServeError},
    config::AppConfig,
    core::{App, BodyValue, HandlerError, HttpHandler, HttpRequest, HttpResponse, RouteDef,
        SetCookie, WsHandler, WsRequest, WsResponder, WsRouteDef},
    ports::transport::{ConnectionScope, EventSource, FrameSink, InboundEvent, OutboundFrame},
};
