//! The per-connection entry point.

use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use crate::adapters::{http, websocket};
use crate::core::service::App;
use crate::ports::transport::{ConnectionScope, EventSource, FrameSink, TransportError};
use crate::tracing_setup;

/// Why a connection's handling ended abnormally.
///
/// Expected lifecycle outcomes (not-found, aborts, decode failures) are
/// answered on the wire and never surface here; what does surface must not
/// be swallowed, and concerns only the one connection it came from.
#[derive(Error, Debug)]
pub enum ServeError {
    /// The duplex channel failed mid-connection.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A handler raised a programmer error.
    #[error("handler failed: {0}")]
    Handler(eyre::Report),
}

/// Drives one connection at a time against a frozen [`App`].
///
/// Cheap to clone the `Arc` into; a surrounding scheduler runs one
/// `handle_connection` per accepted connection, each with its own event
/// source and frame sink.
pub struct ProtocolAdapter {
    app: Arc<App>,
}

impl ProtocolAdapter {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    /// Handle one connection to completion: a full request/response cycle
    /// for HTTP, or the whole session for a WebSocket.
    pub async fn handle_connection(
        &self,
        scope: ConnectionScope,
        source: &mut dyn EventSource,
        sink: Arc<dyn FrameSink>,
    ) -> Result<(), ServeError> {
        match scope {
            ConnectionScope::Http(scope) => {
                let span = tracing_setup::create_request_span(scope.method.as_str(), &scope.path);
                http::run(&self.app, scope, source, sink).instrument(span).await
            }
            ConnectionScope::WebSocket(scope) => {
                let span = tracing_setup::create_channel_span(&scope.path);
                websocket::run(&self.app, scope, source, sink)
                    .instrument(span)
                    .await
            }
        }
    }
}
