//! The WebSocket connection driver.
//!
//! Accepts (or rejects) the handshake, then runs the persistent receive
//! loop: every inbound message gets a fresh request/responder pair bound to
//! the same sink. Decode failures are reported back in-band and the
//! connection stays open; only a disconnect event or a programmer error ends
//! the loop.

use std::sync::Arc;

use crate::adapters::protocol::ServeError;
use crate::core::body::BodyValue;
use crate::core::handler::HandlerError;
use crate::core::request::WsRequest;
use crate::core::response::WsResponder;
use crate::core::router::WsResolution;
use crate::core::service::App;
use crate::ports::transport::{
    EventSource, FrameSink, InboundEvent, OutboundFrame, TransportError, WsScope,
};

pub(crate) async fn run(
    app: &App,
    scope: WsScope,
    source: &mut dyn EventSource,
    sink: Arc<dyn FrameSink>,
) -> Result<(), ServeError> {
    match source.next_event().await? {
        InboundEvent::WsConnect => {}
        other => {
            return Err(TransportError::UnexpectedEvent {
                context: "awaiting the websocket handshake",
                kind: other.kind(),
            }
            .into());
        }
    }

    let WsResolution::Matched {
        handler,
        args,
        content_type,
    } = app.ws_routes().resolve(&scope.path)
    else {
        tracing::debug!("no channel registered for {}, closing", scope.path);
        sink.send_frame(OutboundFrame::WsClose).await?;
        return Ok(());
    };

    tracing::info!("accepted websocket channel on {}", scope.path);
    sink.send_frame(OutboundFrame::WsAccept).await?;

    let content_type = content_type.unwrap_or_else(|| app.config().content_type.clone());
    let scope = Arc::new(scope);
    loop {
        match source.next_event().await? {
            InboundEvent::WsDisconnect => {
                tracing::debug!("peer disconnected from {}", scope.path);
                break;
            }
            InboundEvent::WsMessage(payload) => {
                let request = WsRequest::new(scope.clone(), payload, content_type.clone());
                let responder = WsResponder::new(sink.clone(), content_type.clone());
                match handler.on_message(&request, &responder, &args).await {
                    Ok(()) => {}
                    Err(HandlerError::Decode(error)) => {
                        tracing::debug!("message decode failed: {error}");
                        responder
                            .send(BodyValue::Json(serde_json::json!({
                                "status": false,
                                "error": "P001",
                                "message": "Data JSON parse error",
                            })))
                            .await?;
                    }
                    Err(HandlerError::Transport(error)) => return Err(error.into()),
                    Err(HandlerError::Internal(report)) => return Err(ServeError::Handler(report)),
                    Err(HandlerError::Abort(status)) => {
                        // An HTTP-lifecycle signal; meaningless on a channel.
                        tracing::debug!("ignoring abort({}) from a websocket trigger", status.as_u16());
                    }
                }
            }
            other => {
                return Err(TransportError::UnexpectedEvent {
                    context: "receiving websocket messages",
                    kind: other.kind(),
                }
                .into());
            }
        }
    }
    Ok(())
}
