//! The HTTP connection driver.
//!
//! One call handles one request end to end: assemble the possibly-chunked
//! body, resolve the route, run the handler, and make sure exactly one
//! header frame and one body frame leave, whatever path the request took.

use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode};
use std::sync::Arc;

use crate::adapters::protocol::ServeError;
use crate::core::body::BodyValue;
use crate::core::handler::HandlerError;
use crate::core::request::HttpRequest;
use crate::core::response::HttpResponse;
use crate::core::router::HttpResolution;
use crate::core::service::App;
use crate::ports::transport::{EventSource, FrameSink, HttpScope, InboundEvent, TransportError};

enum AssembledBody {
    Complete(Bytes),
    TooLarge,
}

pub(crate) async fn run(
    app: &App,
    scope: HttpScope,
    source: &mut dyn EventSource,
    sink: Arc<dyn FrameSink>,
) -> Result<(), ServeError> {
    let config = app.config();
    tracing::info!("handling {} request to {}", scope.method, scope.path);

    let body = match assemble_body(source, config.max_body_bytes).await? {
        AssembledBody::Complete(body) => body,
        AssembledBody::TooLarge => {
            tracing::warn!("request body exceeded the configured cap, rejecting");
            let mut response = HttpResponse::new(
                sink,
                config.content_type.clone(),
                config.charset.clone(),
                config.allow_origin.as_deref(),
            );
            return finish(
                Err(response
                    .abort(StatusCode::PAYLOAD_TOO_LARGE, BodyValue::Empty)
                    .await),
                &mut response,
            )
            .await;
        }
    };

    let resolution = app.http_routes().resolve(&scope.path, &scope.method);
    let content_type = match &resolution {
        HttpResolution::Matched { content_type, .. } => content_type
            .clone()
            .unwrap_or_else(|| config.content_type.clone()),
        // Preflight responses are always plain text, whatever the route says.
        HttpResolution::Options { .. } => "text/plain".to_string(),
        _ => config.content_type.clone(),
    };

    let request = HttpRequest::new(scope, body);
    let mut response = HttpResponse::new(
        sink,
        content_type,
        config.charset.clone(),
        config.allow_origin.as_deref(),
    );

    let outcome: Result<(), HandlerError> = match resolution {
        HttpResolution::NotFound => {
            Err(response.abort(StatusCode::NOT_FOUND, BodyValue::Empty).await)
        }
        HttpResolution::MethodNotAllowed => Err(response
            .abort(StatusCode::METHOD_NOT_ALLOWED, BodyValue::Empty)
            .await),
        HttpResolution::Options { methods } => preflight(&mut response, &methods).await,
        HttpResolution::Matched { handler, args, .. } => {
            match handler.handle(&request, &mut response, &args).await {
                Ok(body) if !response.is_processed() => response
                    .process(body, StatusCode::OK)
                    .await
                    .map_err(HandlerError::from),
                Ok(_) => Ok(()),
                Err(error) => Err(error),
            }
        }
    };

    finish(outcome, &mut response).await
}

/// Map a handler outcome to the connection-level result, converting decode
/// failures into a 400 and swallowing the expected abort signal.
async fn finish(
    outcome: Result<(), HandlerError>,
    response: &mut HttpResponse,
) -> Result<(), ServeError> {
    match outcome {
        Ok(()) => Ok(()),
        Err(HandlerError::Abort(status)) => {
            tracing::debug!("response finalized early with status {}", status.as_u16());
            Ok(())
        }
        Err(HandlerError::Decode(error)) => {
            tracing::debug!("request body decode failed: {error}");
            match response.abort(StatusCode::BAD_REQUEST, BodyValue::Empty).await {
                HandlerError::Transport(transport) => Err(ServeError::Transport(transport)),
                _ => Ok(()),
            }
        }
        Err(HandlerError::Transport(error)) => Err(ServeError::Transport(error)),
        Err(HandlerError::Internal(report)) => Err(ServeError::Handler(report)),
    }
}

/// Synthesized `OPTIONS` response: the allow headers plus an empty plain-text
/// body, or a 404 when no route owns the path.
async fn preflight(
    response: &mut HttpResponse,
    methods: &[Method],
) -> Result<(), HandlerError> {
    if methods.is_empty() {
        return Err(response.abort(StatusCode::NOT_FOUND, BodyValue::Empty).await);
    }
    response.add_header("Access-Control-Allow-Headers", "*");
    let allow = methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(",");
    response.add_header("Access-Control-Allow-Methods", &allow);
    response.add_header("Vary", "Access-Control-Request-Headers");
    response.process(BodyValue::Empty, StatusCode::OK).await?;
    Ok(())
}

/// Concatenate body events in arrival order until the continuation flag
/// drops. When a cap is configured and crossed, the remaining chunks are
/// drained without being kept so the channel stays consistent.
async fn assemble_body(
    source: &mut dyn EventSource,
    limit: Option<usize>,
) -> Result<AssembledBody, TransportError> {
    let mut assembled = BytesMut::new();
    let mut over_limit = false;
    loop {
        match source.next_event().await? {
            InboundEvent::HttpBody { body, more_body } => {
                if !over_limit {
                    assembled.extend_from_slice(&body);
                    if let Some(limit) = limit {
                        if assembled.len() > limit {
                            over_limit = true;
                            assembled.clear();
                        }
                    }
                }
                if !more_body {
                    break;
                }
            }
            other => {
                return Err(TransportError::UnexpectedEvent {
                    context: "assembling the request body",
                    kind: other.kind(),
                });
            }
        }
    }
    if over_limit {
        Ok(AssembledBody::TooLarge)
    } else {
        Ok(AssembledBody::Complete(assembled.freeze()))
    }
}
