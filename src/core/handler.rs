//! Handler traits and the error taxonomy they return through.

use async_trait::async_trait;
use http::StatusCode;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::core::body::BodyValue;
use crate::core::request::{DecodeError, HttpRequest, WsRequest};
use crate::core::response::{HttpResponse, WsResponder};
use crate::ports::transport::TransportError;

/// A boxed future borrowing its inputs, the shape plain-function handlers
/// return.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a handler invocation can surface.
///
/// `Abort` is not a failure: it marks a response that was finalized early via
/// [`HttpResponse::abort`] and tells the adapter to skip its default
/// finalization. Everything else is a real error with its own disposition at
/// the adapter boundary.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The response was already finalized with this status.
    #[error("response aborted with status {0}")]
    Abort(StatusCode),

    /// Reading the request body failed; the adapter converts this to a 400.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The duplex channel failed underneath the response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A programmer error inside the handler; propagates out of the
    /// connection's handling, never swallowed.
    #[error("{0}")]
    Internal(eyre::Report),
}

impl From<eyre::Report> for HandlerError {
    fn from(report: eyre::Report) -> Self {
        HandlerError::Internal(report)
    }
}

/// What an HTTP handler produces: a body for the adapter to finalize with,
/// unless the response was finalized explicitly along the way.
pub type HandlerResult = Result<BodyValue, HandlerError>;

/// An HTTP request handler.
///
/// Invoked once per request with the captured pattern arguments. The returned
/// body is auto-processed with status 200 if the handler did not finalize the
/// response itself.
#[async_trait]
pub trait HttpHandler: Send + Sync {
    async fn handle(
        &self,
        request: &HttpRequest,
        response: &mut HttpResponse,
        args: &[String],
    ) -> HandlerResult;
}

#[async_trait]
impl<F> HttpHandler for F
where
    F: for<'a> Fn(&'a HttpRequest, &'a mut HttpResponse, &'a [String]) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    async fn handle(
        &self,
        request: &HttpRequest,
        response: &mut HttpResponse,
        args: &[String],
    ) -> HandlerResult {
        (self)(request, response, args).await
    }
}

/// A WebSocket message trigger.
///
/// Invoked once per inbound message on an accepted channel; replies go out
/// through the responder, so there is no return body.
#[async_trait]
pub trait WsHandler: Send + Sync {
    async fn on_message(
        &self,
        request: &WsRequest,
        responder: &WsResponder,
        args: &[String],
    ) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F> WsHandler for F
where
    F: for<'a> Fn(&'a WsRequest, &'a WsResponder, &'a [String]) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync,
{
    async fn on_message(
        &self,
        request: &WsRequest,
        responder: &WsResponder,
        args: &[String],
    ) -> Result<(), HandlerError> {
        (self)(request, responder, args).await
    }
}
