//! Response lifecycle state machines.
//!
//! An [`HttpResponse`] accumulates headers and drives one request's outbound
//! frames through start → body, with redirect and abort short-circuits. A
//! [`WsResponder`] is the per-message sending side of an accepted channel.

use bytes::Bytes;
use http::StatusCode;
use std::sync::Arc;

use crate::core::body::BodyValue;
use crate::core::cookie::SetCookie;
use crate::core::handler::HandlerError;
use crate::ports::transport::{FrameSink, MessagePayload, OutboundFrame, TransportError};

/// Per-request outbound state: ordered header list plus the
/// started/processed/redirecting flags.
pub struct HttpResponse {
    sink: Arc<dyn FrameSink>,
    content_type: String,
    charset: String,
    headers: Vec<(Bytes, Bytes)>,
    started: bool,
    processed: bool,
    redirecting: bool,
}

impl HttpResponse {
    /// Build a response bound to one connection's sink. When an allow-origin
    /// value is configured it is seeded as the first header.
    pub fn new(
        sink: Arc<dyn FrameSink>,
        content_type: impl Into<String>,
        charset: impl Into<String>,
        allow_origin: Option<&str>,
    ) -> Self {
        let mut headers = Vec::new();
        if let Some(origin) = allow_origin {
            headers.push((
                Bytes::from_static(b"Access-Control-Allow-Origin"),
                Bytes::copy_from_slice(origin.as_bytes()),
            ));
        }
        Self {
            sink,
            content_type: content_type.into(),
            charset: charset.into(),
            headers,
            started: false,
            processed: false,
            redirecting: false,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// True once the body frame has been emitted.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// True once the header frame has been emitted.
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_redirecting(&self) -> bool {
        self.redirecting
    }

    /// Append a header; duplicate names are permitted and kept in order.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((
            Bytes::copy_from_slice(name.as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        ));
    }

    /// Append a `Set-Cookie` header built from `cookie`.
    pub fn set_cookie(&mut self, cookie: &SetCookie) {
        self.add_header("Set-Cookie", &cookie.render());
    }

    /// Emit the header frame. Synthesizes the `Content-Type` header, with a
    /// charset parameter for the `text/*` and `application/*` families.
    /// Idempotent: the frame goes out exactly once per response.
    pub async fn start(&mut self, status: StatusCode) -> Result<(), TransportError> {
        if self.started {
            return Ok(());
        }
        let content_type = if self.content_type.starts_with("text")
            || self.content_type.starts_with("application")
        {
            format!("{};charset={}", self.content_type, self.charset)
        } else {
            self.content_type.clone()
        };
        self.add_header("Content-Type", &content_type);
        self.started = true;
        self.sink
            .send_frame(OutboundFrame::ResponseStart {
                status,
                headers: self.headers.clone(),
            })
            .await
    }

    /// Serialize `body` and emit the start and body frames. A no-op while
    /// redirecting.
    pub async fn process(&mut self, body: BodyValue, status: StatusCode) -> Result<(), TransportError> {
        if self.redirecting {
            return Ok(());
        }
        self.start(status).await?;
        let payload = self.encode_body(body);
        self.sink
            .send_frame(OutboundFrame::ResponseBody { body: payload })
            .await?;
        self.processed = true;
        Ok(())
    }

    /// Finalize early: emit the frames for `body`/`status`, then hand back
    /// the control-flow value the handler returns to unwind.
    pub async fn abort(&mut self, status: StatusCode, body: BodyValue) -> HandlerError {
        if let Err(error) = self.process(body, status).await {
            return HandlerError::Transport(error);
        }
        HandlerError::Abort(status)
    }

    /// Redirect with status 301.
    pub async fn redirect(&mut self, location: &str) -> Result<(), TransportError> {
        self.redirect_with_status(location, StatusCode::MOVED_PERMANENTLY)
            .await
    }

    /// Enter the redirecting state: add `Location`, emit the header frame and
    /// an empty body frame. Later `process` calls become no-ops; the handler
    /// is expected to return right after.
    pub async fn redirect_with_status(
        &mut self,
        location: &str,
        status: StatusCode,
    ) -> Result<(), TransportError> {
        self.redirecting = true;
        self.add_header("Location", location);
        self.start(status).await?;
        self.sink
            .send_frame(OutboundFrame::ResponseBody { body: Bytes::new() })
            .await?;
        self.processed = true;
        Ok(())
    }

    fn encode_body(&self, body: BodyValue) -> Bytes {
        match body {
            BodyValue::Empty => Bytes::new(),
            BodyValue::Bytes(raw) => raw,
            BodyValue::Text(text) => Bytes::from(text.into_bytes()),
            BodyValue::Json(value) => Bytes::from(value.to_string().into_bytes()),
        }
    }
}

/// The sending side of one accepted WebSocket channel.
pub struct WsResponder {
    sink: Arc<dyn FrameSink>,
    content_type: String,
}

impl WsResponder {
    pub fn new(sink: Arc<dyn FrameSink>, content_type: impl Into<String>) -> Self {
        Self {
            sink,
            content_type: content_type.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Send one message: JSON values go out serialized as text frames, text
    /// as text frames, raw bytes as binary frames.
    pub async fn send(&self, body: BodyValue) -> Result<(), TransportError> {
        let payload = match body {
            BodyValue::Json(value) => MessagePayload::Text(value.to_string()),
            BodyValue::Text(text) => MessagePayload::Text(text),
            BodyValue::Bytes(raw) => MessagePayload::Binary(raw),
            BodyValue::Empty => MessagePayload::Text(String::new()),
        };
        self.sink.send_frame(OutboundFrame::WsSend(payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::channel::ChannelFrameSink;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn response(
        content_type: &str,
        allow_origin: Option<&str>,
    ) -> (HttpResponse, UnboundedReceiver<OutboundFrame>) {
        let (sink, frames) = ChannelFrameSink::unbounded();
        (
            HttpResponse::new(Arc::new(sink), content_type, "UTF-8", allow_origin),
            frames,
        )
    }

    fn header<'a>(headers: &'a [(Bytes, Bytes)], name: &str) -> Option<&'a Bytes> {
        headers
            .iter()
            .find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, value)| value)
    }

    #[tokio::test]
    async fn start_emits_header_frame_exactly_once() {
        let (mut response, mut frames) = response("application/json", None);
        response.start(StatusCode::OK).await.unwrap();
        response.start(StatusCode::IM_A_TEAPOT).await.unwrap();

        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseStart { status, headers } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(
                    header(&headers, "content-type").unwrap(),
                    &Bytes::from_static(b"application/json;charset=UTF-8")
                );
            }
            other => panic!("expected start frame, got {other:?}"),
        }
        assert!(frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_text_content_type_has_no_charset() {
        let (mut response, mut frames) = response("image/png", None);
        response.start(StatusCode::OK).await.unwrap();
        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseStart { headers, .. } => {
                assert_eq!(
                    header(&headers, "content-type").unwrap(),
                    &Bytes::from_static(b"image/png")
                );
            }
            other => panic!("expected start frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn allow_origin_is_seeded_first() {
        let (mut response, mut frames) = response("text/plain", Some("*"));
        response.process(BodyValue::Empty, StatusCode::OK).await.unwrap();
        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseStart { headers, .. } => {
                assert_eq!(headers[0].0, Bytes::from_static(b"Access-Control-Allow-Origin"));
                assert_eq!(headers[0].1, Bytes::from_static(b"*"));
            }
            other => panic!("expected start frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn process_serializes_json_and_marks_processed() {
        let (mut response, mut frames) = response("application/json", None);
        assert!(!response.is_processed());
        response
            .process(
                BodyValue::Json(serde_json::json!({"reponse": "json-response"})),
                StatusCode::OK,
            )
            .await
            .unwrap();
        assert!(response.is_processed());

        let _start = frames.try_recv().unwrap();
        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseBody { body } => {
                let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
                assert_eq!(value, serde_json::json!({"reponse": "json-response"}));
            }
            other => panic!("expected body frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn redirect_emits_location_and_blocks_later_process() {
        let (mut response, mut frames) = response("text/plain", None);
        response.redirect("/target").await.unwrap();
        response
            .process(BodyValue::Text("ignored".to_string()), StatusCode::OK)
            .await
            .unwrap();

        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseStart { status, headers } => {
                assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
                assert_eq!(header(&headers, "location").unwrap(), &Bytes::from_static(b"/target"));
            }
            other => panic!("expected start frame, got {other:?}"),
        }
        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseBody { body } => assert!(body.is_empty()),
            other => panic!("expected empty body frame, got {other:?}"),
        }
        // The ignored process() produced no further frames.
        assert!(frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn abort_finalizes_and_returns_the_control_value() {
        let (mut response, mut frames) = response("application/json", None);
        let signal = response.abort(StatusCode::NOT_FOUND, BodyValue::Empty).await;
        assert!(matches!(signal, HandlerError::Abort(StatusCode::NOT_FOUND)));
        assert!(response.is_processed());

        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseStart { status, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND)
            }
            other => panic!("expected start frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_headers_are_kept_in_order() {
        let (mut response, mut frames) = response("text/plain", None);
        response.add_header("X-Tag", "one");
        response.add_header("X-Tag", "two");
        response.start(StatusCode::OK).await.unwrap();

        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseStart { headers, .. } => {
                let tags: Vec<&Bytes> = headers
                    .iter()
                    .filter(|(name, _)| name.as_ref() == b"X-Tag")
                    .map(|(_, value)| value)
                    .collect();
                assert_eq!(tags, vec![&Bytes::from_static(b"one"), &Bytes::from_static(b"two")]);
            }
            other => panic!("expected start frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_cookie_appends_a_header() {
        let (mut response, mut frames) = response("text/plain", None);
        response.set_cookie(&SetCookie::new("test-cookie", "12345-cookie"));
        response.start(StatusCode::OK).await.unwrap();

        match frames.try_recv().unwrap() {
            OutboundFrame::ResponseStart { headers, .. } => {
                assert_eq!(
                    header(&headers, "set-cookie").unwrap(),
                    &Bytes::from_static(b"test-cookie=12345-cookie")
                );
            }
            other => panic!("expected start frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ws_responder_frames_by_payload_kind() {
        let (sink, mut frames) = ChannelFrameSink::unbounded();
        let responder = WsResponder::new(Arc::new(sink), "application/json");

        responder
            .send(BodyValue::Json(serde_json::json!({"ok": true})))
            .await
            .unwrap();
        responder.send(BodyValue::Bytes(Bytes::from_static(b"\x01"))).await.unwrap();

        match frames.try_recv().unwrap() {
            OutboundFrame::WsSend(MessagePayload::Text(text)) => {
                assert_eq!(
                    serde_json::from_str::<serde_json::Value>(&text).unwrap(),
                    serde_json::json!({"ok": true})
                );
            }
            other => panic!("expected text frame, got {other:?}"),
        }
        match frames.try_recv().unwrap() {
            OutboundFrame::WsSend(MessagePayload::Binary(raw)) => {
                assert_eq!(raw, Bytes::from_static(b"\x01"))
            }
            other => panic!("expected binary frame, got {other:?}"),
        }
    }
}
