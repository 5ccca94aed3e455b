//! Shared driver for integration tests: runs one HTTP request through the
//! protocol adapter over the in-memory channel transport and collects the
//! emitted frames.

#![allow(dead_code)]

use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode};
use std::sync::Arc;

use synapse::adapters::{ChannelEventSource, ChannelFrameSink, ProtocolAdapter};
use synapse::core::App;
use synapse::ports::transport::{ConnectionScope, HttpScope, InboundEvent, OutboundFrame};

pub struct HttpExchange {
    pub status: StatusCode,
    pub headers: Vec<(Bytes, Bytes)>,
    pub body: Bytes,
}

impl HttpExchange {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, value)| String::from_utf8_lossy(value).into_owned())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }
}

/// Run one request whose body arrives in a single event.
pub async fn perform(
    app: Arc<App>,
    method: Method,
    path: &str,
    query: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> HttpExchange {
    perform_chunked(
        app,
        method,
        path,
        query,
        headers,
        vec![Bytes::copy_from_slice(body)],
    )
    .await
}

/// Run one request whose body arrives as a sequence of chunked events.
/// A content-length header is added when the caller did not provide one.
pub async fn perform_chunked(
    app: Arc<App>,
    method: Method,
    path: &str,
    query: &str,
    headers: &[(&str, &str)],
    chunks: Vec<Bytes>,
) -> HttpExchange {
    let total: usize = chunks.iter().map(Bytes::len).sum();
    let mut header_pairs: Vec<(Bytes, Bytes)> = headers
        .iter()
        .map(|(name, value)| {
            (
                Bytes::copy_from_slice(name.as_bytes()),
                Bytes::copy_from_slice(value.as_bytes()),
            )
        })
        .collect();
    if !headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("content-length"))
    {
        header_pairs.push((
            Bytes::from_static(b"content-length"),
            Bytes::from(total.to_string().into_bytes()),
        ));
    }

    let scope = HttpScope {
        path: path.to_string(),
        method,
        headers: header_pairs,
        query_string: Bytes::copy_from_slice(query.as_bytes()),
    };

    let (events, mut source) = ChannelEventSource::with_capacity(chunks.len() + 1);
    let (sink, mut frames) = ChannelFrameSink::unbounded();

    if chunks.is_empty() {
        events
            .send(InboundEvent::HttpBody {
                body: Bytes::new(),
                more_body: false,
            })
            .await
            .expect("event buffer full");
    } else {
        let count = chunks.len();
        for (index, chunk) in chunks.into_iter().enumerate() {
            events
                .send(InboundEvent::HttpBody {
                    body: chunk,
                    more_body: index + 1 < count,
                })
                .await
                .expect("event buffer full");
        }
    }

    ProtocolAdapter::new(app)
        .handle_connection(ConnectionScope::Http(scope), &mut source, Arc::new(sink))
        .await
        .expect("connection handling failed");

    let mut status = None;
    let mut response_headers = Vec::new();
    let mut body = BytesMut::new();
    while let Ok(frame) = frames.try_recv() {
        match frame {
            OutboundFrame::ResponseStart {
                status: frame_status,
                headers: frame_headers,
            } => {
                assert!(status.is_none(), "second response start frame");
                status = Some(frame_status);
                response_headers = frame_headers;
            }
            OutboundFrame::ResponseBody { body: frame_body } => {
                body.extend_from_slice(&frame_body)
            }
            other => panic!("unexpected frame on an HTTP connection: {other:?}"),
        }
    }

    HttpExchange {
        status: status.expect("no response start frame emitted"),
        headers: response_headers,
        body: body.freeze(),
    }
}
