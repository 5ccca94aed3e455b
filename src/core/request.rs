//! Immutable request views with lazy, memoized accessors.
//!
//! One [`HttpRequest`] wraps a connection scope plus the fully assembled body;
//! one [`WsRequest`] wraps the shared session scope plus a single message.
//! Derived views (query parameters, headers, cookies, decoded body) are
//! computed on first access, cached, and always returned as owned copies so a
//! caller mutating a returned map cannot corrupt the cache.

use bytes::Bytes;
use http::Method;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::body::{FormMap, MessageData, RequestData};
use crate::core::cookie::{self, RequestCookie};
use crate::ports::transport::{HttpScope, MessagePayload, WsScope};

/// Error produced while interpreting a payload according to its declared
/// content type. Carries the underlying cause where one exists.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// The body declared JSON but did not parse as JSON.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The content-length header was absent or not a number.
    #[error("missing or invalid content-length header")]
    ContentLength,

    /// A multipart body was structurally broken.
    #[error("malformed multipart payload: {0}")]
    Multipart(&'static str),

    /// A text payload was not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
}

/// One HTTP request: scope plus the assembled body.
pub struct HttpRequest {
    scope: HttpScope,
    body: Bytes,
    query_params: OnceCell<FormMap>,
    headers: OnceCell<HashMap<String, String>>,
    cookies: OnceCell<HashMap<String, RequestCookie>>,
    data: OnceCell<RequestData>,
}

impl HttpRequest {
    pub fn new(scope: HttpScope, body: Bytes) -> Self {
        Self {
            scope,
            body,
            query_params: OnceCell::new(),
            headers: OnceCell::new(),
            cookies: OnceCell::new(),
            data: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.scope.path
    }

    pub fn method(&self) -> &Method {
        &self.scope.method
    }

    /// Decoded query parameters, repeated keys collapsed into sequences.
    pub fn query_params(&self) -> FormMap {
        self.query_params
            .get_or_init(|| parse_form_encoded(&self.scope.query_string))
            .clone()
    }

    /// Header map keyed by the names as received (case preserved, not
    /// normalized; matching on a fixed casing is the caller's business).
    /// The `Cookie` header is excluded; see [`HttpRequest::cookies`].
    pub fn headers(&self) -> HashMap<String, String> {
        self.headers
            .get_or_init(|| {
                let mut map = HashMap::new();
                for (name, value) in &self.scope.headers {
                    if name.as_ref().eq_ignore_ascii_case(b"cookie") {
                        continue;
                    }
                    map.insert(
                        String::from_utf8_lossy(name).into_owned(),
                        String::from_utf8_lossy(value).into_owned(),
                    );
                }
                map
            })
            .clone()
    }

    /// Cookies from the `Cookie` header(s), with their attributes.
    pub fn cookies(&self) -> HashMap<String, RequestCookie> {
        self.cookies
            .get_or_init(|| {
                let mut jar = HashMap::new();
                for (name, value) in &self.scope.headers {
                    if name.as_ref().eq_ignore_ascii_case(b"cookie") {
                        cookie::parse_cookie_header(&String::from_utf8_lossy(value), &mut jar);
                    }
                }
                jar
            })
            .clone()
    }

    /// The body decoded according to content-length and content-type.
    ///
    /// Successful decodes are memoized; a failing decode is re-reported on
    /// every call.
    pub fn data(&self) -> Result<RequestData, DecodeError> {
        if let Some(cached) = self.data.get() {
            return Ok(cached.clone());
        }
        let decoded = self.decode_body()?;
        Ok(self.data.get_or_init(|| decoded).clone())
    }

    fn header_value(&self, name: &str) -> Option<String> {
        self.scope
            .headers
            .iter()
            .find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, value)| String::from_utf8_lossy(value).into_owned())
    }

    fn decode_body(&self) -> Result<RequestData, DecodeError> {
        let length: usize = self
            .header_value("content-length")
            .and_then(|value| value.trim().parse().ok())
            .ok_or(DecodeError::ContentLength)?;
        if length == 0 {
            return Ok(RequestData::Json(serde_json::Value::Object(
                serde_json::Map::new(),
            )));
        }
        let content_type = self.header_value("content-type").unwrap_or_default();
        if content_type.starts_with("application/json") {
            Ok(RequestData::Json(serde_json::from_slice(&self.body)?))
        } else if content_type == "application/x-www-form-urlencoded" {
            Ok(RequestData::Form(parse_form_encoded(&self.body)))
        } else if content_type.starts_with("multipart/form-data") {
            Ok(RequestData::Multipart(parse_multipart(
                &content_type,
                &self.body,
            )?))
        } else {
            Ok(RequestData::Raw(self.body.clone()))
        }
    }
}

/// One WebSocket message viewed as a request.
pub struct WsRequest {
    scope: Arc<WsScope>,
    payload: MessagePayload,
    content_type: String,
    query_params: OnceCell<FormMap>,
    headers: OnceCell<HashMap<String, String>>,
    data: OnceCell<MessageData>,
}

impl WsRequest {
    pub fn new(scope: Arc<WsScope>, payload: MessagePayload, content_type: impl Into<String>) -> Self {
        Self {
            scope,
            payload,
            content_type: content_type.into(),
            query_params: OnceCell::new(),
            headers: OnceCell::new(),
            data: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.scope.path
    }

    /// The raw message payload as handed over by the transport.
    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    pub fn query_params(&self) -> FormMap {
        self.query_params
            .get_or_init(|| parse_form_encoded(&self.scope.query_string))
            .clone()
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.headers
            .get_or_init(|| {
                self.scope
                    .headers
                    .iter()
                    .map(|(name, value)| {
                        (
                            String::from_utf8_lossy(name).into_owned(),
                            String::from_utf8_lossy(value).into_owned(),
                        )
                    })
                    .collect()
            })
            .clone()
    }

    /// The message decoded against the channel's effective content type.
    pub fn data(&self) -> Result<MessageData, DecodeError> {
        if let Some(cached) = self.data.get() {
            return Ok(cached.clone());
        }
        let decoded = if self.content_type.starts_with("application/json") {
            MessageData::Json(match &self.payload {
                MessagePayload::Text(text) => serde_json::from_str(text)?,
                MessagePayload::Binary(bytes) => serde_json::from_slice(bytes)?,
            })
        } else {
            MessageData::Text(match &self.payload {
                MessagePayload::Text(text) => text.clone(),
                MessagePayload::Binary(bytes) => std::str::from_utf8(bytes)?.to_string(),
            })
        };
        Ok(self.data.get_or_init(|| decoded).clone())
    }
}

/// Decode `key=value&key=value` input, collapsing repeated keys.
pub(crate) fn parse_form_encoded(raw: &[u8]) -> FormMap {
    let mut map = FormMap::new();
    if raw.is_empty() {
        return map;
    }
    let text = String::from_utf8_lossy(raw);
    for item in text.split('&') {
        if item.is_empty() {
            continue;
        }
        let (key, value) = item.split_once('=').unwrap_or((item, ""));
        map.insert(percent_decode(key), percent_decode(value));
    }
    map
}

fn percent_decode(component: &str) -> String {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| component.to_string())
}

/// Minimal multipart/form-data parser: each part's declared name maps to its
/// raw payload bytes. Nested multiparts and content-transfer encodings are
/// not interpreted.
fn parse_multipart(content_type: &str, body: &[u8]) -> Result<HashMap<String, Bytes>, DecodeError> {
    let boundary = content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|raw| raw.trim_matches('"'))
        .ok_or(DecodeError::Multipart("missing boundary parameter"))?;
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = HashMap::new();
    let start = find(body, delimiter).ok_or(DecodeError::Multipart("boundary not found"))?;
    let mut rest = &body[start + delimiter.len()..];
    loop {
        if rest.starts_with(b"--") {
            break;
        }
        let section_start = strip_line_break(rest);
        let Some(end) = find(section_start, delimiter) else {
            break;
        };
        let section = &section_start[..end];
        rest = &section_start[end + delimiter.len()..];

        let (head, payload) = split_once_bytes(section, b"\r\n\r\n")
            .or_else(|| split_once_bytes(section, b"\n\n"))
            .ok_or(DecodeError::Multipart("part headers not terminated"))?;
        let head = String::from_utf8_lossy(head);
        let name = head
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with("content-disposition"))
            .and_then(disposition_name)
            .ok_or(DecodeError::Multipart("part has no declared name"))?;
        parts.insert(name, Bytes::copy_from_slice(trim_line_break(payload)));
    }
    Ok(parts)
}

fn disposition_name(line: &str) -> Option<String> {
    line.split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("name="))
        .map(|value| value.trim_matches('"').to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split_once_bytes<'a>(input: &'a [u8], separator: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    let at = find(input, separator)?;
    Some((&input[..at], &input[at + separator.len()..]))
}

fn strip_line_break(input: &[u8]) -> &[u8] {
    if let Some(stripped) = input.strip_prefix(b"\r\n") {
        stripped
    } else if let Some(stripped) = input.strip_prefix(b"\n") {
        stripped
    } else {
        input
    }
}

fn trim_line_break(input: &[u8]) -> &[u8] {
    if let Some(trimmed) = input.strip_suffix(b"\r\n") {
        trimmed
    } else if let Some(trimmed) = input.strip_suffix(b"\n") {
        trimmed
    } else {
        input
    }
}
