//! Cookie parsing and rendering.
//!
//! The request side parses the `Cookie` header with morsel semantics:
//! attribute tokens (`Max-Age=345`, `Secure`, ...) attach to the cookie that
//! precedes them. The response side is a small builder that renders one
//! `Set-Cookie` header value.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Attribute names recognized as belonging to the preceding cookie rather
/// than starting a new one.
const COOKIE_ATTRIBUTES: &[&str] = &[
    "expires",
    "path",
    "comment",
    "domain",
    "max-age",
    "secure",
    "httponly",
    "version",
    "samesite",
    "partitioned",
];

/// One cookie from a request `Cookie` header, with its trailing attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookie {
    pub value: String,
    attrs: Vec<(String, String)>,
}

impl RequestCookie {
    /// Look up an attribute by name, case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl std::ops::Index<&str> for RequestCookie {
    type Output = str;

    /// Attribute lookup; panics when the attribute is absent, like map
    /// indexing does.
    fn index(&self, name: &str) -> &str {
        match self.attr(name) {
            Some(value) => value,
            None => panic!("no cookie attribute named {name:?}"),
        }
    }
}

/// Parse one `Cookie` header value into `jar`, merging with whatever is
/// already there.
pub fn parse_cookie_header(raw: &str, jar: &mut HashMap<String, RequestCookie>) {
    let mut current: Option<String> = None;
    for token in raw.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (token, ""),
        };
        let lowered = key.to_ascii_lowercase();
        if COOKIE_ATTRIBUTES.contains(&lowered.as_str()) {
            if let Some(name) = &current {
                if let Some(cookie) = jar.get_mut(name) {
                    cookie.attrs.push((lowered, value.to_string()));
                }
            }
            continue;
        }
        jar.insert(
            key.to_string(),
            RequestCookie {
                value: value.to_string(),
                attrs: Vec::new(),
            },
        );
        current = Some(key.to_string());
    }
}

/// Builder for one outbound `Set-Cookie` header value.
///
/// `expires` takes precedence over `max_age` when both are set. Extra
/// attributes render with their first letter capitalized; flags render bare.
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: String,
    value: String,
    expires: Option<DateTime<Utc>>,
    max_age: Option<i64>,
    attrs: Vec<(String, Option<String>)>,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            max_age: None,
            attrs: Vec::new(),
        }
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Add a valued attribute, e.g. `attr("path", "/")` renders `; Path=/`.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), Some(value.into())));
        self
    }

    /// Add a boolean attribute, e.g. `flag("secure")` renders `; Secure`.
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.attrs.push((name.into(), None));
        self
    }

    /// Render the full header value.
    pub fn render(&self) -> String {
        let mut rendered = format!("{}={}", self.name, self.value);
        if let Some(at) = self.expires {
            rendered.push_str("; Expires=");
            rendered.push_str(&at.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        } else if let Some(seconds) = self.max_age {
            rendered.push_str("; Max-Age=");
            rendered.push_str(&seconds.to_string());
        }
        for (name, value) in &self.attrs {
            rendered.push_str("; ");
            rendered.push_str(&capitalize_first(name));
            if let Some(value) = value {
                rendered.push('=');
                rendered.push_str(value);
            }
        }
        rendered
    }
}

fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
