//! Configuration data structures.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files.
//! They are intentionally serde-friendly and include defaults so that a
//! minimal config, or none at all, remains valid.

use serde::{Deserialize, Serialize};

/// Startup configuration for one application instance.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Content type applied when a route carries no override
    pub content_type: String,
    /// Charset advertised in synthesized Content-Type headers
    pub charset: String,
    /// Value for the pre-seeded Access-Control-Allow-Origin header; absent
    /// disables the header entirely
    pub allow_origin: Option<String>,
    /// Upper bound on an assembled request body in bytes; absent means
    /// unbounded
    pub max_body_bytes: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            charset: "UTF-8".to_string(),
            allow_origin: None,
            max_body_bytes: None,
        }
    }
}
