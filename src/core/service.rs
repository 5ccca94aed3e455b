//! The application service: configuration plus both route tables.
//!
//! An [`App`] is built and populated during startup, then frozen behind an
//! `Arc` and shared with the per-connection adapters. Registration needs
//! `&mut self` and serving holds only `&self`, so the
//! registration-happens-before-serving invariant is enforced by the type
//! system rather than by a runtime check.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::handler::{HttpHandler, WsHandler};
use crate::core::router::{HttpRouteTable, RouteDef, RouteError, WsRouteDef, WsRouteTable};

/// Central object owning the startup configuration and the read-only route
/// tables for the serving lifetime.
pub struct App {
    config: AppConfig,
    http_routes: HttpRouteTable,
    ws_routes: WsRouteTable,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            http_routes: HttpRouteTable::new(),
            ws_routes: WsRouteTable::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register one HTTP route.
    pub fn route(&mut self, def: RouteDef, handler: Arc<dyn HttpHandler>) -> Result<(), RouteError> {
        self.http_routes.register(def, handler)
    }

    /// Register one WebSocket channel.
    pub fn ws_route(&mut self, def: WsRouteDef, handler: Arc<dyn WsHandler>) -> Result<(), RouteError> {
        self.ws_routes.register(def, handler)
    }

    pub fn http_routes(&self) -> &HttpRouteTable {
        &self.http_routes
    }

    pub fn ws_routes(&self) -> &WsRouteTable {
        &self.ws_routes
    }
}
