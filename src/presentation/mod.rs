//! Presentation Layer
//!
//! HTTP routes, handlers, middleware, and the WebSocket sync endpoint.

pub mod http;
pub mod middleware;
pub mod websocket;
