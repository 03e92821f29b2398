//! HTTP and WebSocket request handlers.

mod http;
mod websocket;

pub use http::{health_check, hub_stats};
pub use websocket::websocket_handler;
