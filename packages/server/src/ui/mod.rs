//! HTTP/WebSocket surface.

mod handler;
mod server;
mod signal;
mod state;

pub use server::Server;
pub use state::AppState;
