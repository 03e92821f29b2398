//! Reconnecting client for the template activity hub.
//!
//! [`HubClient`] owns the WebSocket session, the typed event subscriptions
//! and the reconnection supervisor; [`TemplateActivityClient`] layers
//! template-watching semantics on top of it.

pub mod activity;
pub mod backoff;
pub mod error;
pub mod formatter;
pub mod hub_client;
pub mod subscription;

pub use activity::TemplateActivityClient;
pub use backoff::ReconnectPolicy;
pub use error::ClientError;
pub use hub_client::{ConnectionState, HubClient};
pub use subscription::{HandlerRegistry, Subscription};
