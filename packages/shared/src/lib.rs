//! Shared wire protocol for the Formpulse template activity hub.
//!
//! Both the server and the client depend on this crate so that the set of
//! inbound invocations and outbound events is defined exactly once.

pub mod logger;
pub mod protocol;
pub mod time;
