//! Template activity hub server.
//!
//! A per-template pub/sub channel over WebSocket: clients join the group of
//! the template they are viewing and receive comment and like events from
//! everyone else watching the same template.
//!
//! Layers follow the usual split: `domain` holds value objects and the
//! collaborator traits, `hub` owns the in-memory routing tables, `usecase`
//! implements one hub operation per struct, `infrastructure` provides
//! in-memory collaborator implementations, and `ui` is the axum surface.

pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
