//! In-memory implementations of the domain's collaborator traits.

mod auth;
mod store;

pub use auth::StaticTokenVerifier;
pub use store::{InMemoryAccessPolicy, InMemoryCommentStore, InMemoryLikeStore, UserDirectory};
