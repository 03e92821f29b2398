//! In-memory backing stores.

mod memory;

pub use memory::{InMemoryAccessPolicy, InMemoryCommentStore, InMemoryLikeStore, UserDirectory};
