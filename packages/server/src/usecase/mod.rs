//! One usecase per inbound hub operation.
//!
//! Each usecase validates the caller against the hub's connection state,
//! talks to the backing collaborators, and turns the result into ack and
//! broadcast events. The WebSocket handler converts any `Err` into a single
//! `Error` event to the invoking connection.

mod add_comment;
mod error;
mod get_activity;
mod join_template;
mod leave_template;
mod toggle_like;

pub use add_comment::AddCommentUseCase;
pub use error::HubOperationError;
pub use get_activity::GetTemplateActivityUseCase;
pub use join_template::JoinTemplateUseCase;
pub use leave_template::LeaveTemplateUseCase;
pub use toggle_like::ToggleLikeUseCase;
