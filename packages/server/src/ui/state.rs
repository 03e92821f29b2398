//! Shared application state for request handlers.

use std::sync::Arc;

use crate::domain::IdentityVerifier;
use crate::hub::TemplateHub;
use crate::usecase::{
    AddCommentUseCase, GetTemplateActivityUseCase, JoinTemplateUseCase, LeaveTemplateUseCase,
    ToggleLikeUseCase,
};

/// Everything a handler needs: the hub itself, the handshake verifier and one
/// usecase per inbound operation.
pub struct AppState {
    pub hub: Arc<TemplateHub>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub join_template_usecase: Arc<JoinTemplateUseCase>,
    pub leave_template_usecase: Arc<LeaveTemplateUseCase>,
    pub add_comment_usecase: Arc<AddCommentUseCase>,
    pub toggle_like_usecase: Arc<ToggleLikeUseCase>,
    pub get_activity_usecase: Arc<GetTemplateActivityUseCase>,
}
