//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::domain::IdentityVerifier;
use crate::hub::TemplateHub;
use crate::usecase::{
    AddCommentUseCase, GetTemplateActivityUseCase, JoinTemplateUseCase, LeaveTemplateUseCase,
    ToggleLikeUseCase,
};

use super::{
    handler::{health_check, hub_stats, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Template activity hub server.
///
/// Holds the wired application state and exposes both a standalone runner and
/// a bare [`Router`] for in-process testing.
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hub: Arc<TemplateHub>,
        verifier: Arc<dyn IdentityVerifier>,
        join_template_usecase: Arc<JoinTemplateUseCase>,
        leave_template_usecase: Arc<LeaveTemplateUseCase>,
        add_comment_usecase: Arc<AddCommentUseCase>,
        toggle_like_usecase: Arc<ToggleLikeUseCase>,
        get_activity_usecase: Arc<GetTemplateActivityUseCase>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                hub,
                verifier,
                join_template_usecase,
                leave_template_usecase,
                add_comment_usecase,
                toggle_like_usecase,
                get_activity_usecase,
            }),
        }
    }

    /// Build the router without binding a listener.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket endpoint
            .route("/hub", get(websocket_handler))
            // HTTP endpoints
            .route("/api/health", get(health_check))
            .route("/api/stats", get(hub_stats))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the hub server until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Template activity hub listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/hub", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
