//! Template activity hub server.
//!
//! Fans comment, like and presence events out to every viewer watching the
//! same form template over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin formpulse-server
//! cargo run --bin formpulse-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use uuid::Uuid;

use formpulse_server::{
    hub::TemplateHub,
    infrastructure::{
        InMemoryAccessPolicy, InMemoryCommentStore, InMemoryLikeStore, StaticTokenVerifier,
        UserDirectory,
    },
    ui::Server,
    usecase::{
        AddCommentUseCase, GetTemplateActivityUseCase, JoinTemplateUseCase, LeaveTemplateUseCase,
        ToggleLikeUseCase,
    },
};
use formpulse_shared::{logger::setup_logger, protocol::Identity};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Template activity hub server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Development tokens accepted at the handshake, as token:username pairs
    #[arg(long = "dev-token", value_name = "TOKEN:USERNAME")]
    dev_tokens: Vec<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Stores and verifier
    // 2. Hub
    // 3. UseCases
    // 4. Server

    // 1. Create the backing stores (in-memory) and the handshake verifier
    let users = UserDirectory::new();
    let mut verifier = StaticTokenVerifier::new();
    for pair in &args.dev_tokens {
        let Some((token, user_name)) = pair.split_once(':') else {
            tracing::error!("Invalid --dev-token '{}', expected TOKEN:USERNAME", pair);
            std::process::exit(2);
        };
        let user_id = Uuid::new_v4();
        users.insert(user_id, user_name);
        verifier = verifier.with_token(
            token,
            Identity {
                user_id,
                user_name: user_name.to_string(),
            },
        );
        tracing::info!("Registered dev token for user '{}'", user_name);
    }
    let verifier = Arc::new(verifier);
    let access = Arc::new(InMemoryAccessPolicy::allow_all());
    let comments = Arc::new(InMemoryCommentStore::new(users.clone()));
    let likes = Arc::new(InMemoryLikeStore::new(users));

    // 2. Create the hub
    let hub = Arc::new(TemplateHub::new());

    // 3. Create UseCases
    let join_template_usecase = Arc::new(JoinTemplateUseCase::new(hub.clone(), access.clone()));
    let leave_template_usecase = Arc::new(LeaveTemplateUseCase::new(hub.clone()));
    let add_comment_usecase = Arc::new(AddCommentUseCase::new(hub.clone(), comments.clone()));
    let toggle_like_usecase = Arc::new(ToggleLikeUseCase::new(hub.clone(), likes.clone()));
    let get_activity_usecase = Arc::new(GetTemplateActivityUseCase::new(
        hub.clone(),
        access,
        comments,
        likes,
    ));

    // 4. Create and run the server
    let server = Server::new(
        hub,
        verifier,
        join_template_usecase,
        leave_template_usecase,
        add_comment_usecase,
        toggle_like_usecase,
        get_activity_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
