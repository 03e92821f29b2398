//! Interactive template activity client.
//!
//! Connects to a hub server, watches one template at a time and shows its
//! comment/like/presence events live. Plain input is sent as a comment;
//! slash commands switch templates.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin formpulse-client -- --access-token alice-token
//! cargo run --bin formpulse-client -- -u ws://127.0.0.1:8080/hub
//! ```

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use uuid::Uuid;

use formpulse_client::{
    HubClient, TemplateActivityClient,
    formatter::{EventFormatter, redisplay_prompt},
};
use formpulse_shared::logger::setup_logger;
use formpulse_shared::protocol::ClientInvocation;

const PROMPT_NAME: &str = "formpulse";

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Interactive client for the template activity hub", long_about = None)]
struct Args {
    /// WebSocket hub URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/hub")]
    url: String,

    /// Access token for an authenticated connection; omit to watch anonymously
    #[arg(short = 't', long)]
    access_token: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let hub = HubClient::new(&args.url, args.access_token.as_deref());
    let activity = TemplateActivityClient::new(hub.clone());

    register_display_handlers(&hub);

    // membership is not restored by the transport; rejoin on reconnect
    let rejoin = activity.clone();
    hub.on_reconnected(move || {
        if let Some(template_id) = rejoin.last_watched() {
            if let Err(e) = rejoin
                .hub()
                .invoke(&ClientInvocation::JoinTemplateGroup { template_id })
            {
                tracing::warn!("Failed to rejoin template after reconnect: {}", e);
            }
        }
    });

    if !hub.connect().await {
        tracing::error!("Could not connect to {}. Exiting.", args.url);
        std::process::exit(1);
    }

    println!(
        "\nConnected to {}. Commands: /join <template-id>, /leave, /like, /activity, /quit.",
        args.url
    );
    println!("Anything else is sent as a comment to the watched template.\n");

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", PROMPT_NAME);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        if line == "/quit" {
            break;
        }
        if let Err(e) = run_command(&activity, &line) {
            eprintln!("! {}", e);
        }
        redisplay_prompt(PROMPT_NAME);
    }

    hub.disconnect();
    tracing::info!("Client exiting");
}

fn register_display_handlers(hub: &HubClient) {
    hub.on_connected(|event| {
        print!("{}", EventFormatter::format_connected(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_joined_template(|event| {
        print!("{}", EventFormatter::format_joined(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_user_joined(|event| {
        print!("{}", EventFormatter::format_user_joined(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_user_left(|event| {
        print!("{}", EventFormatter::format_user_left(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_new_comment(|event| {
        print!("{}", EventFormatter::format_new_comment(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_comment_added(|event| {
        print!("{}", EventFormatter::format_comment_added(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_like_toggled(|event| {
        print!("{}", EventFormatter::format_like_toggled(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_template_activity(|event| {
        print!("{}", EventFormatter::format_activity(event));
        redisplay_prompt(PROMPT_NAME);
    });
    hub.on_error(|event| {
        print!("{}", EventFormatter::format_error(event));
        redisplay_prompt(PROMPT_NAME);
    });
}

fn run_command(activity: &TemplateActivityClient, line: &str) -> Result<(), String> {
    match line.split_once(' ') {
        Some(("/join", raw_id)) => {
            let template_id = Uuid::parse_str(raw_id.trim())
                .map_err(|_| format!("'{}' is not a template id", raw_id.trim()))?;
            activity.join_template(template_id).map_err(|e| e.to_string())
        }
        _ if line == "/leave" => activity.leave_template().map_err(|e| e.to_string()),
        _ if line == "/like" => activity.toggle_like().map_err(|e| e.to_string()),
        _ if line == "/activity" => {
            let template_id = activity
                .last_watched()
                .ok_or("join a template first: /join <template-id>")?;
            activity
                .get_template_activity(template_id)
                .map_err(|e| e.to_string())
        }
        _ if line.starts_with('/') => Err(format!("unknown command '{}'", line)),
        _ => activity.add_comment(line).map_err(|e| e.to_string()),
    }
}
