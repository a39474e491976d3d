//! Huddle chat client binary.
//!
//! # Usage
//!
//! ```bash
//! # List rooms, optionally for one domain
//! huddle rooms --domain rust
//!
//! # Print the last messages of room 3
//! huddle history 3
//!
//! # Post to room 3
//! huddle --token "$TOKEN" send 3 anyone hiring?
//!
//! # Interactive session, opening room 3
//! huddle --token "$TOKEN" chat --room 3
//! ```

use std::{io::Write, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use huddle_app::{ChatEvent, Runtime};
use huddle_cli::{FileConfig, LineDriver, Settings, commands};
use huddle_client::HttpChatApi;
use huddle_core::{Credential, MemorySession, RoomId, SessionStore};
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Huddle chat client
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Chat rooms of the Huddle job portal")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "HUDDLE_CONFIG")]
    config: Option<PathBuf>,

    /// Backend origin, e.g. https://jobs.example.com
    #[arg(long, global = true, env = "HUDDLE_API_URL")]
    api_url: Option<String>,

    /// Bearer token of the signed-in user
    #[arg(long, global = true, env = "HUDDLE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List chat rooms
    Rooms {
        /// Only rooms of this domain
        #[arg(long)]
        domain: Option<String>,
    },
    /// Print the recent history of a room
    History {
        /// Room id
        room: u64,
    },
    /// Post a message to a room
    Send {
        /// Room id
        room: u64,
        /// Message text
        #[arg(required = true, num_args = 1..)]
        body: Vec<String>,
    },
    /// Open an interactive session
    Chat {
        /// Room to open; defaults to the first listed room
        #[arg(long)]
        room: Option<u64>,
        /// Only rooms of this domain
        #[arg(long)]
        domain: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let mut settings = Settings::resolve(file, args.api_url, args.token);
    tracing::debug!(
        api = %settings.client.api_root(),
        signed_in = settings.token.is_some(),
        "settings resolved"
    );

    let session: Arc<dyn SessionStore> =
        Arc::new(MemorySession::with_credential(settings.token.clone().map(Credential::bearer)));
    let api = HttpChatApi::new(&settings.client, Arc::clone(&session))?;

    match args.command {
        Command::Rooms { domain } => {
            let domain = domain.or(settings.chat.domain);
            commands::rooms(&api, domain.as_deref(), &mut std::io::stdout().lock()).await?;
        },
        Command::History { room } => {
            commands::history(&api, RoomId(room), &mut std::io::stdout().lock()).await?;
        },
        Command::Send { room, body } => {
            let body = body.join(" ");
            commands::send(&api, RoomId(room), &body, &mut std::io::stdout().lock()).await?;
        },
        Command::Chat { room, domain } => {
            if domain.is_some() {
                settings.chat.domain = domain;
            }
            let mut out = std::io::stdout();
            writeln!(out, "connected to {}, type /help for commands", settings.client.base_url)?;

            let driver = LineDriver::new(BufReader::new(tokio::io::stdin()), out)
                .with_initial(ChatEvent::RouteChanged(room.map(RoomId)));
            Runtime::new(driver, Arc::new(api), settings.chat)
                .with_session_store(&*session)
                .run()
                .await?;
        },
    }

    Ok(())
}
