use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use santa_room::{
    backend::Backend,
    config::ClientConfig,
    confirm::ConfirmationClient,
    error::RoomError,
    link::{ConfirmationLink, ConfirmationLinkHandler},
    lobby::{normalize_room_code, Lobby},
    session::RoomSession,
    types::{Notice, NoticeLevel, RoomSnapshot},
};

#[derive(Parser)]
#[command(name = "santa-room", version, about = "Secret Santa room client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new room
    Create,
    /// Check that a room exists
    Join { code: String },
    /// Follow a room's roster and draw state until interrupted
    Watch { code: String },
    /// Register a participant; a verification email follows
    Register {
        code: String,
        name: String,
        email: String,
    },
    /// Run the draw for a room
    Draw { code: String },
    /// Re-send the assignment emails of the last draw
    ResendDraw { code: String },
    /// Redeem a confirmation link from an email
    Open { link: String },
}

fn show(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => tracing::info!("{}", notice.message),
        NoticeLevel::Error => tracing::error!("{}", notice.message),
    }
}

fn show_error(error: &RoomError, fallback: &str) -> ExitCode {
    show(&Notice::error(error.user_message(fallback)));
    ExitCode::FAILURE
}

fn log_snapshot(snapshot: &RoomSnapshot) {
    let names: Vec<&str> = snapshot
        .participants
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    tracing::info!(
        "Room {}: {} verified [{}], draw {:?}, draw available: {}",
        snapshot.room_code,
        snapshot.verified_count(),
        names.join(", "),
        snapshot.draw,
        snapshot.draw_available()
    );
}

/// Open a room session and wait for its first refresh
async fn open_session(backend: Arc<dyn Backend>, config: &ClientConfig, code: &str) -> RoomSession {
    let session = RoomSession::enter(backend, config, normalize_room_code(code));
    let mut rx = session.subscribe();
    let first_load = async {
        while !rx.borrow_and_update().loaded {
            if rx.changed().await.is_err() {
                break;
            }
        }
    };
    if tokio::time::timeout(config.request_timeout, first_load)
        .await
        .is_err()
    {
        tracing::warn!(
            "Room {} not loaded after {:?}, continuing with empty roster",
            session.room_code(),
            config.request_timeout
        );
    }
    session
}

async fn watch(session: RoomSession) -> ExitCode {
    tracing::info!("Invite link: {}", session.invite_link());
    let mut rx = session.subscribe();
    log_snapshot(&rx.borrow_and_update());

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                log_snapshot(&rx.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Leaving room {}", session.room_code());
                break;
            }
        }
    }

    session.leave();
    ExitCode::SUCCESS
}

async fn run(command: Command, config: &ClientConfig, backend: Arc<dyn Backend>) -> ExitCode {
    match command {
        Command::Create => match Lobby::new(backend).create_room().await {
            Ok((navigation, notice)) => {
                show(&notice);
                tracing::info!("Go to {}", navigation.path());
                ExitCode::SUCCESS
            }
            Err(e) => show_error(&e, "Failed to create room"),
        },
        Command::Join { code } => match Lobby::new(backend).join_room(&code).await {
            Ok(navigation) => {
                tracing::info!("Go to {}", navigation.path());
                ExitCode::SUCCESS
            }
            Err(e) => show_error(&e, "Room not found"),
        },
        Command::Watch { code } => {
            let session = RoomSession::enter(backend, config, normalize_room_code(&code));
            watch(session).await
        }
        Command::Register { code, name, email } => {
            let session = open_session(backend, config, &code).await;
            let result = session.membership().register(&name, &email).await;
            let code = match result {
                Ok(registration) => {
                    show(&registration.notice);
                    log_snapshot(&session.snapshot());
                    ExitCode::SUCCESS
                }
                Err(e) => show_error(&e, "Registration failed"),
            };
            session.leave();
            code
        }
        Command::Draw { code } => {
            let session = open_session(backend, config, &code).await;
            let result = session.draw().run_draw().await;
            let code = match result {
                Ok(notice) => {
                    show(&notice);
                    log_snapshot(&session.snapshot());
                    ExitCode::SUCCESS
                }
                Err(e) => show_error(&e, "Draw failed"),
            };
            session.leave();
            code
        }
        Command::ResendDraw { code } => {
            let session = open_session(backend, config, &code).await;
            let result = session.draw().resend_notification().await;
            let code = match result {
                Ok(notice) => {
                    show(&notice);
                    ExitCode::SUCCESS
                }
                Err(e) => show_error(&e, "Resend failed"),
            };
            session.leave();
            code
        }
        Command::Open { link } => {
            let link = match ConfirmationLink::parse(&link) {
                Ok(link) => link,
                Err(e) => return show_error(&e, "Invalid link"),
            };
            let handler = ConfirmationLinkHandler::new(ConfirmationClient::new(backend));
            let outcome = handler.handle(link).await;
            show(&outcome.notice);
            tokio::time::sleep(outcome.redirect_after).await;
            tracing::info!("Go to {}", outcome.navigate_to.path());
            if outcome.result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "santa_room=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    let backend: Arc<dyn Backend> = match config.build_backend() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::error!("Failed to set up backend client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("Using backend at {}", config.api_url);

    run(cli.command, &config, backend).await
}
