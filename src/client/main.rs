/**
 * nutrisync command-line client
 *
 * Runs one session against the configured remote authority (or local
 * state only) and performs a single presence or chat operation.
 */
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use nutrisync::client::local_store::{JsonFileStore, LocalStateStore};
use nutrisync::client::{Config, Session};
use nutrisync::shared::presence::generate_user_id;
use nutrisync::shared::{
    AppConfig, AvatarView, ChatMessage, IdentityInput, MessageDraft, MessageKind, PresencePatch,
    StateEvent,
};

#[derive(Parser)]
#[command(
    name = "nutrisync-client",
    version,
    about = "Presence and chat sync for the nutrition planner"
)]
struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show sync status, visible roster and chat log
    Status,
    /// Establish the local identity and announce it
    Join {
        /// User id; generated when omitted
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Update the local identity's profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Post a chat message as the local identity
    Say { text: String },
    /// Flip presence on or off
    Toggle,
    /// Print state changes as they happen
    Watch {
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            Config::with_builder(Config::env_builder(AppConfig::builder_from_toml(path)?))?
        }
        None => Config::new(),
    };

    let data_dir = config.data_dir();
    tracing::debug!("Local state directory: {}", data_dir.display());
    let store = LocalStateStore::new(JsonFileStore::new(data_dir));
    let session = Session::start(config, store).await;

    let result = run(&session, cli.command).await;
    session.shutdown().await;
    result
}

async fn run(session: &Session, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Status => print_state(session).await,
        Command::Join { id, name, avatar } => {
            let mut input = IdentityInput::new(id.unwrap_or_else(generate_user_id), name);
            if let Some(avatar) = avatar {
                input = input.with_avatar(avatar);
            }
            let entry = session.presence().initialize(input).await;
            println!("joined as {} ({})", entry.display_name, entry.id);
        }
        Command::Profile { name, avatar } => {
            let mut patch = PresencePatch::default();
            if let Some(name) = name {
                patch = patch.display_name(name);
            }
            if let Some(avatar) = avatar {
                patch = patch.avatar_ref(avatar);
            }
            match session.presence().update_current(patch).await {
                Some(entry) => println!("profile updated: {}", entry.display_name),
                None => return Err("no identity yet; run `join` first".into()),
            }
        }
        Command::Say { text } => {
            let Some(identity) = session.presence().current().await else {
                return Err("no identity yet; run `join` first".into());
            };
            let draft = MessageDraft::text(identity.id, identity.display_name, text)
                .with_avatar(identity.avatar_ref);
            let msg = session.chat().append(draft).await;
            print_message(&msg);
        }
        Command::Toggle => {
            let enabled = session.presence().toggle().await;
            println!("presence {}", if enabled { "on" } else { "off" });
        }
        Command::Watch { seconds } => watch(session, Duration::from_secs(seconds)).await,
    }
    Ok(())
}

async fn watch(session: &Session, duration: Duration) {
    let mut events = session.state().subscribe();
    print_state(session).await;

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(StateEvent::RosterChanged(_)) => print_roster(session).await,
                Ok(StateEvent::MessagesChanged(_)) => print_messages(session).await,
                Ok(StateEvent::SyncEnabledChanged(_)) => println!("status: {}", session.status()),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} state events", skipped);
                    print_state(session).await;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

async fn print_state(session: &Session) {
    println!("status: {}", session.status());
    let presence = if session.presence().is_enabled().await { "on" } else { "off" };
    match session.presence().current().await {
        Some(identity) => println!(
            "identity: {} ({}), presence {}",
            identity.display_name, identity.id, presence
        ),
        None => println!("identity: none"),
    }
    print_roster(session).await;
    print_messages(session).await;
}

async fn print_roster(session: &Session) {
    let visible = session.state().visible_roster().await;
    println!("online ({}):", visible.len());
    for entry in visible {
        let avatar = match AvatarView::classify(&entry.avatar_ref) {
            AvatarView::None => "",
            AvatarView::UrlRef(_) => " [avatar]",
            AvatarView::InlineMarkup(_) => " [inline avatar]",
        };
        println!("  {}{}", entry.display_name, avatar);
    }
}

async fn print_messages(session: &Session) {
    for msg in session.chat().messages().await {
        print_message(&msg);
    }
}

fn print_message(msg: &ChatMessage) {
    let time = msg.timestamp.format("%H:%M");
    match msg.kind {
        MessageKind::System => println!("[{}] * {}", time, msg.body),
        MessageKind::Text => println!("[{}] {}: {}", time, msg.author_name, msg.body),
    }
}
