//! MindCare CLI
//!
//! Terminal front-end for the MindCare platform:
//! - Sign in, register and manage the stored session
//! - Chat with the assistant, interactively or one message at a time
//! - Edit the profile and raise support requests
//! - Moderate users and tickets from an admin account

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mindcare::admin::AdminConsole;
use mindcare::api::{AccessToken, ApiClient, ApiError, ProfileUpdate};
use mindcare::app::{self, Page};
use mindcare::auth::{AuthSession, FileCredentialStore, Registration};
use mindcare::chat::{ChatApi, ChatError, ChatView};
use mindcare::config::{generate_default_config, Config, LoggingConfig};
use mindcare::profile::{self, ProfileView};
use mindcare::types::{Message, Priority, Sender, SessionId, SupportRequest, User};

#[derive(Parser)]
#[command(name = "mindcare")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MindCare mental-health support client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend URL (overrides the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: Format,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
    },

    /// Sign out and forget the stored token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Interactive chat
    Chat,

    /// List chat sessions
    Sessions,

    /// Show a session's messages
    History { session_id: String },

    /// Send one message
    Send {
        text: String,
        /// Continue this session instead of starting a new one
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Profile details and password
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Support requests
    #[command(subcommand)]
    Ticket(TicketCommand),

    /// Moderation (admin accounts only)
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    /// Update name, email or phone; omitted fields keep their value
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change the account password
    Password,
}

#[derive(Subcommand)]
enum TicketCommand {
    Create {
        title: String,
        description: String,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
    },
    List,
}

#[derive(Subcommand)]
enum AdminCommand {
    Users {
        /// Filter by name or email
        #[arg(short, long)]
        search: Option<String>,
    },
    Block { user_id: u64 },
    Unblock { user_id: u64 },
    Delete {
        user_id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    Tickets,
    Resolve { request_id: u64 },
    Stats,
    Sessions,
    Transcript { session_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, skipped) = match &cli.config {
        Some(path) => (Config::load_with_env(path)?, Vec::new()),
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging)?;
    for e in &skipped {
        eprintln!("warning: {}, using defaults", e);
    }

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let client = ApiClient::new(config.client_config())?;
    let mut auth = AuthSession::new(Box::new(FileCredentialStore::new(config.token_path())));
    auth.restore(&client).await;

    run(cli.command, cli.format, &client, &mut auth).await
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mindcare={}", config.level).into());

    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
    Ok(())
}

async fn run(
    command: Commands,
    format: Format,
    client: &ApiClient,
    auth: &mut AuthSession,
) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            let email = match email {
                Some(email) => email,
                None => prompt("Email")?,
            };
            let password = match password {
                Some(password) => password,
                None => prompt("Password")?,
            };
            match auth.login(client, &email, &password).await {
                Ok(user) => println!("Welcome back, {}!", user.display_name()),
                Err(e) => bail!(e.login_message()),
            }
        }

        Commands::Register { name, email } => {
            let form = Registration {
                name,
                email,
                password: prompt("Password")?,
                confirm_password: prompt("Confirm password")?,
            };
            match auth.register(client, &form).await {
                Ok(user) => println!("Account created. Welcome, {}!", user.display_name()),
                Err(e) => bail!(e.register_message()),
            }
        }

        Commands::Logout => {
            auth.logout()?;
            println!("Signed out.");
        }

        Commands::Whoami => {
            let user = signed_in(auth)?;
            emit(format, user, print_user)?;
        }

        Commands::Chat => {
            let token = page_token(auth, Page::Chat)?;
            interactive_chat(client, &token).await?;
        }

        Commands::Sessions => {
            let token = page_token(auth, Page::Chat)?;
            let sessions = client.list_sessions(&token).await?;
            emit(format, &sessions, |sessions| {
                if sessions.is_empty() {
                    println!("No conversations yet. Start one with `mindcare chat`.");
                    return;
                }
                println!("{:<38} {:<17} {}", "ID", "Updated", "Title");
                println!("{}", "-".repeat(80));
                for s in sessions {
                    println!(
                        "{:<38} {:<17} {}",
                        s.session_id,
                        s.last_updated
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        s.title.as_deref().unwrap_or("New Conversation")
                    );
                }
            })?;
        }

        Commands::History { session_id } => {
            let token = page_token(auth, Page::Chat)?;
            let messages = client.history(&token, &session_id).await?;
            emit(format, &messages, |messages| print_messages(messages))?;
        }

        Commands::Send { text, session } => {
            let token = page_token(auth, Page::Chat)?;
            let mut view = ChatView::new();
            match session {
                Some(id) => {
                    view.load_sessions(client, &token).await?;
                    view.select(client, &token, &SessionId::persisted(id)).await?;
                }
                None => {
                    view.new_chat();
                }
            }

            let reply = view.send_message(client, &token, &text).await?.clone();
            if format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                if let Some(session) = view.active() {
                    println!("[{}] {}", session.id, session.title);
                }
                print_message(&reply);
            }
        }

        Commands::Profile(command) => {
            let token = page_token(auth, Page::Profile)?;
            let mut view = ProfileView::new();
            match command {
                ProfileCommand::Show => {
                    let user = signed_in(auth)?;
                    emit(format, user, print_user)?;
                }
                ProfileCommand::Edit { name, email, phone } => {
                    let user = signed_in(auth)?;
                    let update = ProfileUpdate {
                        full_name: name.unwrap_or_else(|| user.name.clone()),
                        email: email.unwrap_or_else(|| user.email.clone()),
                        phone: phone.or_else(|| user.phone.clone()),
                    };
                    view.edit_profile(client, auth, update).await?;
                    println!("Profile updated.");
                }
                ProfileCommand::Password => {
                    let old = prompt("Current password")?;
                    let new = prompt("New password")?;
                    if new != prompt("Confirm new password")? {
                        bail!("Passwords do not match");
                    }
                    view.change_password(client, &token, &old, &new).await?;
                    println!("Password changed.");
                }
            }
        }

        Commands::Ticket(command) => {
            let token = page_token(auth, Page::Profile)?;
            let mut view = ProfileView::new();
            match command {
                TicketCommand::Create {
                    title,
                    description,
                    priority,
                } => {
                    let ticket = view
                        .submit_ticket(client, &token, &title, &description, priority)
                        .await?;
                    emit(format, ticket, |t| {
                        println!("Support request #{} created ({}).", t.id, t.status)
                    })?;
                }
                TicketCommand::List => {
                    let tickets = view.load_tickets(client, &token).await?;
                    emit(format, tickets, print_tickets)?;
                }
            }
        }

        Commands::Admin(command) => {
            let token = page_token(auth, Page::Admin)?;
            admin(command, format, client, &token).await?;
        }

        Commands::Config { .. } => unreachable!("handled before the client is built"),
    }

    Ok(())
}

async fn admin(
    command: AdminCommand,
    format: Format,
    client: &ApiClient,
    token: &AccessToken,
) -> anyhow::Result<()> {
    let mut console = AdminConsole::new();

    if let AdminCommand::Transcript { session_id } = &command {
        let messages = console.open_transcript(client, token, session_id).await?;
        return emit(format, messages, print_messages);
    }

    if console.refresh(client, token).await.is_err() {
        bail!(console.alert().unwrap_or("Failed to load admin data.").to_string());
    }

    let outcome = match command {
        AdminCommand::Users { search } => {
            let users = console.filtered_users(search.as_deref().unwrap_or(""));
            return emit(format, &users, |users| {
                println!(
                    "{:<6} {:<22} {:<28} {:<10} {}",
                    "ID", "Name", "Email", "Status", "Sessions"
                );
                println!("{}", "-".repeat(76));
                for u in users {
                    println!(
                        "{:<6} {:<22} {:<28} {:<10} {}",
                        u.id, u.name, u.email, u.status, u.sessions
                    );
                }
            });
        }
        AdminCommand::Tickets => {
            let counts = console.ticket_counts();
            return emit(format, console.tickets(), |tickets| {
                print_tickets(tickets);
                println!();
                println!(
                    "Open: {}  In progress: {}  Resolved: {}",
                    counts.open, counts.in_progress, counts.resolved
                );
            });
        }
        AdminCommand::Stats => {
            return emit(format, console.stats(), |s| {
                println!("Total users:        {}", s.total_users);
                println!("Active sessions:    {}", s.active_sessions);
                println!("Avg response time:  {}", s.avg_response_time);
                println!("User satisfaction:  {}", s.user_satisfaction);
            });
        }
        AdminCommand::Sessions => {
            return emit(format, console.chat_sessions(), |sessions| {
                println!("{:<38} {:<8} {}", "ID", "User", "Title");
                println!("{}", "-".repeat(80));
                for s in sessions {
                    println!(
                        "{:<38} {:<8} {}",
                        s.session_id,
                        s.user_id.map(|id| id.to_string()).unwrap_or_default(),
                        s.title.as_deref().unwrap_or("New Conversation")
                    );
                }
            });
        }
        AdminCommand::Block { user_id } => console
            .block_user(client, token, user_id)
            .await
            .map(|_| format!("User {} blocked.", user_id)),
        AdminCommand::Unblock { user_id } => console
            .unblock_user(client, token, user_id)
            .await
            .map(|_| format!("User {} unblocked.", user_id)),
        AdminCommand::Delete { user_id, yes } => {
            let name = console
                .users()
                .iter()
                .find(|u| u.id == user_id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| format!("#{}", user_id));
            if !yes && !confirm(&format!("Delete user {}? This cannot be undone.", name))? {
                println!("Cancelled.");
                return Ok(());
            }
            console
                .delete_user(client, token, user_id)
                .await
                .map(|_| format!("User {} deleted.", name))
        }
        AdminCommand::Resolve { request_id } => console
            .resolve_request(client, token, request_id)
            .await
            .map(|_| format!("Support request #{} resolved.", request_id)),
        AdminCommand::Transcript { .. } => unreachable!("handled above"),
    };

    match outcome {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(e) => match console.alert() {
            Some(alert) => bail!(alert.to_string()),
            None => Err(e.into()),
        },
    }
}

async fn interactive_chat(client: &ApiClient, token: &AccessToken) -> anyhow::Result<()> {
    let mut view = ChatView::new();
    if let Err(e) = view.load_sessions(client, token).await {
        eprintln!("Could not load your conversations: {}", e);
    }
    if view.active_id().is_none() {
        view.new_chat();
    }

    println!("MindCare chat. Commands: /new /sessions /switch <n> /history /quit");
    print_session_header(&view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let line = line.trim();

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            ("", _) => continue,
            ("/quit", _) | ("/exit", _) => break,
            ("/new", _) => {
                view.new_chat();
                print_session_header(&view);
            }
            ("/sessions", _) => {
                for (i, s) in view.sessions().iter().enumerate() {
                    let marker = if Some(&s.id) == view.active_id() { "*" } else { " " };
                    println!("{} {:>2}. {}", marker, i + 1, s.title);
                }
            }
            ("/switch", arg) => {
                let id = arg
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| view.sessions().get(i))
                    .map(|s| s.id.clone());
                match id {
                    Some(id) => match view.select(client, token, &id).await {
                        Ok(()) => {
                            print_session_header(&view);
                            print_messages(view.messages());
                        }
                        Err(e) => eprintln!("Could not open that conversation: {}", e),
                    },
                    None => eprintln!("Usage: /switch <n> (see /sessions)"),
                }
            }
            ("/history", _) => print_messages(view.messages()),
            _ => {
                println!("(typing...)");
                match view.send_message(client, token, line).await {
                    Ok(reply) => print_message(reply),
                    Err(ChatError::Api(e)) => eprintln!("{}", send_failure(&e)),
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }

    Ok(())
}

fn send_failure(error: &ApiError) -> &'static str {
    match error {
        e if e.is_auth_failure() => "Your session has expired. Please sign in again.",
        ApiError::Timeout | ApiError::Unreachable => {
            "Message not delivered: MindCare is unreachable. Try again."
        }
        _ => "Message not delivered. Please try again.",
    }
}

/// The signed-in user, or the sign-in hint
fn signed_in(auth: &AuthSession) -> anyhow::Result<&User> {
    match auth.user() {
        Some(user) => Ok(user),
        None => bail!(ApiError::NotAuthenticated.login_message()),
    }
}

/// Token for a command on `page`, refusing pages the user cannot reach
fn page_token(auth: &AuthSession, page: Page) -> anyhow::Result<AccessToken> {
    match app::resolve(page, auth.user()) {
        Page::Login | Page::Register => bail!(ApiError::NotAuthenticated.login_message()),
        resolved if resolved != page => {
            bail!("The {} page is not available for this account (try `{}`).", page, resolved)
        }
        _ => Ok(auth.token()?.clone()),
    }
}

fn emit<T: Serialize + ?Sized>(
    format: Format,
    value: &T,
    table: impl FnOnce(&T),
) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Table => table(value),
    }
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_user(user: &User) {
    for (label, value) in profile::summary(user) {
        println!("{:<12} {}", format!("{}:", label), value);
    }
}

fn print_session_header(view: &ChatView) {
    if let Some(session) = view.active() {
        println!("--- {} ---", session.title);
    }
}

fn print_message(message: &Message) {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Assistant => "MindCare",
    };
    match &message.emotion {
        Some(emotion) if message.sender == Sender::Assistant => println!(
            "[{}] {} ({}): {}",
            message.timestamp.format("%H:%M"),
            who,
            emotion,
            message.content
        ),
        _ => println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M"),
            who,
            message.content
        ),
    }
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("No messages yet.");
    }
    for message in messages {
        print_message(message);
    }
}

fn print_tickets(tickets: &[SupportRequest]) {
    if tickets.is_empty() {
        println!("No support requests.");
        return;
    }
    println!("{:<6} {:<12} {:<8} {}", "ID", "Status", "Priority", "Title");
    println!("{}", "-".repeat(60));
    for t in tickets {
        println!("{:<6} {:<12} {:<8} {}", t.id, t.status, t.priority, t.title);
    }
}
