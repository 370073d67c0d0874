//! Coupong CLI
//!
//! Command-line front end for the coupon platform:
//! - Sign up and sign in (the token is kept in a cookie jar file)
//! - List coupon events and claim one
//! - Print or follow the winner leaderboard
//! - Chat in the shared room from stdin

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coupong::api::dto::{CheckCertificationRequest, EmailCertificationRequest, IdCheckRequest};
use coupong::auth::{AuthStep, CookieJar, Session, SignInForm, SignUpForm};
use coupong::chat::message::MessageKind;
use coupong::chat::{ChatEvent, ChatRoom, ChatRoomConfig};
use coupong::config::{generate_default_config, Config};
use coupong::coupon::claim::PROGRESS_MESSAGE;
use coupong::coupon::{ClaimOutcome, ClaimRequest};
use coupong::leaderboard::board::ALL;
use coupong::leaderboard::{Leaderboard, LeaderboardSubscriber, Medal, Selection, StreamEvent};
use coupong::CoupongClient;

#[derive(Parser)]
#[command(name = "coupong")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Claim coupon drops, follow the winners and chat")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Coupon server (overrides the config file)
    #[arg(long, global = true)]
    pub domain: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether an ID is still free
    IdCheck { id: String },

    /// Send the email verification number
    SendMail { id: String, email: String },

    /// Check an email verification number
    Verify {
        id: String,
        email: String,
        certification: String,
    },

    /// Create an account (runs the ID check and verification first)
    SignUp {
        id: String,
        email: String,
        certification: String,
        /// Password; asked for on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in and keep the access token
    SignIn {
        id: String,
        /// Password; asked for on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the access token
    SignOut,

    /// Show the signed-in user
    Whoami,

    /// Admin check (fails for non-admin users)
    Admin,

    /// List coupon events
    Events,

    /// Attempt to claim a coupon
    Claim {
        /// Coupon category, e.g. PIZZA
        category: String,
    },

    /// Show the winner leaderboard
    Leaderboard {
        /// Category to show (default: all)
        #[arg(short, long, default_value = ALL)]
        category: String,
        /// Keep following live updates
        #[arg(short, long)]
        watch: bool,
    },

    /// Join the chat room; each stdin line is a message, EOF or Ctrl-C leaves
    Chat,

    /// Print a default config file
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_default();
    if let Some(domain) = cli.domain.clone() {
        config.server.domain = domain;
    }
    init_logging(&config);

    let client = CoupongClient::new(config.server.endpoints(), config.server.request_timeout())?;
    let jar = || {
        CookieJar::open(&config.data_dir())
            .with_context(|| format!("opening cookie jar in {:?}", config.data_dir()))
    };

    match cli.command {
        Commands::IdCheck { id } => {
            let reply = client.id_check(&IdCheckRequest { id }).await?;
            report(AuthStep::IdCheck, &reply.code)?;
        }

        Commands::SendMail { id, email } => {
            let mut form = SignUpForm::new();
            form.set_id(id);
            form.set_email(email);
            let request: EmailCertificationRequest = form.mail_request()?;
            let reply = client.send_mail(&request).await?;
            report(AuthStep::SendMail, &reply.code)?;
        }

        Commands::Verify {
            id,
            email,
            certification,
        } => {
            let request = CheckCertificationRequest {
                id,
                email,
                certification,
            };
            let reply = client.check_certification(&request).await?;
            report(AuthStep::CheckCertification, &reply.code)?;
        }

        Commands::SignUp {
            id,
            email,
            certification,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            let password_check = prompt("Password again")?;

            let mut form = SignUpForm::new();
            form.set_id(id);
            form.set_password(password);
            form.set_password_check(password_check);
            form.set_email(email);
            form.set_certification(certification);

            if let Some(request) = form.id_check_request() {
                let reply = client.id_check(&request).await?;
                report(AuthStep::IdCheck, &reply.code)?;
                form.mark_id_checked();
            }
            if let Some(request) = form.certification_request() {
                let reply = client.check_certification(&request).await?;
                report(AuthStep::CheckCertification, &reply.code)?;
                form.mark_certified();
            }

            let request = form.submit()?;
            let reply = client.sign_up(&request).await?;
            report(AuthStep::SignUp, &reply.code)?;
        }

        Commands::SignIn { id, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password")?,
            };
            let request = SignInForm::new(id, password).submit()?;
            let mut session = Session::new(&client, jar()?);
            let feedback = session.sign_in(&request).await?;
            println!("{}", feedback.message);
            if !feedback.ok {
                std::process::exit(1);
            }
        }

        Commands::SignOut => {
            let mut session = Session::new(&client, jar()?);
            if session.sign_out()? {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }

        Commands::Whoami => {
            let session = Session::new(&client, jar()?);
            let user = session.current_user().await?;
            println!("{}", user.username);
            if let Some(email) = &user.email {
                println!("  email: {}", email);
            }
            if let Some(role) = &user.role {
                println!("  role:  {}", role);
            }
        }

        Commands::Admin => {
            let session = Session::new(&client, jar()?);
            let user = session.require_admin().await?;
            println!("Administrator: {}", user.username);
        }

        Commands::Events => {
            let listing = client.coupon_events().await?;
            if let Some(message) = listing.empty_message() {
                println!("{}", message);
            }
            for event in listing.events() {
                println!(
                    "{:<10} {:<24} {:<12} {}",
                    event.event_category,
                    event.event_name,
                    event.logo().brand(),
                    event.start_display().unwrap_or_default()
                );
            }
        }

        Commands::Claim { category } => {
            let session = Session::new(&client, jar()?);
            let user = session.current_user().await?;
            let token = session.token().context("session lost its token")?;

            let request = ClaimRequest::new(&category, &user.username, Utc::now().timestamp_millis());
            println!("{}", PROGRESS_MESSAGE);
            let outcome = client.attempt_claim(token, &request).await;
            println!("{}", outcome.message());
            if outcome != ClaimOutcome::Accepted {
                std::process::exit(1);
            }
        }

        Commands::Leaderboard { category, watch } => {
            run_leaderboard(&config, &client, Selection::parse(&category), watch).await?;
        }

        Commands::Chat => {
            let session = Session::new(&client, jar()?);
            let user = session.current_user().await?;
            let api = Arc::new(client.clone());
            run_chat(&config, api, &user.username).await?;
        }

        Commands::Config => {
            print!("{}", generate_default_config());
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("coupong={}", config.logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Print the step's feedback; a failed step ends the command
fn report(step: AuthStep, code: &coupong::ResponseCode) -> Result<()> {
    let feedback = step.feedback(code);
    if !feedback.ok {
        bail!("{}", feedback.message);
    }
    println!("{}", feedback.message);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}

async fn run_leaderboard(
    config: &Config,
    client: &CoupongClient,
    selection: Selection,
    watch: bool,
) -> Result<()> {
    let mut board = Leaderboard::new();
    match client.leaderboard_categories().await {
        Ok(categories) => board.set_categories(categories),
        Err(e) => {
            tracing::warn!(error = %e, "category list failed");
            board.categories_failed();
        }
    }
    board.select(selection.clone());

    for category in board.snapshot_categories() {
        match client.leaderboard_snapshot(&category).await {
            Ok(winners) => board.apply_snapshot(&category, winners),
            Err(e) => {
                tracing::warn!(%category, error = %e, "snapshot failed");
                board.snapshot_failed(&category);
            }
        }
    }
    print_board(&board);
    if !watch {
        return Ok(());
    }

    let subscriber = LeaderboardSubscriber::new(
        config.server.endpoints(),
        Duration::from_secs(config.leaderboard.connect_timeout_secs),
        Duration::from_millis(config.leaderboard.reconnect_delay_ms),
    )?;
    let mut handle = subscriber.subscribe(selection.as_query());

    loop {
        tokio::select! {
            event = handle.next() => {
                let Some(event) = event else { break };
                match event {
                    StreamEvent::Opened => board.stream_opened(),
                    StreamEvent::Update(update) => {
                        if board.apply_update(&update) {
                            println!("*** New winner in {}! ***", update.coupon_category);
                        }
                        print_board(&board);
                    }
                    StreamEvent::Failed(_) => {
                        board.stream_failed();
                        print_board(&board);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    handle.close();
    Ok(())
}

fn print_board(board: &Leaderboard) {
    for category in board.displayed_categories() {
        println!("[{}]", category);
        for (rank, winner) in board.winners(category).iter().enumerate() {
            let medal = Medal::for_rank(rank).map(|m| m.label()).unwrap_or("  ");
            println!("  {:>2}. {} {}", rank + 1, medal, winner.user_id);
        }
    }
    if let Some(message) = board.message() {
        println!("{}", message);
    }
}

async fn run_chat(config: &Config, api: Arc<CoupongClient>, username: &str) -> Result<()> {
    let mut room_config = ChatRoomConfig::new(api.endpoints(), &config.chat.path, username);
    room_config.connect_timeout = Duration::from_secs(config.chat.connect_timeout_secs);
    room_config.shutdown_timeout = Duration::from_millis(config.chat.shutdown_timeout_ms);

    let (room, mut events) = ChatRoom::connect(room_config, api).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(text) => {
                        if let Err(e) = room.send(&text).await {
                            eprintln!("{}", e);
                        }
                    }
                    None => break,
                }
            }
            event = events.recv() => {
                match event {
                    Some(ChatEvent::Message(message)) => match message.kind(room.username()) {
                        MessageKind::Notice => println!("-- {}", message.message),
                        _ => println!("[{}] {}: {}", message.created_date, message.writer, message.message),
                    },
                    Some(ChatEvent::Participants(count)) => println!("-- {} online", count),
                    Some(ChatEvent::ParticipantList(users)) => println!("-- here: {}", users.join(", ")),
                    Some(ChatEvent::BrokerError(message)) => eprintln!("broker error: {}", message),
                    Some(ChatEvent::Disconnected(reason)) => {
                        bail!("chat disconnected: {}", reason.unwrap_or_default());
                    }
                    None => bail!("chat disconnected"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    room.exit().await?;
    Ok(())
}
