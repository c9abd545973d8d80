//! Chat Curator - feedback and dataset curation for a support chatbot
//!
//! Command-line driver for the admin dashboard (rating, improvement review,
//! export) and the visitor chat session.

mod client;
mod config;
mod dashboard;
mod export;
mod media;
mod model;
mod runtime;
mod session;
mod state_machine;
mod store;

use clap::{Args, Parser, Subcommand};
use client::{Backend, HttpBackend, LoggingBackend};
use config::ClientConfig;
use dashboard::AdminDashboard;
use media::{CssVideoDetector, MediaDetector};
use model::{Conversation, Message, MessageRef, Sender};
use session::{ChatSession, SessionError};
use state_machine::{Notification, Verdict};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type StdinLines = Lines<BufReader<Stdin>>;

#[derive(Parser, Debug)]
#[command(name = "chat-curator", version, about = "Review chatbot replies and export curated conversations")]
struct Cli {
    /// Backend base URL [default: $CHAT_API_BASE_URL or http://localhost:8000]
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds, 0 disables [default: $CHAT_REQUEST_TIMEOUT_SECS or 60]
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Directory for export files [default: $CHAT_EXPORT_DIR or .]
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "CHAT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List conversations
    List,
    /// Show one conversation's messages
    Show { conversation: String },
    /// Rate a bot reply as helpful
    RateUp(MessageArgs),
    /// Rate a bot reply as unhelpful and review the improved reply
    Feedback {
        #[command(flatten)]
        target: MessageArgs,
        /// Why the reply was not helpful (prompted for when omitted)
        #[arg(long)]
        text: Option<String>,
        /// Accept the improved reply without prompting
        #[arg(long, conflicts_with = "reject")]
        accept: bool,
        /// Reject the improved reply, excluding the conversation from export
        #[arg(long)]
        reject: bool,
    },
    /// Export non-excluded conversations as JSONL
    Export {
        /// Date used in the file name [default: today]
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Print to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Chat with the bot as a visitor
    Chat,
}

#[derive(Args, Debug)]
struct MessageArgs {
    conversation: String,
    /// Message id
    #[arg(long, required_unless_present = "index", conflicts_with = "index")]
    message_id: Option<String>,
    /// Zero-based message position, for messages without an id
    #[arg(long)]
    index: Option<usize>,
}

impl MessageArgs {
    fn message_ref(&self) -> MessageRef {
        match (&self.message_id, self.index) {
            (Some(id), _) => MessageRef::ById(id.clone()),
            (None, index) => MessageRef::ByPosition {
                conversation_id: self.conversation.clone(),
                index: index.unwrap_or_default(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Configuration: environment first, flags override
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout = (secs > 0).then_some(std::time::Duration::from_secs(secs));
    }
    if let Some(dir) = cli.export_dir {
        config.export_dir = dir;
    }
    tracing::debug!(base_url = %config.base_url, timeout = ?config.request_timeout, "Client configured");

    let http: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config)?);
    let backend: Arc<dyn Backend> = Arc::new(LoggingBackend::new(http));

    match cli.command {
        Command::List => {
            let mut dashboard = AdminDashboard::new(backend);
            dashboard.load().await?;
            if dashboard.store().is_empty() {
                println!("No conversations");
                return Ok(());
            }
            for conversation in dashboard.store().conversations() {
                print_summary(conversation);
            }
            println!(
                "\n{} of {} conversations will be exported",
                dashboard.exportable_count(),
                dashboard.store().conversations().len()
            );
        }
        Command::Show { conversation } => {
            let mut dashboard = AdminDashboard::new(backend);
            dashboard.load().await?;
            match dashboard.select(&conversation).await? {
                Some(selected) if selected.id == conversation => print_conversation(&selected),
                _ => eprintln!("Conversation {conversation} not found"),
            }
        }
        Command::RateUp(target) => {
            let mut dashboard = AdminDashboard::new(backend);
            dashboard.load().await?;
            dashboard.select(&target.conversation).await?;
            print_notes(&dashboard.rate(target.message_ref(), Verdict::Up).await?);
        }
        Command::Feedback {
            target,
            text,
            accept,
            reject,
        } => {
            let mut dashboard = AdminDashboard::new(backend);
            dashboard.load().await?;
            dashboard.select(&target.conversation).await?;
            dashboard.rate(target.message_ref(), Verdict::Down).await?;

            let mut input = BufReader::new(tokio::io::stdin()).lines();
            let text = match text {
                Some(text) => text,
                None => prompt(&mut input, "Why wasn't the response helpful? ").await?,
            };
            print_notes(&dashboard.submit_feedback(&text).await?);

            let Some(proposal) = dashboard.workflow_state().proposal().cloned() else {
                return Ok(());
            };
            println!("Original:\n{}\n", proposal.original);
            println!("Improved:\n{}\n", proposal.improved);

            let decision = if accept {
                Some(true)
            } else if reject {
                Some(false)
            } else {
                let answer = prompt(
                    &mut input,
                    "Accept the improved response? [y]es / [n]o / anything else to dismiss: ",
                )
                .await?;
                match answer.trim() {
                    "y" | "yes" => Some(true),
                    "n" | "no" => Some(false),
                    _ => None,
                }
            };
            let notes = match decision {
                Some(accept) => dashboard.resolve_improvement(accept).await?,
                None => dashboard.dismiss_improvement().await?,
            };
            print_notes(&notes);
        }
        Command::Export { date, stdout } => {
            let mut dashboard = AdminDashboard::new(backend);
            dashboard.load().await?;
            if stdout {
                println!("{}", dashboard.export_jsonl()?);
            } else {
                let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                let summary = dashboard.export_to(&config.export_dir, date)?;
                println!("{}", summary.message());
                println!("{}", summary.path.display());
            }
        }
        Command::Chat => run_chat(backend).await?,
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chat_curator=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run_chat(backend: Arc<dyn Backend>) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ChatSession::new(backend);
    let (_, messages) = session.start().await?;
    if let Some(id) = session.conversation_id() {
        println!("Live chat ({id}), /quit to leave\n");
    }
    for message in &messages {
        print_chat_message(message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }
        match session.send(&line).await {
            Ok(reply) => {
                print_chat_message(&reply);
                let last = session.messages().len() - 1;
                for (_, video) in session.attachments().into_iter().filter(|(i, _)| *i == last) {
                    println!("  [video] {} ({})", video.title, video.duration);
                }
            }
            Err(SessionError::EmptyMessage) => {}
            Err(e) => eprintln!("error: {e}"),
        }
    }
    Ok(())
}

async fn prompt(input: &mut StdinLines, question: &str) -> Result<String, std::io::Error> {
    print!("{question}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.unwrap_or_default())
}

fn print_notes(notes: &[Notification]) {
    for note in notes {
        if note.is_error() {
            eprintln!("error: {note}");
        } else {
            println!("{note}");
        }
    }
}

fn print_summary(conversation: &Conversation) {
    let flag = if conversation.is_negative { " [excluded]" } else { "" };
    println!(
        "{}  {}  {} messages{}  {}",
        conversation.id,
        conversation.created_at.format("%Y-%m-%d %H:%M"),
        conversation.message_count(),
        flag,
        conversation.preview()
    );
}

fn print_conversation(conversation: &Conversation) {
    print_summary(conversation);
    println!();
    for (index, message) in conversation.messages.iter().enumerate() {
        let id = message.id.as_deref().unwrap_or("-");
        let mut marks = Vec::new();
        if let Some(rating) = message.rating {
            marks.push(rating.to_string());
        }
        if message.is_improved {
            marks.push("improved".to_string());
        }
        let marks = if marks.is_empty() {
            String::new()
        } else {
            format!(" ({})", marks.join(", "))
        };
        println!("[{index}] {} {id}{marks}", sender_label(message.sender));
        println!("    {}", message.content);
        if let Some(feedback) = &message.feedback {
            println!("    feedback: {feedback}");
        }
        if let Some(video) = CssVideoDetector.detect(message) {
            println!("    [video] {} ({})", video.title, video.duration);
        }
    }
}

fn print_chat_message(message: &Message) {
    println!("{}: {}", sender_label(message.sender), message.content);
}

fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    }
}
