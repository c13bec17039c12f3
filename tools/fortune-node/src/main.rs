//! Fortune ledger node.
//!
//! Reads chat messages from stdin, one per line, routes the ones addressed to
//! the bot through the fortune service and prints replies on stdout. Logs go
//! to stderr. A line is either `author: message text` or a JSON object
//! `{"author": "...", "is_bot": false, "content": "..."}`.

mod courier;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fortune_common::store::JsonFileStore;
use fortune_common::{defaults, FortuneLedger, ParticipantId};
use fortune_router::listing::{DEFAULT_ROWS_PER_PAGE, DEFAULT_ROW_WIDTH};
use fortune_router::{ChatMessage, CommandSyntax, FortuneService};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::courier::StdoutCourier;
use crate::render::ListingShape;

#[derive(Parser)]
#[command(name = "fortune-node", about = "Shared fortune pool driven by chat commands")]
struct Cli {
    /// Directory holding the fortune and participant collections
    /// (default: <data dir>/fortune).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Prefix that addresses the bot.
    #[arg(long, default_value = "!")]
    prefix: String,

    /// Command word following the prefix.
    #[arg(long, default_value = "fortune")]
    command: String,

    /// File of default fortunes separated by `===`, used the first time the
    /// store is opened.
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Fortune IDs per listing row.
    #[arg(long, default_value_t = DEFAULT_ROW_WIDTH)]
    row_width: usize,

    /// Listing rows per page.
    #[arg(long, default_value_t = DEFAULT_ROWS_PER_PAGE)]
    page_size_rows: usize,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("fortune"))
        .unwrap_or_else(|| PathBuf::from("fortune-data"))
}

/// Parse one stdin line into a chat message. Blank or malformed lines are
/// skipped.
fn parse_line(line: &str) -> Option<ChatMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('{') {
        return match serde_json::from_str(line) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(error = %e, "Skipping malformed JSON message");
                None
            }
        };
    }
    let (author, content) = line.split_once(':')?;
    let author = ParticipantId::new(author).ok()?;
    Some(ChatMessage {
        author,
        is_bot: false,
        content: content.trim().to_string(),
    })
}

fn say(to: &ParticipantId, text: &str) {
    println!("[reply -> {to}]\n{text}");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let store = JsonFileStore::open(&data_dir)
        .with_context(|| format!("opening store at {}", data_dir.display()))?;

    let seed = match &cli.defaults {
        Some(path) => defaults::read(path)
            .with_context(|| format!("reading default fortunes from {}", path.display()))?,
        None => Vec::new(),
    };

    let mut rng = StdRng::from_entropy();
    let ledger = FortuneLedger::load_or_seed(store, &seed, &mut rng)?;
    let service = FortuneService::with_rng(ledger, StdoutCourier, rng);
    let syntax = CommandSyntax::new(cli.prefix, cli.command);
    let shape = ListingShape {
        row_width: cli.row_width,
        rows_per_page: cli.page_size_rows,
    };

    info!(
        "{} v{} ready (data: {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        data_dir.display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(message) = parse_line(&line) else {
            continue;
        };
        let request = match syntax.parse(&message) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                say(&message.author, &e.user_message());
                continue;
            }
        };
        match service.handle(&message.author, request).await {
            Ok(response) => say(&message.author, &render::reply(&response, shape)),
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Storage failure, shutting down");
                return Err(e.into());
            }
            Err(e) => say(&message.author, &e.user_message()),
        }
    }

    info!("Input closed, exiting");
    Ok(())
}
