//! Headless sketchroom client: health checks, document access, and a live
//! room participant built on the `canvas` sync core.

mod api;
mod live;

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use frames::ProjectDocument;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("missing token; pass --token or set SKETCHROOM_TOKEN")]
    MissingToken,
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("server answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("websocket failed: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for `{0}`")]
    Timeout(&'static str),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("cannot read {path}: {source}")]
    Input { path: String, source: io::Error },
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }
}

#[derive(Parser, Debug)]
#[command(name = "sketchroom-cli", about = "sketchroom HTTP and live-room client")]
struct Cli {
    #[arg(long, env = "SKETCHROOM_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Session token (or the user id when the server runs with AUTH_MODE=dev).
    #[arg(long, env = "SKETCHROOM_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Document(DocumentCommand),
    /// Join a room and print presence and canvas events as they arrive.
    Watch(WatchArgs),
    /// Join a room, add a rectangle, and drag it.
    Draw(DrawArgs),
}

#[derive(Args, Debug)]
struct DocumentCommand {
    #[command(subcommand)]
    command: DocumentSubcommand,
}

#[derive(Subcommand, Debug)]
enum DocumentSubcommand {
    Get {
        project_id: String,
    },
    Put {
        project_id: String,
        #[arg(long, default_value = "-", help = "Document JSON file, or - for stdin")]
        input: String,
    },
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RoomArgs {
    pub room_id: String,

    #[arg(long, default_value = "cli")]
    pub username: String,

    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub room: RoomArgs,

    /// Seed the local scene from the stored document before joining.
    #[arg(long, default_value_t = false)]
    pub load: bool,

    /// PUT the scene back to the document endpoint when it changes.
    #[arg(long, default_value_t = false)]
    pub autosave: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct DrawArgs {
    #[command(flatten)]
    pub room: RoomArgs,

    #[arg(long, default_value = "#3498db")]
    pub fill: String,

    /// Intermediate drag positions.
    #[arg(long, default_value_t = 10)]
    pub steps: u32,

    /// Horizontal distance covered by the drag.
    #[arg(long, default_value_t = 100.0)]
    pub distance: f64,

    /// Save the scene to the document endpoint afterwards.
    #[arg(long, default_value_t = false)]
    pub save: bool,
}

impl WatchArgs {
    pub(crate) fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let api = ApiClient::new(&cli.base_url, cli.token.clone())?;

    match cli.command {
        Command::Ping => {
            api.ping().await?;
            println!("ok");
            Ok(())
        }
        Command::Document(document) => run_document(&api, document).await,
        Command::Watch(args) => live::watch(&api, require_token(cli.token)?, args).await,
        Command::Draw(args) => live::draw(&api, require_token(cli.token)?, args).await,
    }
}

async fn run_document(api: &ApiClient, document: DocumentCommand) -> Result<(), CliError> {
    match document.command {
        DocumentSubcommand::Get { project_id } => {
            let doc = api.get_document(&project_id).await?;
            print_json(&serde_json::to_value(doc)?)
        }
        DocumentSubcommand::Put { project_id, input } => {
            let doc = parse_document(&read_input(&input)?)?;
            let saved = api.put_document(&project_id, &doc).await?;
            eprintln!("saved {} objects to {project_id}", saved.canvas_data.len());
            Ok(())
        }
    }
}

fn require_token(token: Option<String>) -> Result<String, CliError> {
    token.filter(|t| !t.trim().is_empty()).ok_or(CliError::MissingToken)
}

fn read_input(path: &str) -> Result<String, CliError> {
    let mut text = String::new();
    let result = if path == "-" {
        io::stdin().read_to_string(&mut text).map(|_| ())
    } else {
        fs::read_to_string(path).map(|contents| text = contents)
    };
    result.map_err(|source| CliError::Input { path: path.to_owned(), source })?;
    Ok(text)
}

/// Accept either a full document or a bare array of object snapshots.
fn parse_document(text: &str) -> Result<ProjectDocument, CliError> {
    let value = serde_json::from_str::<Value>(text)?;
    if let Value::Array(objects) = value {
        return Ok(ProjectDocument::with_objects(objects));
    }
    Ok(serde_json::from_value(value)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
