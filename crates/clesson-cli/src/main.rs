//! clesson CLI
//!
//! Learner-facing client: fetches lessons into a local workspace, submits
//! solutions for grading, and shows progress.

mod client;
mod commands;
mod state;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::client::ApiClient;
use crate::commands::Session;
use crate::state::ClientState;

/// Default server address.
const DEFAULT_SERVER: &str = "http://127.0.0.1:50052";

/// clesson - learn C one graded lesson at a time
#[derive(Parser, Debug)]
#[command(name = "clesson")]
#[command(version, about, long_about = None)]
struct Args {
    /// Server base URL
    #[arg(long, global = true, env = "CLESSON_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Client state file (default: ~/.c-learning/config.json)
    #[arg(long, global = true, env = "CLESSON_STATE", value_name = "FILE")]
    state: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the workspace directory
    Init,

    /// Open a lesson and prepare its workspace
    Lesson {
        /// Lesson id
        #[arg(long, default_value_t = 1)]
        id: u32,
    },

    /// Grade the active lesson's solution.c
    Test,

    /// Grade a source file against a lesson
    Submit {
        /// Lesson id
        #[arg(long, default_value_t = 1)]
        id: u32,

        /// Path to the C source file
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },

    /// Open the lesson after the active one
    Next,

    /// Show your progress
    Progress,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let state_path = args.state.unwrap_or_else(state::default_state_path);
    let client_state = ClientState::load_or_create(&state_path)?;
    tracing::debug!(server = %args.server, user_id = %client_state.user_id, "Starting");

    let mut session = Session::new(
        ApiClient::new(args.server),
        client_state,
        state_path,
        args.json,
    );

    match args.command {
        Command::Init => session.init().await,
        Command::Lesson { id } => session.lesson(id).await,
        Command::Test => session.test().await,
        Command::Submit { id, file } => session.submit(id, &file).await,
        Command::Next => session.next().await,
        Command::Progress => session.progress().await,
    }
}
