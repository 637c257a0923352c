//! clesson server
//!
//! Loads the lesson catalog and serves the lesson, grading and progress API.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clesson_server::{create_router, AppState, Catalog, Config, DirectoryLessonSource};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// clesson server - C lessons with automatic grading
#[derive(Parser, Debug)]
#[command(name = "clesson-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: clesson.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lessons root directory
    #[arg(short, long, value_name = "DIR")]
    lessons: Option<PathBuf>,

    /// Port for the HTTP API server
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(lessons) = args.lessons {
        config.lessons_dir = lessons;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    config.validate()?;
    print_config(&config);

    let source = DirectoryLessonSource::new(&config.lessons_dir);
    let catalog = Catalog::load(&source)?;
    if catalog.is_empty() {
        tracing::warn!(lessons_dir = %source.root().display(), "No lessons found");
    } else {
        let ids: Vec<String> = catalog.ids().map(|id| id.to_string()).collect();
        println!("Lessons available: {}", ids.join(", "));
    }

    let state = AppState::new(Arc::new(catalog), &config);
    let router = create_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port")
    })?;

    println!("clesson server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Loads configuration from an explicit path or the current directory.
fn load_config(config_path: Option<&Path>) -> anyhow::Result<Config> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Lessons: {}", config.lessons_dir.display());
    println!(
        "  Compiler: {} {}",
        config.compiler,
        config.compiler_flags.join(" ")
    );
    println!("  Run timeout: {}s", config.run_timeout_secs);
    println!("  Concurrent grades: {}", config.max_concurrent_grades);
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}
