//! Entry point for tsuji, a model-aware routing layer for terminal AI
//! coding assistants.
//!
//! This binary loads environment variables, initializes logging, parses
//! CLI arguments via [`cli`], and dispatches to the appropriate subcommand
//! handler.

mod catalog;
mod cli;
mod config;
mod constants;
mod error;
mod gateway;
mod launch;
mod models;
mod registry;

use anyhow::Result;

/// Runs the tsuji CLI.
///
/// Loads `.env` files (silently ignored if absent), installs a tracing
/// subscriber honoring `RUST_LOG`, parses command-line arguments into a
/// [`cli::Cli`] struct, and dispatches the chosen subcommand via
/// [`cli::run`].
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tsuji=info")),
        )
        .init();

    let cli = cli::parse();
    cli::run(cli).await
}
