//! Command-line interface definition and dispatch for tsuji.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand
//! maps onto one piece of the routing core: `launch` drives the
//! LaunchResolver, `gateway` runs the routing gateway, `models` exercises
//! the catalog, and `config` inspects the resolved configuration.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::catalog::ModelCatalog;
use crate::config::Config;
use crate::gateway;
use crate::launch::{self, LaunchOptions, LaunchRequest, LaunchResolver};
use crate::registry::ProviderRegistry;

/// Top-level CLI structure for tsuji.
///
/// Parsed from command-line arguments via [`clap::Parser`]. Contains a single
/// required subcommand that determines which action tsuji performs.
#[derive(Parser)]
#[command(
    name = "tsuji",
    about = "Model-aware routing and launch layer for terminal AI coding assistants"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the tsuji CLI.
///
/// Each variant maps to a top-level action. The `///` doc comments on variants
/// double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a provider and launch an external coding assistant
    Launch {
        /// Model to use (canonical `provider:model` or bare id)
        #[arg(short, long)]
        model: Option<String>,
        /// Separate model for extended reasoning
        #[arg(long)]
        thinking_model: Option<String>,
        /// Explicit provider override
        #[arg(short, long)]
        provider: Option<String>,
        /// Upstream timeout hint in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Print the resolved environment instead of launching
        #[arg(long)]
        dry_run: bool,
        /// Command to launch, with its arguments
        #[arg(trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Run the routing gateway
    Gateway {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Inspect the model catalog
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `models` command.
#[derive(Subcommand)]
pub enum ModelsAction {
    /// List available models, grouped by provider
    List {
        /// Bypass the cache and fetch live
        #[arg(long)]
        refresh: bool,
    },
    /// Force a catalog fetch and persist a fresh snapshot
    Refresh,
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show resolved config with secrets masked
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Launch {
            model,
            thinking_model,
            provider,
            timeout_ms,
            dry_run,
            command,
        } => {
            let config = Config::load()?;
            let registry = ProviderRegistry::from_config(&config)?;
            let request = LaunchRequest {
                model,
                thinking_model,
                provider,
                options: LaunchOptions {
                    timeout_ms,
                    streaming: None,
                },
            };
            run_launch(&config, &registry, request, dry_run, command).await
        }
        Commands::Gateway { host, port } => {
            let config = Config::load()?;
            let registry = ProviderRegistry::from_config(&config)?;
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            gateway::serve(&config, registry, &host, port).await
        }
        Commands::Models { action } => {
            let config = Config::load()?;
            let registry = ProviderRegistry::from_config(&config)?;
            let catalog = ModelCatalog::new(registry.clone(), &config)?;
            match action {
                ModelsAction::List { refresh } => list_models(&registry, &catalog, refresh).await,
                ModelsAction::Refresh => {
                    let snapshot = catalog.fetch_all().await?;
                    println!(
                        "Refreshed catalog: {} models across {} providers",
                        snapshot.models.len(),
                        snapshot.provider_counts.len()
                    );
                    Ok(())
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => show_config(),
        },
    }
}

/// Resolves and launches (or dry-runs) one request.
async fn run_launch(
    config: &Config,
    registry: &ProviderRegistry,
    request: LaunchRequest,
    dry_run: bool,
    command: Vec<String>,
) -> Result<()> {
    // The catalog improves provider resolution but is not required for it;
    // a failed read just means prefix/default resolution.
    let catalog = ModelCatalog::new(registry.clone(), config)?;
    let snapshot = catalog.load_or_fetch().await.ok();

    let resolver = LaunchResolver::new(registry, snapshot.as_ref(), config.default_provider.as_deref());
    let result = resolver.launch(&request);
    if !result.success {
        eprintln!("{}", "Launch failed:".red().bold());
        for error in &result.errors {
            eprintln!("  - {error}");
        }
        std::process::exit(1);
    }

    let Some(resolved) = result.resolved else {
        anyhow::bail!("Launch reported success without a resolution");
    };
    if resolved.fallback_used {
        println!(
            "{} primary provider unavailable, using '{}'",
            "warning:".yellow().bold(),
            resolved.provider
        );
    }

    if dry_run || command.is_empty() {
        println!("Resolved environment for provider '{}':", resolved.provider);
        for (key, value) in &result.env {
            let shown = if key.contains("TOKEN") || key.contains("KEY") {
                "********"
            } else {
                value.as_str()
            };
            println!("  {}={}", key.cyan(), shown);
        }
        return Ok(());
    }

    let status = launch::spawn(&command, &result.env).await?;
    std::process::exit(status.code().unwrap_or(1));
}

/// List all available models, grouped by provider.
async fn list_models(registry: &ProviderRegistry, catalog: &ModelCatalog, refresh: bool) -> Result<()> {
    let snapshot = if refresh {
        catalog.fetch_all().await?
    } else {
        catalog.load_or_fetch().await?
    };

    println!("Available models:\n");
    for provider in registry.all() {
        let marker = if provider.enabled { "" } else { " (disabled)" };
        println!("  {}{marker}:", provider.id.bold());
        let mut any = false;
        for model in snapshot.models.iter().filter(|m| m.provider == provider.id) {
            any = true;
            let default_marker = provider
                .default_model
                .as_deref()
                .filter(|d| *d == model.native_model)
                .map(|_| " (default)")
                .unwrap_or("");
            println!(
                "    {}  {} ctx{default_marker}",
                model.id,
                format_tokens(model.context_length)
            );
        }
        if !any {
            println!("    (no models discovered)");
        }
        println!();
    }
    Ok(())
}

/// Print the resolved configuration with credentials masked.
fn show_config() -> Result<()> {
    let mut config = Config::load()?;
    for entry in config.providers.values_mut() {
        if let Some(ref mut key) = entry.api_key {
            if !key.is_empty() {
                *key = "********".to_string();
            }
        }
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Formats a token count compactly ("200k", "1.0M").
fn format_tokens(count: u32) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{}k", count / 1_000)
    } else {
        count.to_string()
    }
}
