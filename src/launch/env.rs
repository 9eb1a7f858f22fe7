//! Launch environment construction and the process-spawn boundary.
//!
//! Builds the environment variable map the external coding assistant
//! reads: backend base URL, credential, canonical model names for the
//! primary/thinking/subagent roles, and tuning hints. When a
//! [`LaunchResult`] reports success, every required variable is present.

use std::collections::BTreeMap;
use std::process::ExitStatus;

use anyhow::{Context, Result};
use tracing::info;

use crate::constants::{
    ENV_API_TIMEOUT_MS, ENV_AUTH_TOKEN, ENV_BASE_URL, ENV_PRIMARY_MODEL, ENV_STREAMING,
    ENV_SUBAGENT_MODEL, ENV_THINKING_MODEL, LAUNCH_TIMEOUT_MS_DEFAULT,
};
use crate::registry::ProviderRegistry;

use super::{LaunchOptions, ResolvedLaunch};

/// Outcome of one launch attempt.
#[derive(Debug)]
pub struct LaunchResult {
    pub success: bool,
    /// The resolution behind the environment, when validation passed.
    pub resolved: Option<ResolvedLaunch>,
    /// Resolved environment; complete when `success` is true.
    pub env: BTreeMap<String, String>,
    /// Every validation problem encountered, including for the fallback.
    pub errors: Vec<String>,
}

/// Builds the environment map for a resolved launch.
pub fn build_env(
    registry: &ProviderRegistry,
    resolved: &ResolvedLaunch,
    options: &LaunchOptions,
) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    if let Some(provider) = registry.get(&resolved.provider) {
        env.insert(ENV_BASE_URL.to_string(), provider.base_url().to_string());
        env.insert(ENV_AUTH_TOKEN.to_string(), provider.api_key.clone());
    }

    env.insert(ENV_PRIMARY_MODEL.to_string(), resolved.model.clone());
    let thinking = resolved
        .thinking_model
        .clone()
        .unwrap_or_else(|| resolved.model.clone());
    env.insert(ENV_THINKING_MODEL.to_string(), thinking.clone());
    // Subagent work follows the thinking model when one is set.
    env.insert(ENV_SUBAGENT_MODEL.to_string(), thinking);

    env.insert(
        ENV_API_TIMEOUT_MS.to_string(),
        options
            .timeout_ms
            .unwrap_or(LAUNCH_TIMEOUT_MS_DEFAULT)
            .to_string(),
    );
    if let Some(streaming) = options.streaming {
        env.insert(ENV_STREAMING.to_string(), streaming.to_string());
    }

    env
}

/// Spawns the external process with the resolved environment and waits
/// for it to exit. The child inherits stdio so the assistant owns the
/// terminal.
pub async fn spawn(command: &[String], env: &BTreeMap<String, String>) -> Result<ExitStatus> {
    let (program, args) = command
        .split_first()
        .context("No command given to launch")?;

    info!(program = %program, "launching external process");
    let status = tokio::process::Command::new(program)
        .args(args)
        .envs(env)
        .status()
        .await
        .with_context(|| format!("Failed to launch '{program}'"))?;
    Ok(status)
}
