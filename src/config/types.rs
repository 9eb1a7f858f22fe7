//! Struct definitions and serde defaults for tsuji configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for tsuji, deserialized from `config.toml`.
///
/// Fields use serde defaults so tsuji can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default provider name used when neither the request nor the model
    /// id determines one.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Backend descriptors keyed by provider id. BTreeMap keeps iteration
    /// order stable across runs.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEntry>,
    /// Model-catalog cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Routing gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Connection details for a single backend.
///
/// A provider may expose an Anthropic-compatible endpoint, an
/// OpenAI-compatible endpoint, or both. At least one must be set.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderEntry {
    /// Whether this provider participates in routing and launch.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// API key for authentication. Supports `{env:VAR}` substitution.
    pub api_key: Option<String>,
    /// Anthropic-compatible base URL (serves `/v1/messages`).
    pub anthropic_base_url: Option<String>,
    /// OpenAI-compatible base URL (serves `/chat/completions` and `/models`).
    pub openai_base_url: Option<String>,
    /// Model used for this provider when no model is specified.
    pub default_model: Option<String>,
}

/// Model-catalog cache settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Snapshot time-to-live in hours.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    /// Override for the snapshot file path. Defaults to the XDG cache dir.
    pub path: Option<std::path::PathBuf>,
}

/// Routing gateway settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Bind host.
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Timeout for forwarded upstream calls, in seconds.
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

/// Returns the serde default for `ProviderEntry::enabled` (`true`).
fn default_enabled() -> bool {
    true
}

/// Returns the serde default for `CacheConfig::ttl_hours`.
fn default_ttl_hours() -> u64 {
    crate::constants::CACHE_TTL_HOURS_DEFAULT
}

/// Returns the serde default for `GatewayConfig::host`.
fn default_gateway_host() -> String {
    crate::constants::GATEWAY_DEFAULT_HOST.to_string()
}

/// Returns the serde default for `GatewayConfig::port`.
fn default_gateway_port() -> u16 {
    crate::constants::GATEWAY_DEFAULT_PORT
}

/// Returns the serde default for `GatewayConfig::timeout_secs`.
fn default_gateway_timeout() -> u64 {
    crate::constants::GATEWAY_TIMEOUT_SECS_DEFAULT
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            path: None,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            timeout_secs: default_gateway_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            providers: BTreeMap::new(),
            cache: CacheConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}
