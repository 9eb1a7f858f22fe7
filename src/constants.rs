//! Centralized constants for tsuji.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "tsuji";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "tsuji.toml";

// --- Provider defaults ---

/// Default provider when none is configured or resolvable.
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Fixed provider priority order. Drives dedup for models outside any
/// family rule, the prefix-repair order in the gateway, and the fallback
/// scan at launch time. Providers configured but not listed here are
/// appended in configuration order.
pub const PROVIDER_PRIORITY: &[&str] = &["anthropic", "openai", "openrouter", "ollama"];

/// Family priority rules for catalog deduplication: when a model id
/// contains the tag, providers are preferred in the listed order.
/// New families are added here (or via configuration), never in code.
pub const FAMILY_PRIORITY: &[(&str, &[&str])] = &[
    ("claude", &["anthropic", "openrouter"]),
    ("gpt", &["openai", "openrouter"]),
    ("o4", &["openai", "openrouter"]),
];

// --- Model catalog cache ---

/// Cache snapshot filename under the XDG cache directory.
pub const CACHE_FILENAME: &str = "models.json";

/// Schema version written into every snapshot. Older versions on disk are
/// treated as "no snapshot" rather than migrated.
pub const CACHE_SCHEMA_VERSION: u32 = 2;

/// Maximum retained fetch attempts, oldest evicted first.
pub const FETCH_HISTORY_CAP: usize = 10;

/// Default snapshot time-to-live in hours.
pub const CACHE_TTL_HOURS_DEFAULT: u64 = 24;

/// Efficiency decay in points per hour of snapshot age (full decay at 25h).
pub const EFFICIENCY_DECAY_PER_HOUR: f64 = 4.0;

/// Minimum model count for a snapshot to score any efficiency at all.
/// A catalog this thin is never worth keeping past its next check.
pub const EFFICIENCY_MIN_MODELS: usize = 10;

/// Efficiency score below which a refresh is forced even inside the TTL.
pub const EFFICIENCY_REFRESH_THRESHOLD: f64 = 30.0;

/// Fetch-history success rate below which a refresh is forced.
pub const SUCCESS_RATE_REFRESH_THRESHOLD: f64 = 0.5;

/// Timeout for a single provider model-listing call, in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Context window assumed for models we have no metadata for.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 128_000;

/// Max output tokens assumed for models we have no metadata for.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8_192;

// --- Gateway ---

/// Default gateway bind host.
pub const GATEWAY_DEFAULT_HOST: &str = "127.0.0.1";

/// Default gateway bind port.
pub const GATEWAY_DEFAULT_PORT: u16 = 8787;

/// Default timeout for a forwarded upstream call, in seconds. Model
/// completions can legitimately run for minutes on slow backends.
pub const GATEWAY_TIMEOUT_SECS_DEFAULT: u64 = 600;

/// Maximum requests the gateway holds in flight at once; excess
/// connections wait rather than piling onto slow upstreams.
pub const GATEWAY_MAX_IN_FLIGHT: usize = 256;

// --- Launch environment ---

/// Backend base URL exported to the launched process.
pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";

/// Backend credential exported to the launched process.
pub const ENV_AUTH_TOKEN: &str = "ANTHROPIC_AUTH_TOKEN";

/// Primary model exported to the launched process.
pub const ENV_PRIMARY_MODEL: &str = "ANTHROPIC_MODEL";

/// Thinking model exported to the launched process.
pub const ENV_THINKING_MODEL: &str = "ANTHROPIC_THINKING_MODEL";

/// Subagent model exported to the launched process.
pub const ENV_SUBAGENT_MODEL: &str = "ANTHROPIC_SMALL_FAST_MODEL";

/// Upstream request timeout hint exported to the launched process.
pub const ENV_API_TIMEOUT_MS: &str = "API_TIMEOUT_MS";

/// Streaming preference exported to the launched process.
pub const ENV_STREAMING: &str = "TSUJI_STREAMING";

/// Default upstream timeout hint for launched processes, in milliseconds.
pub const LAUNCH_TIMEOUT_MS_DEFAULT: u64 = 600_000;
