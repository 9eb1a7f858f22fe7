//! Configuration types and path resolution for tsuji.
//!
//! Tsuji stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/tsuji/config.toml` on Linux) and its model-catalog
//! snapshot under the XDG cache directory (`~/.cache/tsuji/`).

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::CacheConfig;
pub use types::Config;
pub use types::GatewayConfig;
pub use types::ProviderEntry;

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }
}
