//! XDG path resolution for tsuji configuration and cache directories.

use anyhow::Result;
use std::path::PathBuf;

use super::types::Config;

impl Config {
    /// Returns the platform-specific configuration directory for tsuji.
    ///
    /// Returns `~/.config/tsuji/` on Linux (`XDG_CONFIG_HOME/tsuji`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's config directory cannot be determined.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    /// Returns the platform-specific cache directory for tsuji.
    ///
    /// Returns `~/.cache/tsuji/` on Linux (`XDG_CACHE_HOME/tsuji`).
    /// Used for the model-catalog snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's cache directory cannot be determined.
    pub fn cache_dir() -> Result<PathBuf> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join(crate::constants::APP_NAME);
        Ok(dir)
    }

    /// Returns the full path to the tsuji configuration file.
    ///
    /// Returns `~/.config/tsuji/config.toml` on Linux.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Config::config_dir`] fails.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(crate::constants::CONFIG_FILENAME))
    }

    /// Returns the path of the model-catalog snapshot file, honoring the
    /// `[cache] path` override when present.
    pub fn cache_snapshot_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.cache.path {
            return Ok(path.clone());
        }
        Ok(Self::cache_dir()?.join(crate::constants::CACHE_FILENAME))
    }
}
