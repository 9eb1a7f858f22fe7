//! File loading and merging for tsuji configuration.

use anyhow::{Context, Result};
use std::fs;

use super::types::Config;

impl Config {
    /// Loads the global config from `~/.config/tsuji/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = r#"default_provider = "anthropic"

[cache]
ttl_hours = 24

[gateway]
host = "127.0.0.1"
port = 8787
timeout_secs = 600

[providers.anthropic]
enabled = true
api_key = "{env:ANTHROPIC_API_KEY}"
anthropic_base_url = "https://api.anthropic.com"
default_model = "claude-sonnet-4-6"

[providers.openai]
enabled = true
api_key = "{env:OPENAI_API_KEY}"
openai_base_url = "https://api.openai.com/v1"

[providers.openrouter]
enabled = true
api_key = "{env:OPENROUTER_API_KEY}"
openai_base_url = "https://openrouter.ai/api/v1"
"#;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            let config: Config = toml::from_str(default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Look for tsuji.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                let contents = fs::read_to_string(&candidate)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(Some(config));
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge project config over global config.
    /// Project values win when present; provider entries merge per id.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        let mut providers = global.providers;
        for (id, entry) in project.providers {
            providers.insert(id, entry);
        }

        Config {
            default_provider: project.default_provider.or(global.default_provider),
            providers,
            cache: if project.cache.ttl_hours != crate::constants::CACHE_TTL_HOURS_DEFAULT
                || project.cache.path.is_some()
            {
                project.cache
            } else {
                global.cache
            },
            gateway: if project.gateway.host != crate::constants::GATEWAY_DEFAULT_HOST
                || project.gateway.port != crate::constants::GATEWAY_DEFAULT_PORT
                || project.gateway.timeout_secs != crate::constants::GATEWAY_TIMEOUT_SECS_DEFAULT
            {
                project.gateway
            } else {
                global.gateway
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_provider_entries_override_global() {
        let global: Config = toml::from_str(
            r#"
            default_provider = "anthropic"

            [providers.anthropic]
            api_key = "global-key"
            anthropic_base_url = "https://api.anthropic.com"

            [providers.openai]
            api_key = "oa-key"
            openai_base_url = "https://api.openai.com/v1"
            "#,
        )
        .unwrap();
        let project: Config = toml::from_str(
            r#"
            [providers.anthropic]
            api_key = "project-key"
            anthropic_base_url = "https://proxy.internal"
            "#,
        )
        .unwrap();

        let merged = Config::merge(global, project);
        assert_eq!(merged.default_provider.as_deref(), Some("anthropic"));
        assert_eq!(
            merged.providers["anthropic"].api_key.as_deref(),
            Some("project-key")
        );
        // Untouched providers survive the merge.
        assert_eq!(merged.providers["openai"].api_key.as_deref(), Some("oa-key"));
    }

    #[test]
    fn provider_enabled_defaults_to_true() {
        let config: Config = toml::from_str(
            r#"
            [providers.anthropic]
            api_key = "k"
            anthropic_base_url = "https://api.anthropic.com"
            "#,
        )
        .unwrap();
        assert!(config.providers["anthropic"].enabled);
    }
}
