//! Provider registry for tsuji.
//!
//! Converts the configuration boundary's provider table into immutable
//! [`ProviderDescriptor`]s and exposes the fixed priority ordering that
//! drives dedup, prefix repair, and launch fallback. Constructed once per
//! process; re-built only on explicit config reload.

use std::collections::BTreeMap;

use crate::config::{Config, ProviderEntry};
use crate::error::RouterError;

/// A single backend descriptor, resolved from configuration.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Stable provider key (e.g. "anthropic", "openrouter").
    pub id: String,
    /// Whether this provider participates in routing and launch.
    pub enabled: bool,
    /// Credential; empty means "no key configured".
    pub api_key: String,
    /// Anthropic-compatible base URL, if the backend exposes one.
    pub anthropic_base_url: Option<String>,
    /// OpenAI-compatible base URL, if the backend exposes one.
    pub openai_base_url: Option<String>,
    /// Model used when no model is specified.
    pub default_model: Option<String>,
}

impl ProviderDescriptor {
    /// Whether a non-empty credential is configured.
    pub fn has_credential(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The base URL routes and launches target. Anthropic-compatible wins
    /// when both are configured, since the launched assistant and the
    /// gateway's primary surface speak that protocol natively.
    pub fn base_url(&self) -> &str {
        self.anthropic_base_url
            .as_deref()
            .or(self.openai_base_url.as_deref())
            .unwrap_or_default()
    }
}

/// Immutable set of backend descriptors in priority order.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Builds the registry from resolved configuration.
    ///
    /// Descriptors are ordered by the fixed priority list, with providers
    /// unknown to that list appended in configuration order.
    ///
    /// # Errors
    ///
    /// [`RouterError::Configuration`] when no providers are configured or
    /// a descriptor carries no base URL at all.
    pub fn from_config(config: &Config) -> Result<Self, RouterError> {
        if config.providers.is_empty() {
            return Err(RouterError::Configuration(
                "no providers configured; add a [providers.<id>] section".to_string(),
            ));
        }

        let mut remaining: BTreeMap<&String, &ProviderEntry> = config.providers.iter().collect();
        let mut providers = Vec::with_capacity(config.providers.len());

        for &id in crate::constants::PROVIDER_PRIORITY {
            if let Some(entry) = remaining.remove(&id.to_string()) {
                providers.push(Self::descriptor(id, entry, config.resolve_api_key(id))?);
            }
        }
        for (id, entry) in remaining {
            providers.push(Self::descriptor(id, entry, config.resolve_api_key(id))?);
        }

        Ok(Self { providers })
    }

    /// Converts one config entry, rejecting descriptors with no endpoint.
    /// `api_key` arrives pre-resolved (environment overrides config).
    fn descriptor(
        id: &str,
        entry: &ProviderEntry,
        api_key: Option<String>,
    ) -> Result<ProviderDescriptor, RouterError> {
        if entry.anthropic_base_url.is_none() && entry.openai_base_url.is_none() {
            return Err(RouterError::Configuration(format!(
                "provider '{id}' has neither anthropic_base_url nor openai_base_url"
            )));
        }
        Ok(ProviderDescriptor {
            id: id.to_string(),
            enabled: entry.enabled,
            api_key: api_key.unwrap_or_default(),
            anthropic_base_url: entry.anthropic_base_url.clone(),
            openai_base_url: entry.openai_base_url.clone(),
            default_model: entry.default_model.clone(),
        })
    }

    /// Builds a registry directly from descriptors. Test harness boundary.
    #[cfg(test)]
    pub fn from_descriptors(providers: Vec<ProviderDescriptor>) -> Self {
        Self { providers }
    }

    /// Looks up a provider by id.
    pub fn get(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// All descriptors in priority order.
    pub fn all(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Enabled descriptors in priority order.
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Provider ids in priority order.
    pub fn priority_order(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.id.clone()).collect()
    }

    /// Whether the id names a configured provider.
    pub fn is_known(&self, id: &str) -> bool {
        self.providers.iter().any(|p| p.id == id)
    }
}
