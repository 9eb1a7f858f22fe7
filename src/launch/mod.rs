//! Launch-time provider resolution with one-shot fallback.
//!
//! Given a requested model (and optionally a separate thinking model),
//! the resolver determines the provider, validates enablement and
//! credentials, and on failure attempts exactly one fallback provider
//! before giving up. A single attempt moves Resolving -> Validating ->
//! Validated | Invalid -> FallbackAttempt -> Validated | Failed; the
//! fallback, when taken, routes both the primary and thinking model.

mod env;

pub use env::{build_env, spawn, LaunchResult};

use tracing::{info, warn};

use crate::catalog::CacheSnapshot;
use crate::error::RouterError;
use crate::registry::ProviderRegistry;

/// One launch request from the CLI surface.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    /// Requested model, canonical or bare.
    pub model: Option<String>,
    /// Separate model for extended reasoning, if any.
    pub thinking_model: Option<String>,
    /// Explicit provider override.
    pub provider: Option<String>,
    /// Tuning options handed through to the launch environment.
    pub options: LaunchOptions,
}

/// Free-form launch tuning options.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Upstream timeout hint in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Streaming preference.
    pub streaming: Option<bool>,
}

/// A fully resolved launch: provider, canonical model names, and whether
/// the fallback path was taken.
#[derive(Debug, Clone)]
pub struct ResolvedLaunch {
    pub provider: String,
    pub model: String,
    pub thinking_model: Option<String>,
    pub fallback_used: bool,
}

/// Resolves providers and validates the launch environment.
pub struct LaunchResolver<'a> {
    registry: &'a ProviderRegistry,
    snapshot: Option<&'a CacheSnapshot>,
    default_provider: String,
}

impl<'a> LaunchResolver<'a> {
    pub fn new(
        registry: &'a ProviderRegistry,
        snapshot: Option<&'a CacheSnapshot>,
        default_provider: Option<&str>,
    ) -> Self {
        Self {
            registry,
            snapshot,
            default_provider: default_provider
                .unwrap_or(crate::constants::DEFAULT_PROVIDER)
                .to_string(),
        }
    }

    /// Determines the provider for one model slot, in order: explicit
    /// request override, provider of a resolved catalog descriptor,
    /// recognized `provider:` prefix, configured default.
    pub fn resolve_provider(&self, explicit: Option<&str>, model: Option<&str>) -> String {
        if let Some(provider) = explicit {
            return provider.to_string();
        }
        if let Some(model) = model {
            if let Some(descriptor) = self.snapshot.and_then(|s| s.find(model)) {
                return descriptor.provider.clone();
            }
            if let Some((prefix, _)) = model.split_once(':') {
                let prefix = prefix.to_ascii_lowercase();
                if self.registry.is_known(&prefix) {
                    return prefix;
                }
            }
        }
        self.default_provider.clone()
    }

    /// Checks one provider's enablement and credential. Returns every
    /// violation rather than stopping at the first.
    fn validate_provider(&self, id: &str) -> Vec<String> {
        let Some(provider) = self.registry.get(id) else {
            return vec![format!("provider '{id}' is not configured")];
        };
        let mut errors = Vec::new();
        if !provider.enabled {
            errors.push(format!("provider '{id}' is disabled"));
        }
        if !provider.has_credential() {
            errors.push(format!("provider '{id}' has no API key configured"));
        }
        errors
    }

    /// Validates the whole request: primary provider and, when different,
    /// the thinking-model provider. All violations are accumulated.
    pub fn validate_environment(&self, request: &LaunchRequest) -> Vec<String> {
        let primary = self.resolve_provider(request.provider.as_deref(), request.model.as_deref());
        let mut errors = self.validate_provider(&primary);

        if let Some(thinking) = request.thinking_model.as_deref() {
            let thinking_provider =
                self.resolve_provider(request.provider.as_deref(), Some(thinking));
            if thinking_provider != primary {
                errors.extend(self.validate_provider(&thinking_provider));
            }
        }
        errors
    }

    /// First enabled provider in priority order, other than the primary,
    /// that passes validation. Rejected candidates append their violations
    /// to `errors`, so a failed launch names every provider it considered.
    fn fallback_candidate(&self, primary: &str, errors: &mut Vec<String>) -> Option<String> {
        for candidate in self.registry.enabled().filter(|p| p.id != primary) {
            let rejected = self.validate_provider(&candidate.id);
            if rejected.is_empty() {
                return Some(candidate.id.clone());
            }
            errors.extend(rejected);
        }
        None
    }

    /// Canonical model name for a slot, namespaced under `provider` when
    /// the request carried a bare id.
    fn canonical_model(
        &self,
        provider: &str,
        model: Option<&str>,
        errors: &mut Vec<String>,
    ) -> String {
        if let Some(model) = model {
            if let Some(descriptor) = self.snapshot.and_then(|s| s.find(model)) {
                return descriptor.id.clone();
            }
            if let Some((prefix, _)) = model.split_once(':') {
                if self.registry.is_known(&prefix.to_ascii_lowercase()) {
                    return model.to_string();
                }
            }
            return format!("{provider}:{model}");
        }
        match self.registry.get(provider).and_then(|p| p.default_model.as_deref()) {
            Some(default) => format!("{provider}:{default}"),
            None => {
                errors.push(format!(
                    "no model specified and provider '{provider}' has no default_model"
                ));
                String::new()
            }
        }
    }

    /// Resolves the request end to end, taking the one-shot fallback path
    /// when primary validation fails.
    ///
    /// # Errors
    ///
    /// [`RouterError::Validation`] carrying every violation from each
    /// attempted provider.
    pub fn resolve(&self, request: &LaunchRequest) -> Result<ResolvedLaunch, RouterError> {
        let primary = self.resolve_provider(request.provider.as_deref(), request.model.as_deref());
        let mut errors = self.validate_environment(request);

        let (provider, fallback_used) = if errors.is_empty() {
            (primary, false)
        } else {
            match self.fallback_candidate(&primary, &mut errors) {
                Some(fallback) => {
                    warn!(
                        primary = %primary,
                        fallback = %fallback,
                        "primary provider failed validation; using fallback"
                    );
                    (fallback, true)
                }
                None => return Err(RouterError::Validation { errors }),
            }
        };

        // On the fallback path both models route through the fallback.
        let mut model_errors = Vec::new();
        let model = self.canonical_model(&provider, request.model.as_deref(), &mut model_errors);
        let thinking_model = request
            .thinking_model
            .as_deref()
            .map(|m| {
                if fallback_used {
                    format!("{provider}:{}", bare_name(m))
                } else {
                    let tp = self.resolve_provider(request.provider.as_deref(), Some(m));
                    self.canonical_model(&tp, Some(m), &mut model_errors)
                }
            });
        if !model_errors.is_empty() {
            return Err(RouterError::Validation {
                errors: model_errors,
            });
        }

        let model = if fallback_used {
            format!("{provider}:{}", bare_name(&model))
        } else {
            model
        };

        info!(provider = %provider, model = %model, fallback_used, "launch resolved");
        Ok(ResolvedLaunch {
            provider,
            model,
            thinking_model,
            fallback_used,
        })
    }

    /// Resolves the request and builds the launch environment in one
    /// step. Validation failures (including the fallback's) are returned
    /// in the result rather than as an error.
    pub fn launch(&self, request: &LaunchRequest) -> LaunchResult {
        match self.resolve(request) {
            Ok(resolved) => {
                let env = build_env(self.registry, &resolved, &request.options);
                LaunchResult {
                    success: true,
                    resolved: Some(resolved),
                    env,
                    errors: Vec::new(),
                }
            }
            Err(RouterError::Validation { errors }) => LaunchResult {
                success: false,
                resolved: None,
                env: Default::default(),
                errors,
            },
            Err(other) => LaunchResult {
                success: false,
                resolved: None,
                env: Default::default(),
                errors: vec![other.to_string()],
            },
        }
    }
}

/// Strips any `provider:` prefix off a model id.
fn bare_name(model: &str) -> &str {
    model.split_once(':').map(|(_, m)| m).unwrap_or(model)
}
