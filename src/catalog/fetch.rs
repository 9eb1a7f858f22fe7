//! Per-provider model discovery.
//!
//! OpenAI-compatible backends are queried live via `GET {base}/models`
//! (the `{"data": [{"id": ...}]}` shape). Backends exposing only an
//! Anthropic-compatible endpoint have no listing API, so they get the
//! built-in list from [`crate::models`]. Every returned descriptor is
//! tagged with the provider that served it; vendor-prefixed ids
//! (`anthropic/claude-x` via an aggregator) canonicalize onto the vendor
//! so the dedup step can collapse them with the vendor's own listing.

use std::time::Duration;

use serde::Deserialize;

use crate::error::RouterError;
use crate::models;
use crate::registry::ProviderDescriptor;

use super::snapshot::ModelDescriptor;

/// Wire shape of an OpenAI-style model listing.
#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Vec<ListedModel>,
}

#[derive(Debug, Deserialize)]
struct ListedModel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    context_length: Option<u32>,
    #[serde(default)]
    max_output_tokens: Option<u32>,
}

/// Fetches one provider's model list.
///
/// `known_providers` is the set of configured provider ids, used to decide
/// whether a `vendor/model` id canonicalizes onto the vendor.
pub(super) async fn fetch_provider(
    client: &reqwest::Client,
    provider: &ProviderDescriptor,
    known_providers: &[String],
) -> Result<Vec<ModelDescriptor>, RouterError> {
    match provider.openai_base_url {
        Some(ref base) => fetch_listing(client, provider, base, known_providers).await,
        None => Ok(builtin_models(provider)),
    }
}

/// Live listing against an OpenAI-compatible `/models` endpoint.
async fn fetch_listing(
    client: &reqwest::Client,
    provider: &ProviderDescriptor,
    base: &str,
    known_providers: &[String],
) -> Result<Vec<ModelDescriptor>, RouterError> {
    let url = format!("{}/models", base.trim_end_matches('/'));
    let response = client
        .get(&url)
        .bearer_auth(&provider.api_key)
        .timeout(Duration::from_secs(crate::constants::FETCH_TIMEOUT_SECS))
        .send()
        .await
        .map_err(|err| RouterError::ProviderFetch {
            provider: provider.id.clone(),
            reason: err.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(RouterError::ProviderFetch {
            provider: provider.id.clone(),
            reason: format!("HTTP {} from {}", response.status(), url),
        });
    }

    let listing: ListResponse =
        response
            .json()
            .await
            .map_err(|err| RouterError::ProviderFetch {
                provider: provider.id.clone(),
                reason: format!("malformed listing: {err}"),
            })?;

    Ok(listing
        .data
        .into_iter()
        .map(|m| descriptor_from_listing(provider, m, known_providers))
        .collect())
}

/// Converts one listed model into a canonical descriptor.
fn descriptor_from_listing(
    provider: &ProviderDescriptor,
    listed: ListedModel,
    known_providers: &[String],
) -> ModelDescriptor {
    let id = canonical_id(&provider.id, &listed.id, known_providers);
    let display_name = listed.name.unwrap_or_else(|| listed.id.clone());
    // The built-in registry fills gaps when the listing omits metadata.
    let known = models::builtin(&listed.id);
    ModelDescriptor {
        id,
        provider: provider.id.clone(),
        native_model: listed.id,
        display_name,
        context_length: listed
            .context_length
            .or(known.map(|m| m.context_window))
            .unwrap_or(crate::constants::DEFAULT_CONTEXT_WINDOW),
        max_output_tokens: listed
            .max_output_tokens
            .or(known.map(|m| m.max_output_tokens))
            .unwrap_or(crate::constants::DEFAULT_MAX_OUTPUT_TOKENS),
        capabilities: models::OPENAI_COMPAT_CAPABILITIES
            .iter()
            .map(|c| (*c).to_string())
            .collect(),
    }
}

/// Canonical id for a raw model id served by `provider`.
///
/// Aggregators return vendor-prefixed ids like `anthropic/claude-x`; when
/// the vendor is itself a configured provider the canonical id becomes
/// `anthropic:claude-x`, letting dedup collapse it with the vendor's own
/// entry. Everything else is `provider:raw-id`.
pub(super) fn canonical_id(provider_id: &str, raw: &str, known_providers: &[String]) -> String {
    if let Some((vendor, rest)) = raw.split_once('/') {
        let vendor = vendor.to_ascii_lowercase();
        if known_providers.iter().any(|p| *p == vendor) {
            return format!("{vendor}:{rest}");
        }
    }
    format!("{provider_id}:{raw}")
}

/// Built-in list for providers with no listing endpoint.
fn builtin_models(provider: &ProviderDescriptor) -> Vec<ModelDescriptor> {
    models::ANTHROPIC_MODELS
        .iter()
        .map(|info| ModelDescriptor {
            id: format!("{}:{}", provider.id, info.name),
            provider: provider.id.clone(),
            native_model: info.name.to_string(),
            display_name: info.display_name.to_string(),
            context_length: info.context_window,
            max_output_tokens: info.max_output_tokens,
            capabilities: models::ANTHROPIC_CAPABILITIES
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["anthropic".to_string(), "openrouter".to_string()]
    }

    #[test]
    fn vendor_prefix_canonicalizes_onto_known_provider() {
        assert_eq!(
            canonical_id("openrouter", "anthropic/claude-x", &known()),
            "anthropic:claude-x"
        );
    }

    #[test]
    fn unknown_vendor_prefix_stays_with_serving_provider() {
        assert_eq!(
            canonical_id("openrouter", "mistralai/mistral-large", &known()),
            "openrouter:mistralai/mistral-large"
        );
    }

    #[test]
    fn plain_id_gets_serving_provider_prefix() {
        assert_eq!(canonical_id("openai", "gpt-x", &known()), "openai:gpt-x");
    }
}
