//! Multi-provider model catalog.
//!
//! [`ModelCatalog`] discovers which models each enabled backend exposes,
//! normalizes and deduplicates them, and persists the result as a
//! [`CacheSnapshot`]. Per-provider fetches fan out concurrently and are
//! individually error-captured: one backend failing (or timing out) never
//! cancels the others, and only a total wipeout surfaces as an error.
//!
//! The catalog is an explicitly constructed context object passed by
//! reference; there is no process-wide singleton.

mod dedup;
mod fetch;
mod policy;
mod snapshot;

pub use dedup::{dedup_models, FamilyRule, PriorityPolicy};
pub use policy::CachePolicy;
pub use snapshot::{CacheSnapshot, FetchAttempt, ModelDescriptor};

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::RouterError;
use crate::registry::ProviderRegistry;

/// Model discovery and cache management across all configured providers.
pub struct ModelCatalog {
    registry: ProviderRegistry,
    priority: PriorityPolicy,
    cache_policy: CachePolicy,
    cache_path: PathBuf,
    client: reqwest::Client,
}

impl ModelCatalog {
    pub fn new(registry: ProviderRegistry, config: &Config) -> Result<Self> {
        let cache_path = config.cache_snapshot_path()?;
        let priority = PriorityPolicy::new(registry.priority_order());
        Ok(Self {
            registry,
            priority,
            cache_policy: CachePolicy::new(config.cache.ttl_hours),
            cache_path,
            client: reqwest::Client::new(),
        })
    }

    /// Builds a catalog against an explicit cache path. Test harness boundary.
    #[cfg(test)]
    pub fn with_cache_path(registry: ProviderRegistry, ttl_hours: u64, cache_path: PathBuf) -> Self {
        let priority = PriorityPolicy::new(registry.priority_order());
        Self {
            registry,
            priority,
            cache_policy: CachePolicy::new(ttl_hours),
            cache_path,
            client: reqwest::Client::new(),
        }
    }

    /// The dedup/prefix-repair priority policy.
    pub fn priority(&self) -> &PriorityPolicy {
        &self.priority
    }

    /// The snapshot currently on disk, if readable and schema-compatible.
    pub fn cached(&self) -> Option<CacheSnapshot> {
        snapshot::load(&self.cache_path)
    }

    /// Fetches every enabled provider concurrently, merges and
    /// deduplicates the results, and persists a new snapshot atomically.
    ///
    /// Providers without a credential are skipped before any network call
    /// and recorded as failed attempts. Partial results are returned and
    /// persisted; all-providers-failed is an error, as is having no
    /// enabled provider at all, and in either case the previous snapshot
    /// on disk is left untouched.
    pub async fn fetch_all(&self) -> Result<CacheSnapshot, RouterError> {
        let known = self.registry.priority_order();
        let mut attempts: Vec<FetchAttempt> = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        let mut futures = Vec::new();

        for provider in self.registry.enabled() {
            if !provider.has_credential() {
                warn!(provider = %provider.id, "skipping model listing: no credential configured");
                failures.push(format!("{}: no credential configured", provider.id));
                attempts.push(FetchAttempt {
                    provider: provider.id.clone(),
                    timestamp: Utc::now(),
                    model_count: 0,
                    success: false,
                });
                continue;
            }
            let client = &self.client;
            let known = &known;
            futures.push(async move {
                let result = fetch::fetch_provider(client, provider, known).await;
                (provider.id.clone(), result)
            });
        }

        let mut gathered: Vec<ModelDescriptor> = Vec::new();
        for (provider_id, result) in futures::future::join_all(futures).await {
            match result {
                Ok(models) => {
                    info!(provider = %provider_id, count = models.len(), "model listing fetched");
                    attempts.push(FetchAttempt {
                        provider: provider_id,
                        timestamp: Utc::now(),
                        model_count: models.len(),
                        success: true,
                    });
                    gathered.extend(models);
                }
                Err(err) => {
                    warn!(provider = %provider_id, %err, "model listing failed");
                    failures.push(format!("{provider_id}: {err}"));
                    attempts.push(FetchAttempt {
                        provider: provider_id,
                        timestamp: Utc::now(),
                        model_count: 0,
                        success: false,
                    });
                }
            }
        }

        // No attempts at all means nothing was enabled to fetch from;
        // persisting an empty snapshot would mask the misconfiguration.
        if attempts.is_empty() {
            return Err(RouterError::Configuration(
                "no enabled providers to fetch models from".to_string(),
            ));
        }
        if gathered.is_empty() && !failures.is_empty() {
            return Err(RouterError::AggregateFetch { failures });
        }

        let deduped = dedup_models(gathered, &self.priority);
        let previous_history = self
            .cached()
            .map(|s| s.fetch_history)
            .unwrap_or_default();
        let snapshot = CacheSnapshot::new(deduped, attempts, previous_history);

        // A failed durable write must not lose the in-memory result.
        if let Err(err) = snapshot::persist(&self.cache_path, &snapshot) {
            error!(path = %self.cache_path.display(), %err, "failed to persist catalog snapshot");
        }

        Ok(snapshot)
    }

    /// Cache-aware read: returns the on-disk snapshot while the policy
    /// accepts it, otherwise refetches. A failed refetch falls back to the
    /// stale snapshot when one exists.
    pub async fn load_or_fetch(&self) -> Result<CacheSnapshot, RouterError> {
        match self.cached() {
            Some(snapshot) if !self.cache_policy.needs_refresh(&snapshot) => Ok(snapshot),
            Some(stale) => match self.fetch_all().await {
                Ok(fresh) => Ok(fresh),
                Err(err) => {
                    warn!(%err, "catalog refresh failed; serving stale snapshot");
                    Ok(stale)
                }
            },
            None => self.fetch_all().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderDescriptor;

    fn provider(id: &str, key: &str, openai_base: Option<String>) -> ProviderDescriptor {
        ProviderDescriptor {
            id: id.to_string(),
            enabled: true,
            api_key: key.to_string(),
            anthropic_base_url: if openai_base.is_none() {
                Some("https://example.invalid".to_string())
            } else {
                None
            },
            openai_base_url: openai_base,
            default_model: None,
        }
    }

    fn catalog(providers: Vec<ProviderDescriptor>, dir: &tempfile::TempDir) -> ModelCatalog {
        ModelCatalog::with_cache_path(
            ProviderRegistry::from_descriptors(providers),
            24,
            dir.path().join("models.json"),
        )
    }

    #[tokio::test]
    async fn partial_failure_returns_survivors_and_records_both_attempts() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"id":"m1"},{"id":"m2"},{"id":"m3"}]}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(
            vec![
                provider("broken", "k", Some("http://127.0.0.1:1/v1".to_string())),
                provider("good", "k", Some(server.url())),
            ],
            &dir,
        );

        let snapshot = catalog.fetch_all().await.unwrap();
        ok.assert_async().await;

        assert_eq!(snapshot.models.len(), 3);
        assert!(snapshot.models.iter().all(|m| m.provider == "good"));
        assert_eq!(snapshot.fetch_history.len(), 2);
        let by_provider = |p: &str| {
            snapshot
                .fetch_history
                .iter()
                .find(|a| a.provider == p)
                .unwrap()
        };
        assert!(by_provider("good").success);
        assert_eq!(by_provider("good").model_count, 3);
        assert!(!by_provider("broken").success);
    }

    #[tokio::test]
    async fn provider_without_credential_is_skipped_before_fetch() {
        let mut server = mockito::Server::new_async().await;
        // The keyless provider must never be called: expect zero hits on a
        // distinct path-indifferent mock by only mocking for the keyed one.
        let keyed = server
            .mock("GET", "/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"id":"foo"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let mut keyless_server = mockito::Server::new_async().await;
        let keyless = keyless_server
            .mock("GET", "/models")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(
            vec![
                provider("a", "k1", Some(server.url())),
                provider("b", "", Some(keyless_server.url())),
            ],
            &dir,
        );

        let snapshot = catalog.fetch_all().await.unwrap();
        keyed.assert_async().await;
        keyless.assert_async().await;

        assert_eq!(snapshot.models.len(), 1);
        assert_eq!(snapshot.models[0].id, "a:foo");
        let b_attempt = snapshot
            .fetch_history
            .iter()
            .find(|a| a.provider == "b")
            .unwrap();
        assert!(!b_attempt.success);
        assert_eq!(b_attempt.model_count, 0);
    }

    #[tokio::test]
    async fn all_providers_failing_is_an_aggregate_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(
            vec![
                provider("a", "k", Some("http://127.0.0.1:1/v1".to_string())),
                provider("b", "", Some("http://127.0.0.1:1/v1".to_string())),
            ],
            &dir,
        );

        let err = catalog.fetch_all().await.unwrap_err();
        match err {
            RouterError::AggregateFetch { failures } => assert_eq!(failures.len(), 2),
            other => panic!("expected AggregateFetch, got {other:?}"),
        }
        // Nothing persisted on total failure.
        assert!(catalog.cached().is_none());
    }

    #[tokio::test]
    async fn all_providers_disabled_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut only = provider("a", "k", None);
        only.enabled = false;
        let catalog = catalog(vec![only], &dir);

        let err = catalog.fetch_all().await.unwrap_err();
        assert!(matches!(err, RouterError::Configuration(_)));
        // An empty snapshot must not shadow the real problem.
        assert!(catalog.cached().is_none());
    }

    #[tokio::test]
    async fn aggregator_duplicates_collapse_onto_vendor() {
        let mut server = mockito::Server::new_async().await;
        let _listing = server
            .mock("GET", "/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"id":"anthropic/claude-zed"},{"id":"other/thing"}]}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(
            vec![
                provider("anthropic", "k1", None),
                provider("openrouter", "k2", Some(server.url())),
            ],
            &dir,
        );

        let snapshot = catalog.fetch_all().await.unwrap();
        // The aggregator's claude entry keeps its canonical anthropic id;
        // the unrelated vendor stays namespaced under the aggregator.
        assert!(snapshot.models.iter().any(|m| m.id == "anthropic:claude-zed"));
        assert!(snapshot
            .models
            .iter()
            .any(|m| m.id == "openrouter:other/thing"));
    }
}
