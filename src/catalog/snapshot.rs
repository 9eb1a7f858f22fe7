//! Cache snapshot types and durable persistence.
//!
//! A [`CacheSnapshot`] is the persisted result of one aggregate discovery
//! pass. Snapshots are superseded, never mutated: the writer serializes to
//! a temp file next to the target and renames it into place, so a
//! concurrent reader never observes partial JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One model as known to the catalog, tagged with the provider it
/// currently resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Canonical id, `provider:model-name`. Unique within a snapshot.
    pub id: String,
    /// Provider this descriptor resolves to. After dedup this may differ
    /// from the provider that originally returned it.
    pub provider: String,
    /// Name the backend itself expects in request bodies.
    pub native_model: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Context window size in tokens.
    pub context_length: u32,
    /// Maximum output tokens per completion.
    pub max_output_tokens: u32,
    /// Capability tags ("streaming", "tool-use", "json-mode").
    pub capabilities: Vec<String>,
}

/// Outcome of one provider's discovery call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchAttempt {
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    pub model_count: usize,
    pub success: bool,
}

/// Persisted result of one aggregate model-discovery pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Schema version tag for forward compatibility.
    pub version: u32,
    /// Snapshot creation time.
    pub timestamp: DateTime<Utc>,
    /// Deduplicated models, in stable display order.
    pub models: Vec<ModelDescriptor>,
    /// Provider id -> count of models attributed to it.
    pub provider_counts: BTreeMap<String, usize>,
    /// Fetch attempts, newest first, capped at
    /// [`crate::constants::FETCH_HISTORY_CAP`].
    pub fetch_history: Vec<FetchAttempt>,
}

impl CacheSnapshot {
    /// Builds a snapshot from deduplicated models, prepending the new
    /// attempts onto the previous history and truncating to the cap.
    pub fn new(
        models: Vec<ModelDescriptor>,
        mut attempts: Vec<FetchAttempt>,
        previous_history: Vec<FetchAttempt>,
    ) -> Self {
        let mut provider_counts = BTreeMap::new();
        for model in &models {
            *provider_counts.entry(model.provider.clone()).or_insert(0) += 1;
        }

        attempts.extend(previous_history);
        attempts.truncate(crate::constants::FETCH_HISTORY_CAP);

        Self {
            version: crate::constants::CACHE_SCHEMA_VERSION,
            timestamp: Utc::now(),
            models,
            provider_counts,
            fetch_history: attempts,
        }
    }

    /// Snapshot age in fractional hours.
    pub fn age_hours(&self) -> f64 {
        let age = Utc::now().signed_duration_since(self.timestamp);
        age.num_milliseconds() as f64 / 3_600_000.0
    }

    /// Case-insensitive lookup by canonical id.
    pub fn find(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }
}

/// Loads the snapshot from disk.
///
/// Returns `None` when the file is missing, unreadable, malformed, or
/// written by a different schema version; callers treat all of those as
/// "needs refresh" rather than failing.
pub fn load(path: &Path) -> Option<CacheSnapshot> {
    let contents = fs::read_to_string(path).ok()?;
    let snapshot: CacheSnapshot = match serde_json::from_str(&contents) {
        Ok(s) => s,
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring unreadable cache snapshot");
            return None;
        }
    };
    if snapshot.version != crate::constants::CACHE_SCHEMA_VERSION {
        warn!(
            found = snapshot.version,
            expected = crate::constants::CACHE_SCHEMA_VERSION,
            "ignoring cache snapshot with mismatched schema version"
        );
        return None;
    }
    Some(snapshot)
}

/// Persists the snapshot atomically: write to a sibling temp file, then
/// rename over the target. Readers never see a half-written snapshot.
pub fn persist(path: &Path, snapshot: &CacheSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write snapshot temp {:?}", tmp))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move snapshot into place at {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, provider: &str) -> ModelDescriptor {
        let native = id.split_once(':').map(|(_, m)| m).unwrap_or(id);
        ModelDescriptor {
            id: id.to_string(),
            provider: provider.to_string(),
            native_model: native.to_string(),
            display_name: native.to_string(),
            context_length: 128_000,
            max_output_tokens: 8_192,
            capabilities: vec!["streaming".to_string()],
        }
    }

    fn attempt(provider: &str, success: bool) -> FetchAttempt {
        FetchAttempt {
            provider: provider.to_string(),
            timestamp: Utc::now(),
            model_count: if success { 1 } else { 0 },
            success,
        }
    }

    #[test]
    fn history_is_capped_at_ten_newest_first() {
        let previous: Vec<FetchAttempt> = (0..9).map(|_| attempt("old", true)).collect();
        let snapshot = CacheSnapshot::new(
            vec![],
            vec![attempt("a", true), attempt("b", false)],
            previous,
        );
        assert_eq!(snapshot.fetch_history.len(), 10);
        assert_eq!(snapshot.fetch_history[0].provider, "a");
        assert_eq!(snapshot.fetch_history[1].provider, "b");
        assert_eq!(snapshot.fetch_history[9].provider, "old");
    }

    #[test]
    fn provider_counts_follow_attribution() {
        let snapshot = CacheSnapshot::new(
            vec![
                descriptor("anthropic:claude-x", "anthropic"),
                descriptor("anthropic:claude-y", "anthropic"),
                descriptor("openai:gpt-x", "openai"),
            ],
            vec![],
            vec![],
        );
        assert_eq!(snapshot.provider_counts["anthropic"], 2);
        assert_eq!(snapshot.provider_counts["openai"], 1);
    }

    #[test]
    fn persist_replaces_atomically_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");

        let first = CacheSnapshot::new(vec![descriptor("a:one", "a")], vec![], vec![]);
        persist(&path, &first).unwrap();
        let second = CacheSnapshot::new(vec![descriptor("a:two", "a")], vec![], vec![]);
        persist(&path, &second).unwrap();

        // Reader sees a complete, parseable snapshot with the new content.
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.models.len(), 1);
        assert_eq!(loaded.models[0].id, "a:two");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn partial_write_is_never_observed_via_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");

        let snapshot = CacheSnapshot::new(vec![descriptor("a:one", "a")], vec![], vec![]);
        persist(&path, &snapshot).unwrap();

        // Simulate a writer mid-flight: a half-written temp file must not
        // affect what a reader loads from the final path.
        std::fs::write(path.with_extension("json.tmp"), "{\"version\": 2, \"mod").unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.models[0].id, "a:one");
    }

    #[test]
    fn version_mismatch_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");

        let mut snapshot = CacheSnapshot::new(vec![], vec![], vec![]);
        snapshot.version = 1;
        let json = serde_json::to_string(&snapshot).unwrap();
        std::fs::write(&path, json).unwrap();

        assert!(load(&path).is_none());
    }

    #[test]
    fn malformed_json_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(load(&path).is_none());
    }
}
