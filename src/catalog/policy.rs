//! Cache validity and refresh heuristics.
//!
//! A snapshot is *valid* while younger than the configured TTL, but the
//! policy can demand a refresh earlier: a thin catalog scores zero
//! efficiency, efficiency decays linearly with age, and a poor recent
//! fetch success rate signals unreliable providers. This refreshes
//! proactively when something is actually wrong instead of purely on a
//! wall-clock timer.

use crate::constants::{
    EFFICIENCY_DECAY_PER_HOUR, EFFICIENCY_MIN_MODELS, EFFICIENCY_REFRESH_THRESHOLD,
    SUCCESS_RATE_REFRESH_THRESHOLD,
};

use super::snapshot::CacheSnapshot;

/// Refresh policy over a [`CacheSnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    ttl_hours: u64,
}

impl CachePolicy {
    pub fn new(ttl_hours: u64) -> Self {
        Self { ttl_hours }
    }

    /// Whether the snapshot is younger than the TTL.
    pub fn is_valid(&self, snapshot: &CacheSnapshot) -> bool {
        snapshot.age_hours() < self.ttl_hours as f64
    }

    /// Decaying 0-100 score. Zero for catalogs at or below
    /// [`EFFICIENCY_MIN_MODELS`] models; otherwise 100 minus 4 points per
    /// hour of age, floored at zero (full decay at 25 hours).
    pub fn efficiency_score(&self, snapshot: &CacheSnapshot) -> f64 {
        if snapshot.models.len() <= EFFICIENCY_MIN_MODELS {
            return 0.0;
        }
        (100.0 - snapshot.age_hours() * EFFICIENCY_DECAY_PER_HOUR).max(0.0)
    }

    /// Fraction of retained fetch attempts that succeeded. An empty
    /// history is no evidence of failure and counts as 1.0.
    pub fn success_rate(&self, snapshot: &CacheSnapshot) -> f64 {
        if snapshot.fetch_history.is_empty() {
            return 1.0;
        }
        let ok = snapshot.fetch_history.iter().filter(|a| a.success).count();
        ok as f64 / snapshot.fetch_history.len() as f64
    }

    /// Whether the snapshot should be refetched: expired by TTL, scoring
    /// too little efficiency, or backed by unreliable recent fetches.
    pub fn needs_refresh(&self, snapshot: &CacheSnapshot) -> bool {
        !self.is_valid(snapshot)
            || self.efficiency_score(snapshot) < EFFICIENCY_REFRESH_THRESHOLD
            || self.success_rate(snapshot) < SUCCESS_RATE_REFRESH_THRESHOLD
    }
}
