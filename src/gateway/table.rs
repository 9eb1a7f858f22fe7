//! In-memory route table.
//!
//! Maps case-folded canonical model ids to concrete, currently
//! authenticated backend targets. Built from a *live* catalog fetch plus
//! registry credentials (never the disk snapshot, so rotated secrets are
//! always current) and swapped wholesale on reload, never mutated in
//! place.

use std::collections::HashMap;

use crate::catalog::{CacheSnapshot, PriorityPolicy};
use crate::registry::ProviderRegistry;

/// One resolvable backend target.
#[derive(Debug, Clone)]
pub struct RouteTarget {
    /// Provider the request will be forwarded to.
    pub provider: String,
    /// Model name the backend expects in the request body.
    pub native_model: String,
    /// Backend base URL the original request path is appended to.
    pub base_url: String,
    /// Live credential for the backend.
    pub api_key: String,
}

/// Case-folded canonical model id -> backend target.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteTarget>,
    /// Canonical ids in snapshot order, for stable listing output.
    display_order: Vec<String>,
}

impl RouteTable {
    /// Joins each model descriptor with its provider's live credential and
    /// base URL. Models whose provider is missing, disabled, or without an
    /// endpoint are dropped from the table.
    pub fn build(snapshot: &CacheSnapshot, registry: &ProviderRegistry) -> Self {
        let mut routes = HashMap::with_capacity(snapshot.models.len());
        let mut display_order = Vec::with_capacity(snapshot.models.len());

        for model in &snapshot.models {
            let Some(provider) = registry.get(&model.provider) else {
                continue;
            };
            if !provider.enabled || provider.base_url().is_empty() {
                continue;
            }
            let key = model.id.to_ascii_lowercase();
            routes.insert(
                key,
                RouteTarget {
                    provider: provider.id.clone(),
                    native_model: model.native_model.clone(),
                    base_url: provider.base_url().to_string(),
                    api_key: provider.api_key.clone(),
                },
            );
            display_order.push(model.id.clone());
        }

        Self {
            routes,
            display_order,
        }
    }

    /// Resolves a requested model: case-insensitive exact match first,
    /// then prefix repair for ids that arrive without a recognized
    /// provider prefix. Repair tries every provider in priority order
    /// until one combination exists in the table.
    pub fn resolve(&self, model: &str, priority: &PriorityPolicy) -> Option<&RouteTarget> {
        let folded = model.to_ascii_lowercase();
        if let Some(target) = self.routes.get(&folded) {
            return Some(target);
        }

        // Only repair ids that are provider-less: either no ':' at all, or
        // a prefix that is not a provider we know.
        let recognized = match folded.split_once(':') {
            Some((prefix, _)) => priority.default_order().iter().any(|p| p == prefix),
            None => false,
        };
        if recognized {
            return None;
        }

        for provider in priority.default_order() {
            if let Some(target) = self.routes.get(&format!("{provider}:{folded}")) {
                return Some(target);
            }
        }
        None
    }

    /// Number of resolvable models.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Canonical ids with their targets, in stable display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteTarget)> {
        self.display_order.iter().filter_map(|id| {
            self.routes
                .get(&id.to_ascii_lowercase())
                .map(|t| (id.as_str(), t))
        })
    }
}
