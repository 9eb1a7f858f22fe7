//! Cross-provider deduplication with a data-driven priority policy.
//!
//! When two providers expose the same canonical model id, exactly one
//! descriptor survives. Which one is decided by [`PriorityPolicy`]: a
//! table of family rules (substring tag -> ordered provider list) plus a
//! default order for everything else. A model id is classified once; no
//! per-model logic is ever hard-coded here.

use std::collections::HashMap;

use super::snapshot::ModelDescriptor;

/// One family rule: ids containing `tag` prefer providers in `order`.
#[derive(Debug, Clone)]
pub struct FamilyRule {
    pub tag: String,
    pub order: Vec<String>,
}

/// Priority table used by the dedup step and prefix repair.
#[derive(Debug, Clone)]
pub struct PriorityPolicy {
    families: Vec<FamilyRule>,
    default_order: Vec<String>,
}

impl PriorityPolicy {
    /// Builds the policy from the built-in family table and the given
    /// default provider order (normally the registry's priority order).
    pub fn new(default_order: Vec<String>) -> Self {
        let families = crate::constants::FAMILY_PRIORITY
            .iter()
            .map(|(tag, order)| FamilyRule {
                tag: (*tag).to_string(),
                order: order.iter().map(|p| (*p).to_string()).collect(),
            })
            .collect();
        Self {
            families,
            default_order,
        }
    }

    /// Builds a policy with explicit family rules. Test harness boundary.
    #[cfg(test)]
    pub fn with_families(families: Vec<FamilyRule>, default_order: Vec<String>) -> Self {
        Self {
            families,
            default_order,
        }
    }

    /// Classifies a model id into its provider preference order: the first
    /// family rule whose tag the id contains, else the default order.
    pub fn classify(&self, model_id: &str) -> &[String] {
        let lowered = model_id.to_ascii_lowercase();
        for rule in &self.families {
            if lowered.contains(&rule.tag) {
                return &rule.order;
            }
        }
        &self.default_order
    }

    /// Rank of `provider` for this model id; lower wins. Providers absent
    /// from the classified order rank below every listed one.
    pub fn rank(&self, model_id: &str, provider: &str) -> usize {
        let order = self.classify(model_id);
        order
            .iter()
            .position(|p| p == provider)
            .unwrap_or(order.len())
    }

    /// The default provider order, used for prefix repair and fallback.
    pub fn default_order(&self) -> &[String] {
        &self.default_order
    }
}

/// Merges per-provider model lists into one list with at most one
/// descriptor per canonical id. First-seen display order is preserved;
/// a later duplicate replaces an earlier one only when its provider
/// ranks strictly higher for that id.
pub fn dedup_models(models: Vec<ModelDescriptor>, policy: &PriorityPolicy) -> Vec<ModelDescriptor> {
    let mut kept: Vec<ModelDescriptor> = Vec::with_capacity(models.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(models.len());

    for model in models {
        let key = model.id.to_ascii_lowercase();
        match index.get(&key) {
            None => {
                index.insert(key, kept.len());
                kept.push(model);
            }
            Some(&at) => {
                let incumbent = &kept[at];
                if policy.rank(&model.id, &model.provider)
                    < policy.rank(&incumbent.id, &incumbent.provider)
                {
                    kept[at] = model;
                }
            }
        }
    }

    kept
}
