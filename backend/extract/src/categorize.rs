//! Two-tier material categorization.
//!
//! Deterministic substring rules resolve the common vocabulary; the model
//! tier handles the rest. Both tiers are memoized by exact raw string in
//! bounded caches, so the same name always yields the same category for
//! the cache lifetime even though the model tier is nondeterministic.
//! Categorization never fails: an unreachable or off-script model tier
//! degrades to `Lainnya`.

use std::sync::Arc;

use moka::sync::Cache;
use timbang_core::{MaterialCategory, VisionModel};
use tracing::{debug, warn};

/// Rule-tier categorization for the well-known material vocabulary.
///
/// Matching is case-insensitive on the Unicode-lowercased name; Chinese
/// suffixes like 石子 simply pass through unmatched.
pub fn match_rules(material_name: &str) -> Option<MaterialCategory> {
    let name = material_name.to_lowercase();

    let pecah = name.contains("pecah");
    if name.contains("batu pecah 1/2") || (pecah && name.contains("1/2")) {
        Some(MaterialCategory::BatuPecah12)
    } else if name.contains("batu pecah 2/3") || (pecah && name.contains("2/3")) {
        Some(MaterialCategory::BatuPecah23)
    } else if name.contains("batu pecah 3/5") || (pecah && name.contains("3/5")) {
        Some(MaterialCategory::BatuPecah35)
    } else if name.contains("batu sungai") {
        Some(MaterialCategory::BatuSungai)
    } else if name.contains("boulder") {
        Some(MaterialCategory::Boulder)
    } else if name.contains("kerikil") {
        Some(MaterialCategory::Kerikil)
    } else if name.contains("pasir") {
        Some(MaterialCategory::Pasir)
    } else if name.contains("abu batu") || name.contains("screenings") {
        Some(MaterialCategory::AbuBatu)
    } else {
        None
    }
}

/// Rule-first, model-second categorizer with per-tier memoization.
pub struct Categorizer {
    model: Arc<dyn VisionModel>,
    rule_cache: Cache<String, Option<MaterialCategory>>,
    model_cache: Cache<String, MaterialCategory>,
}

impl Categorizer {
    pub fn new(model: Arc<dyn VisionModel>, cache_capacity: u64) -> Self {
        Self {
            model,
            rule_cache: Cache::builder().max_capacity(cache_capacity).build(),
            model_cache: Cache::builder().max_capacity(cache_capacity).build(),
        }
    }

    /// Map a raw material name to its canonical category.
    pub async fn categorize(&self, material_name: &str) -> MaterialCategory {
        let rule_result = match self.rule_cache.get(material_name) {
            Some(cached) => cached,
            None => {
                let result = match_rules(material_name);
                self.rule_cache.insert(material_name.to_string(), result);
                result
            }
        };
        if let Some(category) = rule_result {
            debug!(material = %material_name, category = %category, "Rule-tier categorization");
            return category;
        }

        if let Some(category) = self.model_cache.get(material_name) {
            return category;
        }

        let category = match self.model.classify_material(material_name).await {
            Ok(label) => MaterialCategory::from_label(&label).unwrap_or_else(|| {
                warn!(material = %material_name, label = %label, "Model returned unknown category label");
                MaterialCategory::Lainnya
            }),
            Err(err) => {
                warn!(material = %material_name, error = %err, "Model-tier categorization failed, falling back");
                MaterialCategory::Lainnya
            }
        };

        debug!(material = %material_name, category = %category, "Model-tier categorization");
        self.model_cache.insert(material_name.to_string(), category);
        category
    }
}
