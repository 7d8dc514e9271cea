//! Model artifact resolution.
//!
//! Trained pipelines are shipped as JSON manifests, one per
//! `(unit_model, component)` key, conventionally named `{model_id}.json`
//! with `model_id = lowercase(unit_model) + "_" + lowercase(component)`.
//! The registry loads a directory of manifests at startup and resolves keys
//! at request time. A missing key is fatal for the request — no fallback
//! model is ever substituted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::ScoringError;
use crate::transform::Pipeline;

/// One trained model bundle: prep pipelines for both data sources plus the
/// scoring pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub unit_model: String,
    pub component: String,
    #[serde(default)]
    pub vhms_prep: Pipeline,
    #[serde(default)]
    pub pap_prep: Pipeline,
    pub scoring: Pipeline,
}

impl ModelManifest {
    /// The composite key this bundle serves.
    pub fn model_id(&self) -> String {
        model_id(&self.unit_model, &self.component)
    }
}

/// Canonical artifact key for an equipment model + component pair.
pub fn model_id(unit_model: &str, component: &str) -> String {
    format!(
        "{}_{}",
        unit_model.trim().to_lowercase(),
        component.trim().to_lowercase()
    )
}

/// In-memory registry of loaded model bundles keyed by model id.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    bundles: HashMap<String, ModelManifest>,
}

impl ModelRegistry {
    /// Build a registry from already-constructed manifests (tests, embedded
    /// defaults).
    pub fn from_manifests(manifests: impl IntoIterator<Item = ModelManifest>) -> Self {
        let bundles = manifests
            .into_iter()
            .map(|m| (m.model_id(), m))
            .collect();
        Self { bundles }
    }

    /// Load every `*.json` manifest in a directory.
    ///
    /// Unreadable or unparsable manifests abort the load — a service that
    /// starts with a broken artifact inventory would fail requests in
    /// confusing ways later.
    pub fn load_dir(dir: &Path) -> Result<Self, ScoringError> {
        let artifact_err = |reason: String| ScoringError::Artifact {
            path: dir.display().to_string(),
            reason,
        };
        let mut bundles = HashMap::new();
        for entry in std::fs::read_dir(dir).map_err(|e| artifact_err(e.to_string()))? {
            let path = entry.map_err(|e| artifact_err(e.to_string()))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let manifest = load_manifest(&path)?;
            log::debug!("loaded model artifact `{}`", manifest.model_id());
            bundles.insert(manifest.model_id(), manifest);
        }
        log::info!("model registry loaded: {} bundle(s)", bundles.len());
        Ok(Self { bundles })
    }

    /// Resolve the bundle for a model+component key. Fatal when absent.
    pub fn resolve(&self, unit_model: &str, component: &str) -> Result<&ModelManifest, ScoringError> {
        let id = model_id(unit_model, component);
        self.bundles
            .get(&id)
            .ok_or(ScoringError::UnknownModel { model_id: id })
    }

    /// All loaded bundles, sorted by model id.
    pub fn list(&self) -> Vec<&ModelManifest> {
        let mut bundles: Vec<_> = self.bundles.values().collect();
        bundles.sort_by_key(|m| m.model_id());
        bundles
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

fn load_manifest(path: &Path) -> Result<ModelManifest, ScoringError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ScoringError::Artifact {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| ScoringError::Artifact {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
