//! Model registry and bundle loading.
//!
//! Bundles are loaded once during startup through a [`BundleLoader`], then
//! frozen into a [`ModelRegistry`] that is shared as `Arc<ModelRegistry>`.
//! Nothing mutates the registry after [`RegistryBuilder::build`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::{EnsembleModelBundle, LoadedModel, ModelError};

/// Source of model bundles keyed by model key.
pub trait BundleLoader: Send + Sync {
    fn load(&self, model_key: &str) -> Result<EnsembleModelBundle, ModelError>;
}

/// Loads `<dir>/<file>` JSON bundles, with the file name looked up per key.
#[derive(Debug, Clone)]
pub struct JsonDirectoryLoader {
    dir: PathBuf,
    files: BTreeMap<String, String>,
}

impl JsonDirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>, files: BTreeMap<String, String>) -> Self {
        Self {
            dir: dir.into(),
            files,
        }
    }

    /// Path a key resolves to. Keys without a mapping use `<key>.json`.
    pub fn path_for(&self, model_key: &str) -> PathBuf {
        let file = self
            .files
            .get(model_key)
            .cloned()
            .unwrap_or_else(|| format!("{}.json", model_key.to_ascii_lowercase()));
        self.dir.join(file)
    }
}

impl BundleLoader for JsonDirectoryLoader {
    fn load(&self, model_key: &str) -> Result<EnsembleModelBundle, ModelError> {
        let path = self.path_for(model_key);
        if !path.exists() {
            return Err(ModelError::NotFound(format!(
                "{model_key} (no bundle at {})",
                path.display()
            )));
        }
        load_bundle(&path)
    }
}

/// Read and parse a single bundle file.
pub fn load_bundle(path: &Path) -> Result<EnsembleModelBundle, ModelError> {
    let data = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a bundle atomically (temp file, then rename).
pub fn save_bundle(bundle: &EnsembleModelBundle, path: &Path) -> Result<(), ModelError> {
    let io_err = |source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_vec_pretty(bundle).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp_path = path.with_extension("json.tmp");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(&tmp_path, &json).map_err(io_err)?;
    std::fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}

/// Collects loaded models before freezing them into a registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    models: HashMap<String, Arc<LoadedModel>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already validated model. A later model with the same key wins.
    #[must_use]
    pub fn with_model(mut self, model: LoadedModel) -> Self {
        self.models.insert(model.key.clone(), Arc::new(model));
        self
    }

    /// Validate and add a bundle.
    pub fn with_bundle(self, bundle: EnsembleModelBundle) -> Result<Self, ModelError> {
        Ok(self.with_model(bundle.into_loaded()?))
    }

    /// Load every key through `loader`. Failures are logged and skipped so
    /// one bad bundle does not take down the grades served by the others.
    #[must_use]
    pub fn load_all<'a>(
        mut self,
        loader: &dyn BundleLoader,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        for key in keys {
            match loader.load(key).and_then(EnsembleModelBundle::into_loaded) {
                Ok(mut model) => {
                    if model.key != key {
                        warn!(expected = key, found = %model.key, "Bundle model_key mismatch, registering under expected key");
                        key.clone_into(&mut model.key);
                    }
                    info!(
                        model = key,
                        r2 = model.performance.as_ref().map(|p| p.r2_score),
                        "Loaded model bundle"
                    );
                    self = self.with_model(model);
                }
                Err(ModelError::NotFound(msg)) => {
                    warn!(model = key, "Model bundle not found: {}", msg);
                }
                Err(e) => {
                    tracing::error!(model = key, error = %e, "Failed to load model bundle");
                }
            }
        }
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
        }
    }
}

/// Read-only map of model key to loaded model.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<LoadedModel>>,
}

impl ModelRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, model_key: &str) -> Result<Arc<LoadedModel>, ModelError> {
        self.models
            .get(model_key)
            .cloned()
            .ok_or_else(|| ModelError::NotFound(model_key.to_string()))
    }

    pub fn contains(&self, model_key: &str) -> bool {
        self.models.contains_key(model_key)
    }

    /// Loaded keys, sorted.
    pub fn loaded_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.models.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MissingLoader;

    impl BundleLoader for MissingLoader {
        fn load(&self, model_key: &str) -> Result<EnsembleModelBundle, ModelError> {
            Err(ModelError::NotFound(model_key.to_string()))
        }
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let registry = ModelRegistry::builder().load_all(&MissingLoader, ["MULTI_GRADE"]).build();
        assert!(registry.is_empty());
        assert!(matches!(registry.get("MULTI_GRADE"), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_path_for_uses_file_table() {
        let loader = JsonDirectoryLoader::new(
            "/models",
            BTreeMap::from([("MULTI_GRADE".to_string(), "multi.json".to_string())]),
        );
        assert_eq!(loader.path_for("MULTI_GRADE"), PathBuf::from("/models/multi.json"));
        assert_eq!(loader.path_for("OTHER"), PathBuf::from("/models/other.json"));
    }
}
