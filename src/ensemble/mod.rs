//! Ensemble Predictor
//!
//! Two backends score the same request. The scaled backend sees the feature
//! vector after the bundle's [`StandardScaler`]; the raw backend sees the
//! vector untouched, categorical codes included. Per element the outputs are
//! blended with the bundle's fixed weights:
//!
//! ```text
//! blended = w0 * scaled(target) + w1 * raw(target)
//! ```
//!
//! No renormalization is applied when `w0 + w1 != 1`. Elements are predicted
//! independently, so the per-element calls run on the rayon pool.

pub mod backend;
pub mod bundle;
pub mod registry;
pub mod scaler;

pub use backend::{LinearModel, RegressionModel, Regressor, Tree, TreeEnsemble, TreeNode};
pub use bundle::{EnsembleModelBundle, LoadedModel, TrainingInfo, BUNDLE_FORMAT_VERSION};
pub use registry::{load_bundle, save_bundle, BundleLoader, JsonDirectoryLoader, ModelRegistry, RegistryBuilder};
pub use scaler::StandardScaler;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::features::FeatureVector;
use crate::types::{ElementMap, ElementSymbol};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("No model loaded for '{0}'")]
    NotFound(String),

    #[error("Model bundle is inconsistent: {0}")]
    Inconsistency(String),

    #[error("Feature '{0}' is not part of the feature layout")]
    MissingFeature(String),

    #[error("Malformed model: {0}")]
    Malformed(String),

    #[error("Invalid ensemble weights {0:?}: weights must be finite and sum to a positive value")]
    InvalidWeights([f64; 2]),

    #[error("Failed to read model bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model bundle {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Backend outputs for one element, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentPrediction {
    pub scaled: f64,
    pub raw: f64,
    pub blended: f64,
}

type BackendSet = BTreeMap<ElementSymbol, Arc<dyn Regressor>>;

/// Blends the scaled and raw backends. Immutable after construction.
#[derive(Debug, Clone)]
pub struct EnsemblePredictor {
    scaled: BackendSet,
    raw: BackendSet,
    scaler: Option<StandardScaler>,
    weights: [f64; 2],
}

impl EnsemblePredictor {
    /// Assemble a predictor, checking weights and target coverage.
    ///
    /// Both backend sets must cover exactly the same targets, and that set
    /// must be all seven elements.
    pub fn new(
        scaled: BackendSet,
        raw: BackendSet,
        scaler: Option<StandardScaler>,
        weights: [f64; 2],
    ) -> Result<Self, ModelError> {
        if weights.iter().any(|w| !w.is_finite()) || weights[0] + weights[1] <= 0.0 {
            return Err(ModelError::InvalidWeights(weights));
        }

        if !scaled.keys().eq(raw.keys()) {
            let only_scaled: Vec<_> = scaled.keys().filter(|k| !raw.contains_key(k)).collect();
            let only_raw: Vec<_> = raw.keys().filter(|k| !scaled.contains_key(k)).collect();
            return Err(ModelError::Inconsistency(format!(
                "backend target sets differ (scaled only: {only_scaled:?}, raw only: {only_raw:?})"
            )));
        }
        let missing: Vec<_> = ElementSymbol::ALL
            .into_iter()
            .filter(|e| !scaled.contains_key(e))
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::Inconsistency(format!(
                "no trained backend for {missing:?}"
            )));
        }

        if let Some(s) = &scaler {
            s.validate()?;
        }

        Ok(Self {
            scaled,
            raw,
            scaler,
            weights,
        })
    }

    pub const fn weights(&self) -> [f64; 2] {
        self.weights
    }

    /// Per-element backend outputs and their blend.
    pub fn predict_components(
        &self,
        features: &FeatureVector,
    ) -> Result<ElementMap<ComponentPrediction>, ModelError> {
        let scaled_features = match &self.scaler {
            Some(s) => s.transform(features),
            None => features.clone(),
        };

        let [w0, w1] = self.weights;
        let outputs = ElementSymbol::ALL
            .to_vec()
            .into_par_iter()
            .map(|e| -> Result<ComponentPrediction, ModelError> {
                let scaled = backend(&self.scaled, e)?.predict(&scaled_features)?;
                let raw = backend(&self.raw, e)?.predict(features)?;
                Ok(ComponentPrediction {
                    scaled,
                    raw,
                    blended: w0 * scaled + w1 * raw,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        ElementMap::try_from_fn(|e| {
            outputs
                .get(e.index())
                .copied()
                .ok_or_else(|| ModelError::Inconsistency(format!("no prediction for {e}")))
        })
    }

    /// Blended prediction per element.
    pub fn predict(&self, features: &FeatureVector) -> Result<ElementMap<f64>, ModelError> {
        Ok(self.predict_components(features)?.map(|_, c| c.blended))
    }
}

fn backend(set: &BackendSet, element: ElementSymbol) -> Result<&Arc<dyn Regressor>, ModelError> {
    set.get(&element).ok_or_else(|| {
        ModelError::Inconsistency(format!("target {} missing from backend", element.target_column()))
    })
}
