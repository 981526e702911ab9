//! Serialized model bundles.
//!
//! A bundle is the unit a trainer ships: both backend sets keyed by target
//! column, the optional scaler, the blend weights, the categorical encoders,
//! and training metrics. [`EnsembleModelBundle::into_loaded`] validates it
//! once and turns it into the read-only [`LoadedModel`] the registry serves.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{EnsemblePredictor, ModelError, RegressionModel, Regressor, StandardScaler};
use crate::config::defaults::DEFAULT_ENSEMBLE_WEIGHTS;
use crate::features::CategoricalCodec;
use crate::types::{ElementSymbol, ModelPerformance};

/// Current bundle format version.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

const TARGET_SUFFIX: &str = "_Element_Config";

fn default_version() -> u32 {
    BUNDLE_FORMAT_VERSION
}

const fn default_weights() -> [f64; 2] {
    DEFAULT_ENSEMBLE_WEIGHTS
}

/// Metrics recorded by the trainer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingInfo {
    /// Held-out r2 per target column
    #[serde(default)]
    pub r2: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<String>,
}

/// On-disk form of an ensemble model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleModelBundle {
    #[serde(default = "default_version")]
    pub version: u32,
    pub model_key: String,
    #[serde(default = "default_weights")]
    pub weights: [f64; 2],
    /// Backend fed with scaled features, keyed by target column
    pub scaled_models: BTreeMap<String, RegressionModel>,
    /// Backend fed with raw features, keyed by target column
    pub raw_models: BTreeMap<String, RegressionModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    #[serde(default)]
    pub label_encoders: CategoricalCodec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_info: Option<TrainingInfo>,
}

/// A validated bundle ready to serve requests.
#[derive(Debug)]
pub struct LoadedModel {
    pub key: String,
    pub predictor: EnsemblePredictor,
    pub codec: CategoricalCodec,
    pub performance: Option<ModelPerformance>,
}

impl EnsembleModelBundle {
    /// Validate and convert into a servable model.
    pub fn into_loaded(self) -> Result<LoadedModel, ModelError> {
        if self.version != BUNDLE_FORMAT_VERSION {
            return Err(ModelError::Malformed(format!(
                "unsupported bundle version {} (expected {BUNDLE_FORMAT_VERSION})",
                self.version
            )));
        }

        let performance = self.training_info.as_ref().and_then(performance_from);
        let predictor = EnsemblePredictor::new(
            backend_set(self.scaled_models)?,
            backend_set(self.raw_models)?,
            self.scaler,
            self.weights,
        )?;

        Ok(LoadedModel {
            key: self.model_key,
            predictor,
            codec: self.label_encoders,
            performance,
        })
    }
}

/// Target column (`"C_Element_Config"`) to element.
fn parse_target(column: &str) -> Result<ElementSymbol, ModelError> {
    column
        .strip_suffix(TARGET_SUFFIX)
        .and_then(|symbol| symbol.parse().ok())
        .ok_or_else(|| ModelError::Malformed(format!("unknown target column '{column}'")))
}

fn backend_set(
    models: BTreeMap<String, RegressionModel>,
) -> Result<BTreeMap<ElementSymbol, Arc<dyn Regressor>>, ModelError> {
    models
        .into_iter()
        .map(|(column, model)| {
            let element = parse_target(&column)?;
            model.validate()?;
            Ok((element, Arc::new(model) as Arc<dyn Regressor>))
        })
        .collect()
}

fn performance_from(info: &TrainingInfo) -> Option<ModelPerformance> {
    if info.r2.is_empty() {
        return None;
    }
    let r2 = info.r2.values().mean();
    Some(ModelPerformance {
        r2_score: r2,
        accuracy_percentage: r2 * 100.0,
        elements_predicted: info.r2.len(),
    })
}
