//! Standard scaler fitted at training time.
//!
//! Holds per-column mean and scale in canonical feature order and produces a
//! zero-mean unit-variance copy of a feature vector for the scaled backend.
//! It is never re-fit at request time.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::features::{feature_columns, FeatureValue, FeatureVector};

/// Scale floor; mirrors the training-side replacement of zero variance.
const MIN_SCALE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column names the scaler was fitted on, in order
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Check the scaler against the canonical feature layout.
    pub fn validate(&self) -> Result<(), ModelError> {
        let expected = feature_columns();
        if self.feature_names.len() != expected.len()
            || self.mean.len() != expected.len()
            || self.scale.len() != expected.len()
        {
            return Err(ModelError::Inconsistency(format!(
                "scaler has {} names / {} means / {} scales, expected {} columns",
                self.feature_names.len(),
                self.mean.len(),
                self.scale.len(),
                expected.len()
            )));
        }
        if let Some((i, name)) = self
            .feature_names
            .iter()
            .enumerate()
            .find(|(i, name)| **name != expected[*i])
        {
            return Err(ModelError::Inconsistency(format!(
                "scaler column {i} is '{name}', expected '{}'",
                expected[i]
            )));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(ModelError::Malformed(
                "scaler contains non-finite statistics".to_string(),
            ));
        }
        Ok(())
    }

    /// Scaled copy of `features`. Encoded categorical columns are numeric to
    /// the scaled backend and are scaled like every other column.
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        features.map_values(|i, v| {
            let scale = self.scale[i].abs().max(MIN_SCALE).copysign(self.scale[i]);
            FeatureValue::Numeric((v.as_f64() - self.mean[i]) / scale)
        })
    }
}
