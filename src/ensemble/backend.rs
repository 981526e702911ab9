//! Regression backends.
//!
//! [`Regressor`] is the single seam the ensemble depends on. Two serializable
//! model families ship in bundles: a linear model and a gradient-boosted tree
//! ensemble with numeric threshold splits and categorical membership splits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ModelError;
use crate::features::{column_index, FeatureVector};

/// Anything that maps a feature vector to one predicted value.
pub trait Regressor: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

fn feature(features: &FeatureVector, name: &str) -> Result<f64, ModelError> {
    features
        .get(name)
        .map(crate::features::FeatureValue::as_f64)
        .ok_or_else(|| ModelError::MissingFeature(name.to_string()))
}

fn check_feature_name(name: &str) -> Result<(), ModelError> {
    if column_index(name).is_none() {
        return Err(ModelError::MissingFeature(name.to_string()));
    }
    Ok(())
}

// ============================================================================
// Serialized model families
// ============================================================================

/// A trained model as stored in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    Linear(LinearModel),
    Trees(TreeEnsemble),
}

impl RegressionModel {
    /// Structural checks run once at load time.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::Linear(m) => m.validate(),
            Self::Trees(m) => m.validate(),
        }
    }
}

impl Regressor for RegressionModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        match self {
            Self::Linear(m) => m.predict(features),
            Self::Trees(m) => m.predict(features),
        }
    }
}

/// `intercept + sum(coefficient * feature)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), ModelError> {
        self.coefficients.keys().try_for_each(|k| check_feature_name(k))
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let mut total = self.intercept;
        for (name, coef) in &self.coefficients {
            total += coef * feature(features, name)?;
        }
        Ok(total)
    }
}

/// Additive ensemble of regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), ModelError> {
        self.trees.iter().try_for_each(Tree::validate)
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.evaluate(features)?;
        }
        Ok(total)
    }
}

/// Flat node array; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `feature <= threshold`; NaN goes right.
    Split {
        feature: String,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Go left when the encoded category is in `categories`.
    Categorical {
        feature: String,
        categories: Vec<i64>,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

impl Tree {
    /// Children must point strictly forward, which rules out cycles.
    fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Malformed("empty tree".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let (feature, left, right) = match node {
                TreeNode::Leaf { .. } => continue,
                TreeNode::Split { feature, left, right, .. }
                | TreeNode::Categorical { feature, left, right, .. } => (feature, *left, *right),
            };
            check_feature_name(feature)?;
            for child in [left, right] {
                if child <= i || child >= self.nodes.len() {
                    return Err(ModelError::Malformed(format!(
                        "node {i} has invalid child {child} (tree has {} nodes)",
                        self.nodes.len()
                    )));
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let mut idx = 0;
        // Bounded walk: a validated tree reaches a leaf in fewer steps.
        for _ in 0..self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| ModelError::Malformed(format!("node index {idx} out of range")))?;
            idx = match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split { feature: name, threshold, left, right } => {
                    if feature(features, name)? <= *threshold {
                        *left
                    } else {
                        *right
                    }
                }
                TreeNode::Categorical { feature: name, categories, left, right } => {
                    #[allow(clippy::cast_possible_truncation)]
                    let code = feature(features, name)?.round() as i64;
                    if categories.contains(&code) {
                        *left
                    } else {
                        *right
                    }
                }
            };
        }
        Err(ModelError::Malformed("tree walk did not reach a leaf".to_string()))
    }
}
