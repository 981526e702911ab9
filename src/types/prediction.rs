//! Prediction and report types produced by the optimization pipeline

use serde::{Deserialize, Serialize};

use super::{Composition, ElementSymbol};
use crate::config::defaults::{FAIR_EFFICIENCY_PERCENT, GOOD_EFFICIENCY_PERCENT};

/// Efficiency tier for a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// efficiency > 80
    Good,
    /// 50 < efficiency <= 80
    Fair,
    /// efficiency <= 50
    Poor,
}

impl Status {
    pub fn from_efficiency(efficiency: f64) -> Self {
        if efficiency > GOOD_EFFICIENCY_PERCENT {
            Self::Good
        } else if efficiency > FAIR_EFFICIENCY_PERCENT {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => write!(f, "Good"),
            Self::Fair => write!(f, "Fair"),
            Self::Poor => write!(f, "Poor"),
        }
    }
}

/// Urgency tag attached to an adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[serde(rename = "MED")]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MED"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Scored prediction for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub element: ElementSymbol,
    /// Measured percentage
    pub current: f64,
    /// Grade target percentage
    pub target: f64,
    /// Blended ensemble output
    pub predicted_config: f64,
    /// `predicted_config - current`
    pub adjustment: f64,
    /// 0-100
    pub efficiency: f64,
    pub status: Status,
    pub priority: Priority,
    /// Element is designated sensitive for the active grade
    #[serde(default)]
    pub sensitive: bool,
}

/// Aggregate figures across all seven elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationTotals {
    /// Sum of absolute adjustments (%)
    pub total_adjustment: f64,
    /// Sum of `|adjustment| * cost_per_unit`
    pub cost_impact: f64,
    /// Elements with efficiency above the high-efficiency threshold
    pub high_efficiency_count: usize,
    pub total_elements: usize,
    /// Unweighted mean efficiency
    pub average_efficiency: f64,
}

/// Cost contribution of a single non-negligible adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub element: ElementSymbol,
    pub adjustment: f64,
    pub cost_impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub total_cost_impact_per_tonne: f64,
    pub currency: String,
    pub breakdown: Vec<CostLine>,
}

/// Training-time quality figures carried by the model bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    /// Mean r2 across predicted targets
    pub r2_score: f64,
    pub accuracy_percentage: f64,
    pub elements_predicted: usize,
}

/// Full response for one optimization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub grade: String,
    pub furnace_id: String,
    pub target_specifications: Composition,
    /// Always seven entries, canonical order
    pub element_predictions: Vec<PredictionResult>,
    pub totals: OptimizationTotals,
    pub cost_analysis: CostAnalysis,
    pub recommendations: Vec<String>,
    /// Elements whose status is Poor
    pub critical_elements: Vec<ElementSymbol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_performance: Option<ModelPerformance>,
    /// Non-fatal diagnostics, e.g. an unknown furnace encoded as default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn default_furnace() -> String {
    crate::config::defaults::DEFAULT_FURNACE_ID.to_string()
}

/// Request accepted from the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    #[serde(alias = "alloy_grade")]
    pub grade: String,
    #[serde(alias = "current_composition")]
    pub composition: Composition,
    #[serde(default = "default_furnace", alias = "furnace")]
    pub furnace_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tiers() {
        assert_eq!(Status::from_efficiency(100.0), Status::Good);
        assert_eq!(Status::from_efficiency(80.01), Status::Good);
        assert_eq!(Status::from_efficiency(80.0), Status::Fair);
        assert_eq!(Status::from_efficiency(50.01), Status::Fair);
        assert_eq!(Status::from_efficiency(50.0), Status::Poor);
        assert_eq!(Status::from_efficiency(0.0), Status::Poor);
    }

    #[test]
    fn test_priority_wire_names() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"MED\"");
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"HIGH\"");
        assert_eq!(Priority::Low.to_string(), "LOW");
    }

    #[test]
    fn test_request_accepts_legacy_field_names() {
        let body = r#"{
            "alloy_grade": "EN1563",
            "current_composition": {"C": 3.5, "Si": 2.5, "Mn": 0.2, "P": 0.05, "S": 0.01, "Cu": 0.3, "Mg": 0.045}
        }"#;
        let req: OptimizationRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.grade, "EN1563");
        assert_eq!(req.furnace_id, "F01");
    }
}
