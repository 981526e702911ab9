//! Per-element operating parameters attached to a grade

use serde::{Deserialize, Serialize};

use super::ElementMap;

/// Operating window and economics for one element within a grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementParameters {
    /// Lower bound of the operating range (%)
    pub min: f64,
    /// Upper bound of the operating range (%)
    pub max: f64,
    /// Share of an addition that actually enters the melt (%)
    pub absorption_rate: f64,
    /// Cost per unit mass of the addition
    pub cost_per_unit: f64,
    /// Lower bound of the target band (%)
    pub target_min: f64,
    /// Upper bound of the target band (%)
    pub target_max: f64,
}

impl ElementParameters {
    /// Parameters whose target band equals the operating range.
    pub const fn new(min: f64, max: f64, absorption_rate: f64, cost_per_unit: f64) -> Self {
        Self {
            min,
            max,
            absorption_rate,
            cost_per_unit,
            target_min: min,
            target_max: max,
        }
    }
}

/// Parameters for all seven elements of a grade.
pub type GradeParameters = ElementMap<ElementParameters>;
