//! Recommendation Engine
//!
//! Aggregates scored element predictions into operator directives, cost
//! impact and summary figures.

use statrs::statistics::Statistics;

use super::ScoringSettings;
use crate::types::{CostLine, ElementSymbol, GradeParameters, PredictionResult, Status};

/// Emitted when no element needs a non-negligible adjustment.
pub const OPTIMIZED_MARKER: &str = "Current composition is well-optimized";

/// Aggregated view over all scored elements of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSummary {
    pub recommendations: Vec<String>,
    /// Sum of absolute adjustments (%)
    pub total_adjustment: f64,
    /// Sum of `|adjustment| * cost_per_unit` across all elements
    pub cost_impact: f64,
    pub high_efficiency_count: usize,
    /// Unweighted mean over all elements
    pub average_efficiency: f64,
    /// Per-element cost of the non-negligible adjustments
    pub cost_breakdown: Vec<CostLine>,
    /// Elements with Poor status
    pub critical_elements: Vec<ElementSymbol>,
}

/// Turns scored results into directives and totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEngine {
    settings: ScoringSettings,
}

impl RecommendationEngine {
    pub const fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }

    pub fn summarize(
        &self,
        results: &[PredictionResult],
        parameters: &GradeParameters,
    ) -> RecommendationSummary {
        let mut recommendations = Vec::new();
        let mut cost_breakdown = Vec::new();
        let mut total_adjustment = 0.0;
        let mut cost_impact = 0.0;

        for r in results {
            let magnitude = r.adjustment.abs();
            let line_cost = magnitude * parameters[r.element].cost_per_unit;
            total_adjustment += magnitude;
            cost_impact += line_cost;

            if magnitude > self.settings.negligible_adjustment {
                recommendations.push(directive(r));
                cost_breakdown.push(CostLine {
                    element: r.element,
                    adjustment: r.adjustment,
                    cost_impact: line_cost,
                });
            }
        }

        if recommendations.is_empty() {
            recommendations.push(OPTIMIZED_MARKER.to_string());
        }

        let average_efficiency = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.efficiency).mean()
        };

        RecommendationSummary {
            recommendations,
            total_adjustment,
            cost_impact,
            high_efficiency_count: results
                .iter()
                .filter(|r| r.efficiency > self.settings.high_efficiency_percent)
                .count(),
            average_efficiency,
            cost_breakdown,
            critical_elements: results
                .iter()
                .filter(|r| r.status == Status::Poor)
                .map(|r| r.element)
                .collect(),
        }
    }
}

/// `"Mn: Add 0.5000% (from 0.2250% to 0.7250%) - HIGH"`
fn directive(r: &PredictionResult) -> String {
    let action = if r.adjustment > 0.0 { "Add" } else { "Reduce" };
    format!(
        "{}: {action} {:.4}% (from {:.4}% to {:.4}%) - {}",
        r.element,
        r.adjustment.abs(),
        r.current,
        r.predicted_config,
        r.priority
    )
}
