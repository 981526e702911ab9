//! Composition Optimization Scoring
//!
//! Turns blended ensemble predictions into per-element efficiency scores,
//! status tiers and priorities, then aggregates them into directives and
//! cost figures. Entirely algorithmic; no model calls happen here.

mod recommendation;
mod scoring;

pub use recommendation::{RecommendationEngine, RecommendationSummary, OPTIMIZED_MARKER};
pub use scoring::{EfficiencyScorer, ElementScore, ScoringSettings};
