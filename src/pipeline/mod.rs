//! Composition Optimization Pipeline
//!
//! ```text
//! STEP 1: Grade lookup          (GradeCatalog, UnknownGrade -> client error)
//! STEP 2: Composition checks    (finite, within per-element input range)
//! STEP 3: Model lookup          (ModelRegistry, NotFound)
//! STEP 4: Feature construction  (FeatureBuilder + CategoricalCodec)
//! STEP 5: Ensemble prediction   (EnsemblePredictor, per element on rayon)
//! STEP 6: Scoring               (EfficiencyScorer)
//! STEP 7: Summary               (RecommendationEngine)
//! ```
//!
//! Any failure aborts the request; no partial report is ever returned.
//! The optimizer holds only read-only state and is shared across requests.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{CatalogError, Grade, GradeCatalog};
use crate::config::{defaults::DEFAULT_CURRENCY, ConfigError, OptimizerConfig};
use crate::ensemble::{LoadedModel, ModelError, ModelRegistry};
use crate::features::FeatureBuilder;
use crate::optimization::{EfficiencyScorer, RecommendationEngine, ScoringSettings};
use crate::types::{
    Composition, CostAnalysis, ElementSymbol, OptimizationReport, OptimizationRequest,
    OptimizationTotals, PredictionResult,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Invalid {element} value {value}: {reason}")]
    InvalidComposition {
        element: ElementSymbol,
        value: f64,
        reason: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PipelineError {
    /// Caused by the request rather than by the server's models.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::InvalidComposition { .. })
    }
}

/// Reject non-finite, negative or implausibly large measurements.
pub fn validate_composition(composition: &Composition) -> Result<(), PipelineError> {
    for (element, &value) in composition.iter() {
        let max = element.max_input_percent();
        let reason = if !value.is_finite() {
            "must be a finite number".to_string()
        } else if value < 0.0 {
            "must not be negative".to_string()
        } else if value > max {
            format!("exceeds the accepted maximum of {max}%")
        } else {
            continue;
        };
        return Err(PipelineError::InvalidComposition {
            element,
            value,
            reason,
        });
    }
    Ok(())
}

/// Runs optimization requests against a frozen catalog and model registry.
#[derive(Debug, Clone)]
pub struct CompositionOptimizer {
    catalog: Arc<GradeCatalog>,
    registry: Arc<ModelRegistry>,
    scorer: EfficiencyScorer,
    engine: RecommendationEngine,
    currency: String,
}

impl CompositionOptimizer {
    pub fn new(catalog: GradeCatalog, registry: Arc<ModelRegistry>, settings: ScoringSettings) -> Self {
        Self {
            catalog: Arc::new(catalog),
            registry,
            scorer: EfficiencyScorer::new(settings),
            engine: RecommendationEngine::new(settings),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Build from configuration: catalog overrides, thresholds and currency.
    pub fn from_config(
        config: &OptimizerConfig,
        registry: Arc<ModelRegistry>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config.build_catalog()?, registry, config.scoring_settings())
            .with_currency(config.cost.currency.clone()))
    }

    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn catalog(&self) -> &GradeCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Target composition of a grade. Pure catalog read, no inference.
    pub fn targets(&self, grade: &str) -> Result<Composition, PipelineError> {
        Ok(self.catalog.targets_for(grade)?)
    }

    /// Grade record plus the model that serves it.
    pub fn resolve(&self, grade: &str) -> Result<(&Grade, Arc<LoadedModel>), PipelineError> {
        let grade = self.catalog.get(grade)?;
        let model = self.registry.get(grade.model_key)?;
        Ok((grade, model))
    }

    /// Run the full pipeline for one request.
    pub fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationReport, PipelineError> {
        let grade = self.catalog.get(&request.grade)?;
        validate_composition(&request.composition)?;
        let model = self.registry.get(grade.model_key)?;

        info!(
            grade = grade.id,
            furnace = %request.furnace_id,
            model = grade.model_key,
            "Optimizing composition"
        );

        let features =
            FeatureBuilder::new(&model.codec).build(&request.composition, grade, &request.furnace_id);
        let predictions = model.predictor.predict(&features)?;

        let results: Vec<PredictionResult> = ElementSymbol::ALL
            .into_iter()
            .map(|element| {
                let current = request.composition[element];
                let target = grade.targets[element];
                let predicted = predictions[element];
                let sensitive = grade.sensitivity(element);
                let score = self.scorer.score(
                    current,
                    target,
                    predicted,
                    grade.is_zero_target(element),
                    sensitive,
                );
                debug!(
                    element = %element,
                    current,
                    target,
                    predicted,
                    efficiency = score.efficiency,
                    "Element scored"
                );
                PredictionResult {
                    element,
                    current,
                    target,
                    predicted_config: predicted,
                    adjustment: predicted - current,
                    efficiency: score.efficiency,
                    status: score.status,
                    priority: score.priority,
                    sensitive: sensitive.is_some(),
                }
            })
            .collect();

        let summary = self.engine.summarize(&results, &grade.parameters);

        info!(
            grade = grade.id,
            average_efficiency = summary.average_efficiency,
            cost_impact = summary.cost_impact,
            directives = summary.cost_breakdown.len(),
            "Optimization complete"
        );

        Ok(OptimizationReport {
            grade: grade.id.to_string(),
            furnace_id: request.furnace_id.clone(),
            target_specifications: grade.targets,
            totals: OptimizationTotals {
                total_adjustment: summary.total_adjustment,
                cost_impact: summary.cost_impact,
                high_efficiency_count: summary.high_efficiency_count,
                total_elements: results.len(),
                average_efficiency: summary.average_efficiency,
            },
            element_predictions: results,
            cost_analysis: CostAnalysis {
                total_cost_impact_per_tonne: summary.cost_impact,
                currency: self.currency.clone(),
                breakdown: summary.cost_breakdown,
            },
            recommendations: summary.recommendations,
            critical_elements: summary.critical_elements,
            model_performance: model.performance.clone(),
            warnings: features.warnings().iter().map(ToString::to_string).collect(),
        })
    }
}
