//! AlloyMind: ductile iron composition optimization
//!
//! Predicts corrective element configurations for a melt and turns them into
//! prioritized, costed adjustment directives.
//!
//! ## Architecture
//!
//! - **Catalog**: supported grades with target compositions and parameters
//! - **Features**: deterministic feature vectors plus categorical encoding
//! - **Ensemble**: scaled and raw regression backends blended per element
//! - **Optimization**: efficiency scoring and recommendation summaries
//! - **Pipeline**: one request from grade lookup to report
//! - **API**: axum HTTP surface over the pipeline

pub mod api;
pub mod catalog;
pub mod config;
pub mod ensemble;
pub mod features;
pub mod optimization;
pub mod pipeline;
pub mod types;

pub use config::OptimizerConfig;

pub use catalog::{CatalogError, Grade, GradeCatalog};
pub use ensemble::{EnsembleModelBundle, EnsemblePredictor, ModelError, ModelRegistry};
pub use features::{CategoricalCodec, FeatureBuilder, FeatureVector};
pub use optimization::{EfficiencyScorer, RecommendationEngine};
pub use pipeline::{CompositionOptimizer, PipelineError};
pub use types::{
    Composition, ElementSymbol, OptimizationReport, OptimizationRequest, PredictionResult,
    Priority, Status,
};
