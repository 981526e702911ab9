//! System-wide default constants.
//!
//! Values the pipeline falls back to when no configuration overrides them.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address. Overridden by `[server] addr` or `--addr`.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8000";

/// Env var holding a comma-separated list of allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "ALLOYMIND_CORS_ORIGINS";

// ============================================================================
// Configuration
// ============================================================================

/// Env var pointing at a configuration file.
pub const CONFIG_PATH_ENV: &str = "ALLOYMIND_CONFIG";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "alloymind.toml";

// ============================================================================
// Model Bundles
// ============================================================================

/// Directory bundles are loaded from.
pub const DEFAULT_MODELS_DIR: &str = "./models";

/// Blend weights used when a bundle does not state its own.
pub const DEFAULT_ENSEMBLE_WEIGHTS: [f64; 2] = [0.5, 0.5];

// ============================================================================
// Feature Construction
// ============================================================================

/// Guards `Ratio` and `PctChange` against division by a zero current value.
pub const FEATURE_EPSILON: f64 = 1e-8;

/// Code substituted for categorical values the encoder never saw.
pub const DEFAULT_CATEGORY_CODE: i64 = 0;

/// Furnace used when a request omits one.
pub const DEFAULT_FURNACE_ID: &str = "F01";

// ============================================================================
// Scoring
// ============================================================================

/// Status is Good strictly above this efficiency (%).
pub const GOOD_EFFICIENCY_PERCENT: f64 = 80.0;

/// Status is Fair strictly above this efficiency (%), Poor otherwise.
pub const FAIR_EFFICIENCY_PERCENT: f64 = 50.0;

/// Elements above this efficiency count towards `high_efficiency_count` (%).
pub const HIGH_EFFICIENCY_PERCENT: f64 = 80.0;

/// Current and target closer than this are treated as equal.
pub const GAP_TOLERANCE: f64 = 1e-6;

/// A zero-target element at or below this level is already on target (%).
pub const ZERO_TARGET_TOLERANCE: f64 = 0.001;

/// Adjustments at or below this magnitude produce no directive (%).
pub const NEGLIGIBLE_ADJUSTMENT: f64 = 0.001;

/// Generic priority boundary: MED above, LOW at or below (%).
pub const MEDIUM_PRIORITY_CUTOFF: f64 = 0.1;

// ============================================================================
// Cost
// ============================================================================

pub const DEFAULT_CURRENCY: &str = "USD";
