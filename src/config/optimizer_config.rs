//! Optimizer Configuration
//!
//! TOML-backed configuration for the serving process. Every section has
//! `Default` values matching the built-in constants, so an empty file (or no
//! file at all) yields the reference behavior.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::catalog::{
    GradeCatalog, SensitiveElement, ASTMA395_UPDATED_MODEL, ASTMA536_UPDATED_MODEL,
    MULTI_GRADE_MODEL,
};
use crate::ensemble::JsonDirectoryLoader;
use crate::optimization::ScoringSettings;
use crate::types::{ElementSymbol, Priority};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Model bundle locations
    #[serde(default)]
    pub models: ModelsConfig,

    /// Efficiency and recommendation thresholds
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Priority tagging
    #[serde(default)]
    pub priority: PriorityConfig,

    #[serde(default)]
    pub cost: CostConfig,
}

impl OptimizerConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ALLOYMIND_CONFIG` environment variable
    /// 2. `./alloymind.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", defaults::CONFIG_PATH_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_PATH_ENV);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_PATH_ENV);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged, not fatal.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate thresholds and references.
    ///
    /// Rules:
    /// - Thresholds must be finite and non-negative
    /// - `high_efficiency_percent` must lie within 0-100
    /// - Sensitive entries must name a supported grade, once per element
    /// - The server address must parse as a socket address
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Thresholds handed to the scorer and recommendation engine.
    pub const fn scoring_settings(&self) -> ScoringSettings {
        ScoringSettings {
            high_efficiency_percent: self.scoring.high_efficiency_percent,
            negligible_adjustment: self.scoring.negligible_adjustment,
            zero_target_tolerance: self.scoring.zero_target_tolerance,
            medium_cutoff: self.priority.medium_cutoff,
        }
    }

    /// Built-in catalog with the configured sensitive elements applied.
    ///
    /// Grades named in `[[priority.sensitive]]` get exactly the listed
    /// elements; grades not named keep their built-in designation.
    pub fn build_catalog(&self) -> Result<GradeCatalog, ConfigError> {
        let mut by_grade: BTreeMap<String, Vec<SensitiveElement>> = BTreeMap::new();
        for entry in &self.priority.sensitive {
            by_grade
                .entry(entry.grade.trim().to_ascii_uppercase())
                .or_default()
                .push(SensitiveElement {
                    element: entry.element,
                    high_threshold: entry.high_threshold,
                    below: entry.below,
                });
        }

        let mut catalog = GradeCatalog::builtin();
        for (grade, sensitive) in by_grade {
            catalog
                .set_sensitive(&grade, sensitive)
                .map_err(|e| ConfigError::Validation(vec![e.to_string()]))?;
        }
        Ok(catalog)
    }

    /// Loader for the configured bundle directory.
    pub fn bundle_loader(&self) -> JsonDirectoryLoader {
        JsonDirectoryLoader::new(&self.models.dir, self.models.files.clone())
    }
}

// ============================================================================
// Error
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => write!(f, "Config parse error ({}): {}", path.display(), e),
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Can be overridden by the `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::DEFAULT_SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

/// Where model bundles live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,

    /// Model key to bundle file name
    #[serde(default = "default_model_files")]
    pub files: BTreeMap<String, String>,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_MODELS_DIR)
}

fn default_model_files() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            MULTI_GRADE_MODEL.to_string(),
            "element_config_ensemble_model.json".to_string(),
        ),
        (
            ASTMA536_UPDATED_MODEL.to_string(),
            "astma536_updated_ensemble_model.json".to_string(),
        ),
        (
            ASTMA395_UPDATED_MODEL.to_string(),
            "astma395_updated_ensemble_model.json".to_string(),
        ),
    ])
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            files: default_model_files(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_high_efficiency")]
    pub high_efficiency_percent: f64,
    #[serde(default = "default_negligible")]
    pub negligible_adjustment: f64,
    #[serde(default = "default_zero_target_tolerance")]
    pub zero_target_tolerance: f64,
}

const fn default_high_efficiency() -> f64 {
    defaults::HIGH_EFFICIENCY_PERCENT
}

const fn default_negligible() -> f64 {
    defaults::NEGLIGIBLE_ADJUSTMENT
}

const fn default_zero_target_tolerance() -> f64 {
    defaults::ZERO_TARGET_TOLERANCE
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_efficiency_percent: default_high_efficiency(),
            negligible_adjustment: default_negligible(),
            zero_target_tolerance: default_zero_target_tolerance(),
        }
    }
}

/// One `[[priority.sensitive]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveOverride {
    pub grade: String,
    pub element: ElementSymbol,
    pub high_threshold: f64,
    /// Priority at or below the threshold (`"LOW"`, `"MED"` or `"HIGH"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<Priority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityConfig {
    #[serde(default = "default_medium_cutoff")]
    pub medium_cutoff: f64,

    #[serde(default = "default_sensitive")]
    pub sensitive: Vec<SensitiveOverride>,
}

const fn default_medium_cutoff() -> f64 {
    defaults::MEDIUM_PRIORITY_CUTOFF
}

/// Mirrors the built-in catalog designations.
fn default_sensitive() -> Vec<SensitiveOverride> {
    GradeCatalog::builtin()
        .grades()
        .flat_map(|g| {
            g.sensitive.iter().map(|s| SensitiveOverride {
                grade: g.id.to_string(),
                element: s.element,
                high_threshold: s.high_threshold,
                below: s.below,
            })
        })
        .collect()
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            medium_cutoff: default_medium_cutoff(),
            sensitive: default_sensitive(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    defaults::DEFAULT_CURRENCY.to_string()
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config = OptimizerConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:8000");
        assert_eq!(config.models.files.len(), 3);
        assert_eq!(config.priority.sensitive.len(), 3);
        assert_eq!(config.scoring_settings(), ScoringSettings::default());
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[scoring]
high_efficiency_percent = 90.0

[cost]
currency = "EUR"
"#;
        let config = OptimizerConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.scoring.high_efficiency_percent, 90.0);
        assert_eq!(config.scoring.negligible_adjustment, 0.001);
        assert_eq!(config.cost.currency, "EUR");
    }

    #[test]
    fn test_sensitive_override_replaces_grade_list() {
        let toml_str = r#"
[[priority.sensitive]]
grade = "astma395_updated"
element = "Mn"
high_threshold = 0.3
"#;
        let config = OptimizerConfig::from_toml_str(toml_str).unwrap();
        let catalog = config.build_catalog().unwrap();

        let a395u = catalog.get("ASTMA395_UPDATED").unwrap();
        assert_eq!(a395u.sensitive.len(), 1);
        assert_eq!(a395u.sensitive[0].high_threshold, 0.3);
        // Not named in the file, keeps its built-in designation
        let a536u = catalog.get("ASTMA536_UPDATED").unwrap();
        assert!(a536u.sensitivity(ElementSymbol::P).is_some());

        let scorer = crate::optimization::EfficiencyScorer::new(config.scoring_settings());
        assert_eq!(scorer.priority(0.2, a395u.sensitivity(ElementSymbol::Mn)), Priority::Medium);
    }

    #[test]
    fn test_validation_catches_negative_threshold() {
        let toml_str = r#"
[priority]
medium_cutoff = -0.1
"#;
        assert!(matches!(
            OptimizerConfig::from_toml_str(toml_str),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = OptimizerConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = OptimizerConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.server.addr, config.server.addr);
        assert_eq!(parsed.priority.sensitive, config.priority.sensitive);
        assert_eq!(parsed.models.files, config.models.files);
    }
}
