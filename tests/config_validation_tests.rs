//! Config Validation Tests
//!
//! Typo detection and range validation for `alloymind.toml`, exercised
//! independently from the rest of the pipeline.

use alloymind::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use alloymind::config::{ConfigError, OptimizerConfig};
use alloymind::{ElementSymbol, Priority};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_scoring_key_warns_with_suggestion() {
    let toml_str = r#"
[scoring]
high_efficency_percent = 85.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("high_efficency_percent"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("scoring.high_efficiency_percent")
    );
}

#[test]
fn typo_in_section_name_warns() {
    let toml_str = r#"
[scorng]
negligible_adjustment = 0.002
"#;
    let warnings = validate_unknown_keys(toml_str);
    // Both the section and its child are unknown
    assert_eq!(warnings.len(), 2);
    let section = warnings.iter().find(|w| w.field == "scorng").unwrap();
    assert_eq!(section.suggestion.as_deref(), Some("scoring"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[server]
addr = "127.0.0.1:9000"

[models]
dir = "/var/lib/alloymind/models"

[models.files]
MULTI_GRADE = "multi.json"
CUSTOM_KEY = "custom.json"

[scoring]
high_efficiency_percent = 85.0
negligible_adjustment = 0.002
zero_target_tolerance = 0.0005

[priority]
medium_cutoff = 0.05

[[priority.sensitive]]
grade = "ASTMA395_UPDATED"
element = "Mn"
high_threshold = 0.1
below = "MED"

[cost]
currency = "EUR"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn unknown_key_far_from_everything_has_no_suggestion() {
    let warnings = validate_unknown_keys("[telemetry]\nendpoint = \"x\"\n");
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn suggestion_picks_closest_key() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("cost.curency", &known).as_deref(),
        Some("cost.currency")
    );
    assert_eq!(suggest_correction("zzzzzzzz", &known), None);
}

#[test]
fn unknown_keys_do_not_break_loading() {
    let config = OptimizerConfig::from_toml_str("[cost]\ncurrancy = \"EUR\"\n").unwrap();
    assert_eq!(config.cost.currency, "USD");
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_passes_range_checks() {
    let (errors, warnings) = validate_ranges(&OptimizerConfig::default());
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty());
}

#[test]
fn efficiency_above_100_is_error() {
    let toml_str = "[scoring]\nhigh_efficiency_percent = 120.0\n";
    match OptimizerConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("exceeds 100")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn negative_cutoff_is_error() {
    let mut config = OptimizerConfig::default();
    config.priority.medium_cutoff = -0.1;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("priority.medium_cutoff")));
}

#[test]
fn bad_server_addr_is_error() {
    let mut config = OptimizerConfig::default();
    config.server.addr = "localhost".to_string();
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("server.addr")));
}

#[test]
fn sensitive_entry_for_unknown_grade_is_error() {
    let toml_str = r#"
[[priority.sensitive]]
grade = "GJS-400"
element = "Mn"
high_threshold = 0.1
"#;
    assert!(matches!(
        OptimizerConfig::from_toml_str(toml_str),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn duplicate_sensitive_entry_is_error() {
    let toml_str = r#"
[[priority.sensitive]]
grade = "ASTMA395_UPDATED"
element = "Mn"
high_threshold = 0.1

[[priority.sensitive]]
grade = "astma395_updated"
element = "Mn"
high_threshold = 0.2
"#;
    assert!(OptimizerConfig::from_toml_str(toml_str).is_err());
}

#[test]
fn unknown_element_is_parse_error() {
    let toml_str = r#"
[[priority.sensitive]]
grade = "EN1563"
element = "Fe"
high_threshold = 0.1
"#;
    assert!(matches!(
        OptimizerConfig::from_toml_str(toml_str),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn negligible_above_cutoff_only_warns() {
    let mut config = OptimizerConfig::default();
    config.scoring.negligible_adjustment = 0.5;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "scoring.negligible_adjustment");
}

// ============================================================================
// Round trip and catalog overrides
// ============================================================================

#[test]
fn toml_roundtrip_preserves_values() {
    let mut config = OptimizerConfig::default();
    config.scoring.high_efficiency_percent = 75.0;
    config.cost.currency = "EUR".to_string();

    let text = config.to_toml().unwrap();
    let parsed = OptimizerConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed.scoring.high_efficiency_percent, 75.0);
    assert_eq!(parsed.cost.currency, "EUR");
    assert_eq!(parsed.priority.sensitive, config.priority.sensitive);
    assert_eq!(parsed.models.files, config.models.files);
}

#[test]
fn default_sensitive_list_matches_builtin_catalog() {
    let config = OptimizerConfig::default();
    let catalog = config.build_catalog().unwrap();
    let a395u = catalog.get("ASTMA395_UPDATED").unwrap();
    assert_eq!(a395u.sensitivity(ElementSymbol::Mn).map(|s| s.high_threshold), Some(0.1));
    assert_eq!(a395u.sensitivity(ElementSymbol::P).map(|s| s.high_threshold), Some(0.005));
    assert!(catalog.get("EN1563").unwrap().sensitive.is_empty());
    assert_eq!(
        a395u.sensitivity(ElementSymbol::Mn).and_then(|s| s.below),
        Some(Priority::Medium)
    );
    assert_eq!(a395u.sensitivity(ElementSymbol::P).and_then(|s| s.below), None);
}

#[test]
fn sensitive_floor_is_read_from_toml() {
    let toml_str = r#"
[[priority.sensitive]]
grade = "EN1563"
element = "Cu"
high_threshold = 0.2
below = "MED"
"#;
    let config = OptimizerConfig::from_toml_str(toml_str).unwrap();
    let catalog = config.build_catalog().unwrap();
    let cu = catalog.get("EN1563").unwrap().sensitivity(ElementSymbol::Cu).copied();
    assert_eq!(cu.and_then(|s| s.below), Some(Priority::Medium));

    let text = config.to_toml().unwrap();
    assert!(text.contains("below = \"MED\""), "{text}");
}

#[test]
fn load_from_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alloymind.toml");
    std::fs::write(&path, "[scoring\nbroken").unwrap();

    let err = OptimizerConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
    assert!(err.to_string().contains("alloymind.toml"));

    std::fs::write(&path, "[cost]\ncurrency = \"GBP\"\n").unwrap();
    let config = OptimizerConfig::load_from_file(&path).unwrap();
    assert_eq!(config.cost.currency, "GBP");
}

#[test]
fn global_config_is_set_once() {
    let mut first = OptimizerConfig::default();
    first.cost.currency = "EUR".to_string();
    alloymind::config::init(first);
    assert!(alloymind::config::is_initialized());

    // A second init is ignored
    alloymind::config::init(OptimizerConfig::default());
    assert_eq!(alloymind::config::get().cost.currency, "EUR");
}
