//! Config validation: unknown-key detection with Levenshtein suggestions
//! and threshold range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never break a config.

use std::collections::HashSet;
use std::net::SocketAddr;

use super::OptimizerConfig;
use crate::catalog::GradeCatalog;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Valid dotted key paths for `OptimizerConfig`.
///
/// Kept in step with the structs in `optimizer_config.rs` by hand.
/// Entries of `[models.files]` and `[[priority.sensitive]]` are not walked.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [server]
        "server",
        "server.addr",
        // [models]
        "models",
        "models.dir",
        "models.files",
        // [scoring]
        "scoring",
        "scoring.high_efficiency_percent",
        "scoring.negligible_adjustment",
        "scoring.zero_target_tolerance",
        // [priority]
        "priority",
        "priority.medium_cutoff",
        "priority.sensitive",
        // [cost]
        "cost",
        "cost.currency",
    ];
    keys.iter().copied().collect()
}

/// Tables whose children are user-defined keys.
const OPEN_TABLES: &[&str] = &["models.files"];

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() && !OPEN_TABLES.contains(&path.as_str()) {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for unknown keys in a raw TOML document.
///
/// Parse errors are left to the serde pass.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

fn check_threshold(name: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{name} = {value} must be finite and non-negative"));
    }
}

/// Validate ranges and references on a parsed config.
///
/// Returns (errors, warnings); errors must prevent startup.
pub fn validate_ranges(config: &OptimizerConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.server.addr.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "server.addr = '{}' is not a valid socket address",
            config.server.addr
        ));
    }

    let s = &config.scoring;
    check_threshold("scoring.high_efficiency_percent", s.high_efficiency_percent, &mut errors);
    check_threshold("scoring.negligible_adjustment", s.negligible_adjustment, &mut errors);
    check_threshold("scoring.zero_target_tolerance", s.zero_target_tolerance, &mut errors);
    check_threshold("priority.medium_cutoff", config.priority.medium_cutoff, &mut errors);
    if s.high_efficiency_percent > 100.0 {
        errors.push(format!(
            "scoring.high_efficiency_percent = {} exceeds 100",
            s.high_efficiency_percent
        ));
    }

    if s.negligible_adjustment > config.priority.medium_cutoff {
        warnings.push(ValidationWarning {
            field: "scoring.negligible_adjustment".to_string(),
            message: format!(
                "negligible_adjustment ({}) is above medium_cutoff ({}); MED directives will never be emitted",
                s.negligible_adjustment, config.priority.medium_cutoff
            ),
            suggestion: None,
        });
    }

    let catalog = GradeCatalog::builtin();
    let mut seen = HashSet::new();
    for (i, entry) in config.priority.sensitive.iter().enumerate() {
        check_threshold(
            &format!("priority.sensitive[{i}].high_threshold"),
            entry.high_threshold,
            &mut errors,
        );
        match catalog.get(&entry.grade) {
            Ok(grade) => {
                if !seen.insert((grade.id, entry.element)) {
                    errors.push(format!(
                        "priority.sensitive[{i}]: {} {} listed more than once",
                        grade.id, entry.element
                    ));
                }
            }
            Err(e) => errors.push(format!("priority.sensitive[{i}]: {e}")),
        }
    }

    if config.cost.currency.trim().is_empty() {
        errors.push("cost.currency must not be empty".to_string());
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensitiveOverride;
    use crate::types::ElementSymbol;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("scoring", "scoring"), 0);
        assert_eq!(levenshtein("scoring", "scorng"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let value: toml::Value = "[models]\ndir = \"x\"\n[models.files]\nMULTI_GRADE = \"a.json\"\n"
            .parse()
            .unwrap();
        let mut keys = walk_toml_keys(&value, "");
        keys.sort();
        assert_eq!(keys, vec!["models", "models.dir", "models.files"]);
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[scoring]\nnegligable_adjustment = 0.002\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "scoring.negligable_adjustment");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("scoring.negligible_adjustment")
        );
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        assert!(suggest_correction("zzzzzzzzzzzz", &known_config_keys()).is_none());
    }

    #[test]
    fn test_defaults_clean() {
        let (errors, warnings) = validate_ranges(&OptimizerConfig::default());
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unknown_grade_in_sensitive_entry() {
        let mut config = OptimizerConfig::default();
        config.priority.sensitive.push(SensitiveOverride {
            grade: "GJS-400".to_string(),
            element: ElementSymbol::Mn,
            high_threshold: 0.1,
            below: None,
        });
        let (errors, _) = validate_ranges(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("GJS-400"));
    }

    #[test]
    fn test_duplicate_sensitive_entry() {
        let mut config = OptimizerConfig::default();
        let dup = config.priority.sensitive[0].clone();
        config.priority.sensitive.push(dup);
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("more than once")));
    }

    #[test]
    fn test_bad_addr_and_nan_threshold() {
        let mut config = OptimizerConfig::default();
        config.server.addr = "localhost".to_string();
        config.scoring.negligible_adjustment = f64::NAN;
        let (errors, _) = validate_ranges(&config);
        assert_eq!(errors.len(), 2);
    }
}
