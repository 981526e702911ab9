//! Grade Catalog
//!
//! Static registry of supported grades. Each grade carries its target
//! composition, per-element operating parameters, the model bundle that
//! serves it, the categorical code its encoder expects, and the elements
//! whose adjustments are escalated to high priority.

mod grades;

pub use grades::{
    ASTMA395_UPDATED_MODEL, ASTMA536_UPDATED_MODEL, MULTI_GRADE_MODEL, SUPPORTED_GRADES,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::{Composition, ElementSymbol, GradeParameters, Priority};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unsupported grade: {0}. Supported: {supported}", supported = SUPPORTED_GRADES.join(", "))]
    UnknownGrade(String),
}

/// Element whose adjustments above `high_threshold` are always high priority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitiveElement {
    pub element: ElementSymbol,
    /// Adjustment magnitude (%) above which the element is tagged HIGH
    pub high_threshold: f64,
    /// Priority at or below `high_threshold`; `None` uses the generic rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<Priority>,
}

/// One registered grade. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub id: &'static str,
    /// Code passed to the grade encoder
    pub grade_code: &'static str,
    /// Key of the model bundle that serves this grade
    pub model_key: &'static str,
    pub description: &'static str,
    /// Standard grade an updated variant is compared against
    pub base_grade: Option<&'static str>,
    pub targets: Composition,
    pub parameters: GradeParameters,
    pub sensitive: Vec<SensitiveElement>,
}

impl Grade {
    /// Zero-target policy applies when the grade target is exactly zero.
    pub fn is_zero_target(&self, element: ElementSymbol) -> bool {
        self.targets[element] == 0.0
    }

    pub fn sensitivity(&self, element: ElementSymbol) -> Option<&SensitiveElement> {
        self.sensitive.iter().find(|s| s.element == element)
    }
}

/// Direction of a target change between two grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetChange {
    Same,
    Increased,
    Decreased,
    /// Target driven to exactly zero
    ToZero,
}

impl std::fmt::Display for TargetChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Same => write!(f, "SAME"),
            Self::Increased => write!(f, "INCREASE"),
            Self::Decreased => write!(f, "DECREASE"),
            Self::ToZero => write!(f, "ZERO"),
        }
    }
}

/// Target comparison for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetComparison {
    pub element: ElementSymbol,
    pub left: f64,
    pub right: f64,
    pub change: TargetChange,
}

/// Targets closer than this are reported as unchanged.
const SAME_TARGET_TOLERANCE: f64 = 0.001;

/// Registry of all supported grades.
#[derive(Debug, Clone)]
pub struct GradeCatalog {
    grades: Vec<Grade>,
}

impl Default for GradeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GradeCatalog {
    /// Catalog with the built-in grade tables.
    pub fn builtin() -> Self {
        Self {
            grades: grades::builtin_grades(),
        }
    }

    /// Replace the sensitive-element list of a grade.
    ///
    /// Only used while building the catalog from configuration.
    pub fn set_sensitive(
        &mut self,
        grade: &str,
        sensitive: Vec<SensitiveElement>,
    ) -> Result<(), CatalogError> {
        let key = normalize_grade(grade);
        let entry = self
            .grades
            .iter_mut()
            .find(|g| g.id == key)
            .ok_or(CatalogError::UnknownGrade(key))?;
        debug!(grade = entry.id, count = sensitive.len(), "Sensitive elements overridden");
        entry.sensitive = sensitive;
        Ok(())
    }

    /// Look up a grade by identifier (case-insensitive).
    pub fn get(&self, grade: &str) -> Result<&Grade, CatalogError> {
        let key = normalize_grade(grade);
        self.grades
            .iter()
            .find(|g| g.id == key)
            .ok_or(CatalogError::UnknownGrade(key))
    }

    pub fn contains(&self, grade: &str) -> bool {
        self.get(grade).is_ok()
    }

    pub fn targets_for(&self, grade: &str) -> Result<Composition, CatalogError> {
        Ok(self.get(grade)?.targets)
    }

    pub fn parameters_for(&self, grade: &str) -> Result<GradeParameters, CatalogError> {
        Ok(self.get(grade)?.parameters)
    }

    pub fn grades(&self) -> impl Iterator<Item = &Grade> {
        self.grades.iter()
    }

    /// Distinct model keys referenced by the catalog, in first-seen order.
    pub fn model_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        for g in &self.grades {
            if !keys.contains(&g.model_key) {
                keys.push(g.model_key);
            }
        }
        keys
    }

    /// Compare the targets of two grades element by element.
    pub fn compare(&self, left: &str, right: &str) -> Result<Vec<TargetComparison>, CatalogError> {
        let l = self.get(left)?;
        let r = self.get(right)?;
        Ok(ElementSymbol::ALL
            .into_iter()
            .map(|element| {
                let (lv, rv) = (l.targets[element], r.targets[element]);
                let change = if (lv - rv).abs() < SAME_TARGET_TOLERANCE {
                    TargetChange::Same
                } else if lv == 0.0 {
                    TargetChange::ToZero
                } else if lv > rv {
                    TargetChange::Increased
                } else {
                    TargetChange::Decreased
                };
                TargetComparison {
                    element,
                    left: lv,
                    right: rv,
                    change,
                }
            })
            .collect())
    }
}

fn normalize_grade(grade: &str) -> String {
    grade.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_supported_grades_registered() {
        let catalog = GradeCatalog::builtin();
        for id in SUPPORTED_GRADES {
            assert!(catalog.contains(id), "{id} missing from catalog");
        }
        assert_eq!(catalog.grades().count(), SUPPORTED_GRADES.len());
    }

    #[test]
    fn test_unknown_grade_is_error() {
        let catalog = GradeCatalog::builtin();
        assert_eq!(
            catalog.targets_for("XYZ"),
            Err(CatalogError::UnknownGrade("XYZ".to_string()))
        );
        assert!(catalog.parameters_for("XYZ").is_err());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = GradeCatalog::builtin();
        let g = catalog.get("astma395_updated").unwrap();
        assert_eq!(g.id, "ASTMA395_UPDATED");
        assert_eq!(g.grade_code, "ASTMA395");
        assert_eq!(g.model_key, ASTMA395_UPDATED_MODEL);
    }

    #[test]
    fn test_zero_target_only_for_updated_a395_phosphorus() {
        let catalog = GradeCatalog::builtin();
        for g in catalog.grades() {
            for e in ElementSymbol::ALL {
                let expected = g.id == "ASTMA395_UPDATED" && e == ElementSymbol::P;
                assert_eq!(g.is_zero_target(e), expected, "{} {e}", g.id);
            }
        }
    }

    #[test]
    fn test_grades_are_independent_records() {
        let mut catalog = GradeCatalog::builtin();
        catalog.set_sensitive("ASTMA395", vec![SensitiveElement {
            element: ElementSymbol::C,
            high_threshold: 0.2,
            below: None,
        }]).unwrap();
        assert!(catalog.get("ASTMA395").unwrap().sensitivity(ElementSymbol::C).is_some());
        assert!(catalog.get("ASTMA395_UPDATED").unwrap().sensitivity(ElementSymbol::C).is_none());
    }

    #[test]
    fn test_compare_updated_against_standard() {
        let catalog = GradeCatalog::builtin();
        let rows = catalog.compare("ASTMA395_UPDATED", "ASTMA395").unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[ElementSymbol::Mn.index()].change, TargetChange::Increased);
        assert_eq!(rows[ElementSymbol::P.index()].change, TargetChange::ToZero);
        assert_eq!(rows[ElementSymbol::C.index()].change, TargetChange::Same);
    }

    #[test]
    fn test_model_keys() {
        let catalog = GradeCatalog::builtin();
        assert_eq!(
            catalog.model_keys(),
            vec![MULTI_GRADE_MODEL, ASTMA536_UPDATED_MODEL, ASTMA395_UPDATED_MODEL]
        );
    }
}
