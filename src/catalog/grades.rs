//! Built-in grade tables.
//!
//! Every grade is a complete, independent record. Values that happen to
//! coincide between grades are repeated on purpose so that editing one grade
//! never changes another.

use crate::types::{Composition, ElementParameters, ElementSymbol, GradeParameters, Priority};

use super::{Grade, SensitiveElement};

const fn p(min: f64, max: f64, absorption_rate: f64, cost_per_unit: f64) -> ElementParameters {
    ElementParameters::new(min, max, absorption_rate, cost_per_unit)
}

const EN1563_TARGETS: Composition = Composition::new([3.5, 2.5, 0.2, 0.05, 0.01, 0.3, 0.045]);

const EN1563_PARAMETERS: GradeParameters = GradeParameters::new([
    p(3.0, 4.0, 90.0, 150.0),
    p(2.0, 3.5, 85.0, 120.0),
    p(0.1, 1.0, 75.0, 400.0),
    p(0.0, 0.8, 60.0, 300.0),
    p(0.0, 0.02, 70.0, 250.0),
    p(0.1, 0.6, 80.0, 700.0),
    p(0.02, 0.08, 95.0, 2800.0),
]);

const ASTMA536_TARGETS: Composition =
    Composition::new([3.4, 2.6, 0.275, 0.04, 0.0075, 0.35, 0.05]);

const ASTMA536_PARAMETERS: GradeParameters = GradeParameters::new([
    p(3.0, 4.0, 90.0, 150.0),
    p(2.0, 3.5, 85.0, 120.0),
    p(0.1, 1.0, 75.0, 400.0),
    p(0.0, 0.8, 60.0, 300.0),
    p(0.0, 0.02, 70.0, 250.0),
    p(0.1, 0.6, 80.0, 700.0),
    p(0.02, 0.08, 95.0, 2800.0),
]);

const ASTMA395_TARGETS: Composition =
    Composition::new([3.6, 3.0, 0.225, 0.02, 0.004, 0.175, 0.04]);

const ASTMA395_PARAMETERS: GradeParameters = GradeParameters::new([
    p(3.0, 4.0, 90.0, 150.0),
    p(2.0, 3.5, 85.0, 120.0),
    p(0.1, 1.0, 75.0, 400.0),
    p(0.0, 0.8, 60.0, 300.0),
    p(0.0, 0.02, 70.0, 250.0),
    p(0.1, 0.6, 80.0, 700.0),
    p(0.02, 0.08, 95.0, 2800.0),
]);

// P raised tenfold relative to ASTMA536
const ASTMA536_UPDATED_TARGETS: Composition =
    Composition::new([3.4, 2.6, 0.275, 0.40, 0.0075, 0.35, 0.05]);

const ASTMA536_UPDATED_PARAMETERS: GradeParameters = GradeParameters::new([
    p(3.2, 3.6, 90.0, 150.0),
    p(2.4, 2.8, 85.0, 120.0),
    p(0.15, 0.4, 75.0, 400.0),
    p(0.0, 0.8, 60.0, 300.0),
    p(0.0, 0.015, 70.0, 250.0),
    p(0.2, 0.5, 80.0, 700.0),
    p(0.03, 0.07, 95.0, 2800.0),
]);

// Mn raised to 0.725, P driven to zero
const ASTMA395_UPDATED_TARGETS: Composition =
    Composition::new([3.6, 3.0, 0.725, 0.0, 0.004, 0.175, 0.04]);

const ASTMA395_UPDATED_PARAMETERS: GradeParameters = GradeParameters::new([
    p(3.4, 3.8, 90.0, 150.0),
    p(2.8, 3.2, 85.0, 120.0),
    p(0.1, 1.0, 75.0, 400.0),
    p(0.0, 0.04, 60.0, 300.0),
    p(0.0, 0.008, 70.0, 250.0),
    p(0.1, 0.25, 80.0, 700.0),
    p(0.025, 0.055, 95.0, 2800.0),
]);

/// Shared bundle for the three standard grades.
pub const MULTI_GRADE_MODEL: &str = "MULTI_GRADE";
pub const ASTMA536_UPDATED_MODEL: &str = "ASTMA536_UPDATED";
pub const ASTMA395_UPDATED_MODEL: &str = "ASTMA395_UPDATED";

/// All supported grade identifiers.
pub const SUPPORTED_GRADES: [&str; 5] = [
    "EN1563",
    "ASTMA536",
    "ASTMA395",
    "ASTMA536_UPDATED",
    "ASTMA395_UPDATED",
];

pub(super) fn builtin_grades() -> Vec<Grade> {
    vec![
        Grade {
            id: "EN1563",
            grade_code: "EN1563",
            model_key: MULTI_GRADE_MODEL,
            description: "EN 1563 spheroidal graphite cast iron",
            base_grade: None,
            targets: EN1563_TARGETS,
            parameters: EN1563_PARAMETERS,
            sensitive: Vec::new(),
        },
        Grade {
            id: "ASTMA536",
            grade_code: "ASTMA536",
            model_key: MULTI_GRADE_MODEL,
            description: "ASTM A536 ductile iron",
            base_grade: None,
            targets: ASTMA536_TARGETS,
            parameters: ASTMA536_PARAMETERS,
            sensitive: Vec::new(),
        },
        Grade {
            id: "ASTMA395",
            grade_code: "ASTMA395",
            model_key: MULTI_GRADE_MODEL,
            description: "ASTM A395 ferritic ductile iron",
            base_grade: None,
            targets: ASTMA395_TARGETS,
            parameters: ASTMA395_PARAMETERS,
            sensitive: Vec::new(),
        },
        Grade {
            id: "ASTMA536_UPDATED",
            grade_code: "ASTMA536",
            model_key: ASTMA536_UPDATED_MODEL,
            description: "ASTM A536 ductile iron, updated targets (P 0.40%)",
            base_grade: Some("ASTMA536"),
            targets: ASTMA536_UPDATED_TARGETS,
            parameters: ASTMA536_UPDATED_PARAMETERS,
            sensitive: vec![SensitiveElement {
                element: ElementSymbol::P,
                high_threshold: 0.0,
                below: None,
            }],
        },
        Grade {
            id: "ASTMA395_UPDATED",
            grade_code: "ASTMA395",
            model_key: ASTMA395_UPDATED_MODEL,
            description: "ASTM A395 ferritic ductile iron, updated targets (Mn 0.725%, zero P)",
            base_grade: Some("ASTMA395"),
            targets: ASTMA395_UPDATED_TARGETS,
            parameters: ASTMA395_UPDATED_PARAMETERS,
            sensitive: vec![
                SensitiveElement {
                    element: ElementSymbol::Mn,
                    high_threshold: 0.1,
                    below: Some(Priority::Medium),
                },
                SensitiveElement {
                    element: ElementSymbol::P,
                    high_threshold: 0.005,
                    below: None,
                },
            ],
        },
    ]
}
