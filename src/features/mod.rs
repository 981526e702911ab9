//! Feature construction for the ensemble backends.
//!
//! Converts a measured composition, a grade record, and a furnace identifier
//! into the flat feature vector the backends were trained on. Column order is
//! fixed and must match training exactly, since the scaled backend and its
//! scaler are position-sensitive:
//!
//! 1. Per element (C, Si, Mn, P, S, Cu, Mg): `Current`, `Target_Config`,
//!    `Min`, `Max`, `Absorption_Rate`, `Cost_Per_Kg`, `Target_Min`,
//!    `Target_Max`
//! 2. `Furnace_ID`, `Grade_Code` (integer codes)
//! 3. Per element: `Diff`, `Ratio`, `PctChange`

pub mod codec;

pub use codec::{CategoricalCodec, CategoricalField, Encoding, LabelEncoder, UnknownCategoryWarning};

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::catalog::Grade;
use crate::config::defaults::FEATURE_EPSILON;
use crate::types::{Composition, ElementSymbol};

/// Per-element base columns, in training order.
const BASE_SUFFIXES: [&str; 8] = [
    "Current",
    "Target_Config",
    "Min",
    "Max",
    "Absorption_Rate",
    "Cost_Per_Kg",
    "Target_Min",
    "Target_Max",
];

/// Per-element engineered columns, in training order.
const ENGINEERED_SUFFIXES: [&str; 3] = ["Diff", "Ratio", "PctChange"];

/// Total number of feature columns.
pub const FEATURE_COUNT: usize =
    ElementSymbol::ALL.len() * (BASE_SUFFIXES.len() + ENGINEERED_SUFFIXES.len()) + 2;

static COLUMNS: OnceLock<Vec<String>> = OnceLock::new();
static COLUMN_INDEX: OnceLock<HashMap<String, usize>> = OnceLock::new();

/// Canonical feature column names in training order.
pub fn feature_columns() -> &'static [String] {
    COLUMNS.get_or_init(|| {
        let mut cols = Vec::with_capacity(FEATURE_COUNT);
        for e in ElementSymbol::ALL {
            for suffix in BASE_SUFFIXES {
                cols.push(format!("{e}_{suffix}"));
            }
        }
        cols.push(CategoricalField::Furnace.column().to_string());
        cols.push(CategoricalField::Grade.column().to_string());
        for e in ElementSymbol::ALL {
            for suffix in ENGINEERED_SUFFIXES {
                cols.push(format!("{e}_{suffix}"));
            }
        }
        cols
    })
}

/// Position of a named column, if it exists.
pub fn column_index(name: &str) -> Option<usize> {
    COLUMN_INDEX
        .get_or_init(|| {
            feature_columns()
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), i))
                .collect()
        })
        .get(name)
        .copied()
}

/// A single feature value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    /// Encoded categorical value
    Categorical(i64),
}

impl FeatureValue {
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Numeric(v) => v,
            Self::Categorical(code) => code as f64,
        }
    }

    pub const fn is_categorical(self) -> bool {
        matches!(self, Self::Categorical(_))
    }
}

/// Ordered feature vector; names come from [`feature_columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<FeatureValue>,
    warnings: Vec<UnknownCategoryWarning>,
}

impl FeatureVector {
    /// Build from values already in canonical order.
    ///
    /// Returns `None` if the length does not match [`FEATURE_COUNT`].
    pub fn from_values(values: Vec<FeatureValue>) -> Option<Self> {
        (values.len() == FEATURE_COUNT).then_some(Self {
            values,
            warnings: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        column_index(name).and_then(|i| self.values.get(i).copied())
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    /// `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        feature_columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Copy with every value replaced by `f(index, value)`.
    pub fn map_values(&self, mut f: impl FnMut(usize, FeatureValue) -> FeatureValue) -> Self {
        Self {
            values: self
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| f(i, *v))
                .collect(),
            warnings: self.warnings.clone(),
        }
    }

    /// Categorical fallbacks that occurred while building this vector.
    pub fn warnings(&self) -> &[UnknownCategoryWarning] {
        &self.warnings
    }
}

/// Engineered features for one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineeredFeatures {
    pub diff: f64,
    pub ratio: f64,
    pub pct_change: f64,
}

/// Difference, ratio and percent change of `target` relative to `current`.
///
/// A zero target means "drive the element to zero": the ratio is pinned to 0
/// and the percent change is a bounded negative value instead of a division
/// by zero. The epsilon keeps `current == 0` finite.
pub fn engineer(current: f64, target: f64) -> EngineeredFeatures {
    let denom = current + FEATURE_EPSILON;
    if target == 0.0 {
        EngineeredFeatures {
            diff: target - current,
            ratio: 0.0,
            pct_change: -100.0 * current / denom,
        }
    } else {
        EngineeredFeatures {
            diff: target - current,
            ratio: target / denom,
            pct_change: (target - current) / denom * 100.0,
        }
    }
}

/// Builds feature vectors against a bundle's categorical encoders.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder<'a> {
    codec: &'a CategoricalCodec,
}

impl<'a> FeatureBuilder<'a> {
    pub const fn new(codec: &'a CategoricalCodec) -> Self {
        Self { codec }
    }

    /// Build the feature vector for one request. Pure apart from the
    /// warning log emitted for unknown categories.
    pub fn build(&self, composition: &Composition, grade: &Grade, furnace_id: &str) -> FeatureVector {
        let mut values = Vec::with_capacity(FEATURE_COUNT);
        let mut warnings = Vec::new();

        for e in ElementSymbol::ALL {
            let p = grade.parameters[e];
            values.extend(
                [
                    composition[e],
                    grade.targets[e],
                    p.min,
                    p.max,
                    p.absorption_rate,
                    p.cost_per_unit,
                    p.target_min,
                    p.target_max,
                ]
                .map(FeatureValue::Numeric),
            );
        }

        for encoding in [
            self.codec.encode_furnace(furnace_id),
            self.codec.encode_grade(grade.grade_code),
        ] {
            values.push(FeatureValue::Categorical(encoding.code()));
            if let Encoding::Fallback(w) = encoding {
                warnings.push(w);
            }
        }

        for e in ElementSymbol::ALL {
            let f = engineer(composition[e], grade.targets[e]);
            values.extend([f.diff, f.ratio, f.pct_change].map(FeatureValue::Numeric));
        }

        debug_assert_eq!(values.len(), FEATURE_COUNT);
        FeatureVector { values, warnings }
    }
}
