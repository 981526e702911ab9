//! Categorical encoding for furnace and grade identifiers.
//!
//! Encoders are fit once at training time and shipped inside the model
//! bundle as ordered class lists: the code of a class is its position.
//! Unseen values never fail a request; they encode to the default code and
//! produce an [`UnknownCategoryWarning`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::defaults::DEFAULT_CATEGORY_CODE;

/// Categorical input columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    #[serde(rename = "Furnace_ID")]
    Furnace,
    #[serde(rename = "Grade_Code")]
    Grade,
}

impl CategoricalField {
    /// Column name used by the trained backends.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Furnace => "Furnace_ID",
            Self::Grade => "Grade_Code",
        }
    }
}

impl std::fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// A categorical value the encoder has never seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCategoryWarning {
    pub field: CategoricalField,
    pub value: String,
    /// Code substituted for the unknown value
    pub fallback_code: i64,
}

impl std::fmt::Display for UnknownCategoryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unknown {} '{}', using default encoding {}",
            self.field, self.value, self.fallback_code
        )
    }
}

/// Outcome of encoding one categorical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    Known(i64),
    Fallback(UnknownCategoryWarning),
}

impl Encoding {
    pub const fn code(&self) -> i64 {
        match self {
            Self::Known(code) => *code,
            Self::Fallback(w) => w.fallback_code,
        }
    }

    pub const fn warning(&self) -> Option<&UnknownCategoryWarning> {
        match self {
            Self::Known(_) => None,
            Self::Fallback(w) => Some(w),
        }
    }
}

/// Ordered class list of a fitted label encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn transform(&self, value: &str) -> Option<i64> {
        self.classes
            .iter()
            .position(|c| c == value)
            .and_then(|i| i64::try_from(i).ok())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Furnace and grade encoders from a model bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalCodec {
    #[serde(rename = "Furnace_ID", default, skip_serializing_if = "Option::is_none")]
    furnace: Option<LabelEncoder>,
    #[serde(rename = "Grade_Code", default, skip_serializing_if = "Option::is_none")]
    grade: Option<LabelEncoder>,
}

impl CategoricalCodec {
    pub const fn new(furnace: Option<LabelEncoder>, grade: Option<LabelEncoder>) -> Self {
        Self { furnace, grade }
    }

    pub fn encode_furnace(&self, furnace_id: &str) -> Encoding {
        self.encode(CategoricalField::Furnace, furnace_id)
    }

    pub fn encode_grade(&self, grade_code: &str) -> Encoding {
        self.encode(CategoricalField::Grade, grade_code)
    }

    /// Encode a value, falling back to the default code when it is unknown
    /// or the bundle carries no encoder for the field.
    pub fn encode(&self, field: CategoricalField, value: &str) -> Encoding {
        let encoder = match field {
            CategoricalField::Furnace => self.furnace.as_ref(),
            CategoricalField::Grade => self.grade.as_ref(),
        };
        match encoder.and_then(|e| e.transform(value)) {
            Some(code) => Encoding::Known(code),
            None => {
                let warning = UnknownCategoryWarning {
                    field,
                    value: value.to_string(),
                    fallback_code: DEFAULT_CATEGORY_CODE,
                };
                warn!(field = %field, value = %value, "{}", warning);
                Encoding::Fallback(warning)
            }
        }
    }

    pub fn furnace_classes(&self) -> &[String] {
        match &self.furnace {
            Some(encoder) => encoder.classes(),
            None => &[],
        }
    }
}
