//! Element symbols and the fixed-size per-element map used by every stage.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Number of tracked elements.
pub const ELEMENT_COUNT: usize = 7;

/// The closed set of tracked alloying elements.
///
/// Declaration order is the canonical output order: C, Si, Mn, P, S, Cu, Mg.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    serde::Serialize, serde::Deserialize,
)]
pub enum ElementSymbol {
    C,
    Si,
    Mn,
    P,
    S,
    Cu,
    Mg,
}

impl ElementSymbol {
    /// All elements in canonical order.
    pub const ALL: [Self; ELEMENT_COUNT] = [
        Self::C,
        Self::Si,
        Self::Mn,
        Self::P,
        Self::S,
        Self::Cu,
        Self::Mg,
    ];

    /// Chemical symbol, as used in feature and target column names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::Si => "Si",
            Self::Mn => "Mn",
            Self::P => "P",
            Self::S => "S",
            Self::Cu => "Cu",
            Self::Mg => "Mg",
        }
    }

    /// Full element name for display.
    pub const fn name(self) -> &'static str {
        match self {
            Self::C => "Carbon",
            Self::Si => "Silicon",
            Self::Mn => "Manganese",
            Self::P => "Phosphorus",
            Self::S => "Sulfur",
            Self::Cu => "Copper",
            Self::Mg => "Magnesium",
        }
    }

    /// Position in canonical order.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Largest plausible measured percentage accepted at the request boundary.
    pub const fn max_input_percent(self) -> f64 {
        match self {
            Self::C | Self::Si => 10.0,
            Self::Mn | Self::Cu => 2.0,
            Self::P => 1.0,
            Self::S => 0.1,
            Self::Mg => 0.2,
        }
    }

    /// Name of the model output column predicted for this element.
    pub fn target_column(self) -> String {
        format!("{}_Element_Config", self.as_str())
    }
}

impl fmt::Display for ElementSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an element symbol outside the tracked set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown element symbol: {0} (expected one of C, Si, Mn, P, S, Cu, Mg)")]
pub struct UnknownElement(pub String);

impl FromStr for ElementSymbol {
    type Err = UnknownElement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownElement(trimmed.to_string()))
    }
}

// ============================================================================
// ElementMap
// ============================================================================

/// A value for every tracked element, stored in canonical order.
///
/// There is no way to build a partial map: construction either supplies all
/// seven values or fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementMap<T> {
    values: [T; ELEMENT_COUNT],
}

impl<T> ElementMap<T> {
    /// Build from values given in canonical order.
    pub const fn new(values: [T; ELEMENT_COUNT]) -> Self {
        Self { values }
    }

    /// Build by evaluating `f` for each element in canonical order.
    pub fn from_fn(mut f: impl FnMut(ElementSymbol) -> T) -> Self {
        Self {
            values: std::array::from_fn(|i| f(ElementSymbol::ALL[i])),
        }
    }

    /// Fallible variant of [`ElementMap::from_fn`]; stops at the first error.
    pub fn try_from_fn<E>(
        mut f: impl FnMut(ElementSymbol) -> Result<T, E>,
    ) -> Result<Self, E> {
        use ElementSymbol::{Cu, Mg, Mn, Si, C, P, S};
        Ok(Self::new([f(C)?, f(Si)?, f(Mn)?, f(P)?, f(S)?, f(Cu)?, f(Mg)?]))
    }

    /// Build from a map that must contain exactly the tracked elements.
    pub fn try_from_map(mut map: BTreeMap<ElementSymbol, T>) -> Result<Self, String> {
        Self::try_from_fn(|element| {
            map.remove(&element)
                .ok_or_else(|| format!("missing element {element}"))
        })
    }

    pub fn get(&self, element: ElementSymbol) -> &T {
        &self.values[element.index()]
    }

    /// Iterate `(element, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementSymbol, &T)> {
        ElementSymbol::ALL.into_iter().zip(self.values.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(ElementSymbol, &T) -> U) -> ElementMap<U> {
        ElementMap::from_fn(|e| f(e, self.get(e)))
    }
}

impl<T> std::ops::Index<ElementSymbol> for ElementMap<T> {
    type Output = T;

    fn index(&self, element: ElementSymbol) -> &T {
        self.get(element)
    }
}

impl<T: Serialize> Serialize for ElementMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ELEMENT_COUNT))?;
        for (element, value) in self.iter() {
            map.serialize_entry(element.as_str(), value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ElementMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<ElementSymbol, T>::deserialize(deserializer)?;
        Self::try_from_map(raw).map_err(serde::de::Error::custom)
    }
}

/// Measured or target percentage for each element.
pub type Composition = ElementMap<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let symbols: Vec<&str> = ElementSymbol::ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(symbols, vec!["C", "Si", "Mn", "P", "S", "Cu", "Mg"]);
        for (i, e) in ElementSymbol::ALL.iter().enumerate() {
            assert_eq!(e.index(), i);
        }
    }

    #[test]
    fn test_parse_symbol_case_insensitive() {
        assert_eq!("si".parse::<ElementSymbol>(), Ok(ElementSymbol::Si));
        assert_eq!(" Mg ".parse::<ElementSymbol>(), Ok(ElementSymbol::Mg));
        assert!("Fe".parse::<ElementSymbol>().is_err());
    }

    #[test]
    fn test_deserialize_requires_all_elements() {
        let partial = r#"{"C": 3.5, "Si": 2.5}"#;
        let result: Result<Composition, _> = serde_json::from_str(partial);
        assert!(result.is_err(), "partial composition must be rejected");

        let full = r#"{"C": 3.5, "Si": 2.5, "Mn": 0.2, "P": 0.05, "S": 0.01, "Cu": 0.3, "Mg": 0.045}"#;
        let comp: Composition = serde_json::from_str(full).unwrap();
        assert_eq!(comp[ElementSymbol::Mn], 0.2);
        assert_eq!(comp[ElementSymbol::Mg], 0.045);
    }

    #[test]
    fn test_deserialize_rejects_unknown_element() {
        let extra = r#"{"C": 3.5, "Si": 2.5, "Mn": 0.2, "P": 0.05, "S": 0.01, "Cu": 0.3, "Mg": 0.045, "Fe": 90.0}"#;
        let result: Result<Composition, _> = serde_json::from_str(extra);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_in_canonical_order() {
        let comp = Composition::new([3.5, 2.5, 0.2, 0.05, 0.01, 0.3, 0.045]);
        let json = serde_json::to_string(&comp).unwrap();
        assert!(json.starts_with(r#"{"C":3.5,"Si":2.5,"Mn":0.2"#));
    }

    #[test]
    fn test_try_from_fn_stops_on_error() {
        let result: Result<ElementMap<u8>, String> = ElementMap::try_from_fn(|e| {
            if e == ElementSymbol::P {
                Err("no P".to_string())
            } else {
                Ok(1)
            }
        });
        assert_eq!(result, Err("no P".to_string()));
    }

    #[test]
    fn test_try_from_fn_visits_in_canonical_order() {
        let mut seen = Vec::new();
        let map: Result<ElementMap<usize>, ()> = ElementMap::try_from_fn(|e| {
            seen.push(e);
            Ok(e.index())
        });
        assert_eq!(seen, ElementSymbol::ALL.to_vec());
        let map = map.unwrap();
        for e in ElementSymbol::ALL {
            assert_eq!(*map.get(e), e.index());
        }
    }

    #[test]
    fn test_try_from_map_reports_missing_element() {
        let mut values: BTreeMap<ElementSymbol, f64> =
            ElementSymbol::ALL.into_iter().map(|e| (e, 1.0)).collect();
        values.remove(&ElementSymbol::Cu);
        assert_eq!(
            ElementMap::try_from_map(values),
            Err("missing element Cu".to_string())
        );
    }
}
