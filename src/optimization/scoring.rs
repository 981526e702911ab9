//! Per-element efficiency, status tier and priority

use crate::catalog::SensitiveElement;
use crate::config::defaults::{
    GAP_TOLERANCE, HIGH_EFFICIENCY_PERCENT, MEDIUM_PRIORITY_CUTOFF, NEGLIGIBLE_ADJUSTMENT,
    ZERO_TARGET_TOLERANCE,
};
use crate::types::{Priority, Status};

/// Thresholds used while scoring and summarizing one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringSettings {
    /// Efficiency above which an element counts as high-efficiency (%)
    pub high_efficiency_percent: f64,
    /// Adjustments at or below this magnitude get no recommendation (%)
    pub negligible_adjustment: f64,
    /// Zero-target elements at or below this level are already on target (%)
    pub zero_target_tolerance: f64,
    /// Generic MED/LOW boundary on adjustment magnitude (%)
    pub medium_cutoff: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            high_efficiency_percent: HIGH_EFFICIENCY_PERCENT,
            negligible_adjustment: NEGLIGIBLE_ADJUSTMENT,
            zero_target_tolerance: ZERO_TARGET_TOLERANCE,
            medium_cutoff: MEDIUM_PRIORITY_CUTOFF,
        }
    }
}

/// Outcome of scoring one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementScore {
    pub efficiency: f64,
    pub status: Status,
    pub priority: Priority,
}

/// Scores how much of the current-to-target gap a prediction closes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EfficiencyScorer {
    settings: ScoringSettings,
}

impl EfficiencyScorer {
    pub const fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }

    /// Efficiency, status and priority for one element.
    ///
    /// `sensitive` is the grade's designation for this element, if any.
    pub fn score(
        &self,
        current: f64,
        target: f64,
        predicted: f64,
        is_zero_target: bool,
        sensitive: Option<&SensitiveElement>,
    ) -> ElementScore {
        let efficiency = self.efficiency(current, target, predicted, is_zero_target);
        ElementScore {
            efficiency,
            status: Status::from_efficiency(efficiency),
            priority: self.priority(predicted - current, sensitive),
        }
    }

    /// Efficiency in `[0, 100]`.
    pub fn efficiency(&self, current: f64, target: f64, predicted: f64, is_zero_target: bool) -> f64 {
        let raw = if is_zero_target {
            if current <= self.settings.zero_target_tolerance {
                return 100.0;
            }
            (1.0 - predicted.abs() / current) * 100.0
        } else {
            let gap = (target - current).abs();
            if gap <= GAP_TOLERANCE {
                return 100.0;
            }
            (1.0 - (target - predicted).abs() / gap) * 100.0
        };
        // A non-finite prediction closes none of the gap.
        if raw.is_finite() {
            raw.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Sensitive elements above their grade threshold are HIGH, and below it
    /// take their configured floor when one is set. Everything else is MED
    /// above the generic cutoff and LOW otherwise.
    pub fn priority(&self, adjustment: f64, sensitive: Option<&SensitiveElement>) -> Priority {
        let magnitude = adjustment.abs();
        match sensitive {
            Some(s) if magnitude > s.high_threshold => Priority::High,
            Some(SensitiveElement {
                below: Some(floor), ..
            }) => *floor,
            _ if magnitude > self.settings.medium_cutoff => Priority::Medium,
            _ => Priority::Low,
        }
    }

    pub const fn settings(&self) -> &ScoringSettings {
        &self.settings
    }
}
