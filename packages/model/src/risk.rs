//! Mapping raw model probabilities to user-facing risk levels.

use wildlife_risk_collision_models::RiskLevel;

/// Exponent applied to the raw probability before thresholding.
pub const DEFAULT_EXPONENT: f64 = 2.5;

/// Lower bounds of `Low`, `Moderate`, `High` and `Very High`.
pub const DEFAULT_THRESHOLDS: [f64; 4] = [0.35, 0.55, 0.75, 0.92];

/// Display policy turning a probability into a [`RiskLevel`].
///
/// The probability is raised to `exponent` and the result compared against
/// ascending `thresholds`. The default reproduces the dashboard's
/// calibration exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPolicy {
    /// Exponent applied to the raw probability.
    pub exponent: f64,
    /// Ascending lower bounds for `Low` through `Very High`.
    pub thresholds: [f64; 4],
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_EXPONENT,
            thresholds: DEFAULT_THRESHOLDS,
        }
    }
}

impl RiskPolicy {
    /// Transforms a raw probability (clamped to `[0, 1]`).
    #[must_use]
    pub fn adjust(&self, raw: f64) -> f64 {
        raw.clamp(0.0, 1.0).powf(self.exponent)
    }

    /// Maps an adjusted score to a risk level.
    #[must_use]
    pub fn categorize(&self, adjusted: f64) -> RiskLevel {
        let [low, moderate, high, very_high] = self.thresholds;
        if adjusted >= very_high {
            RiskLevel::VeryHigh
        } else if adjusted >= high {
            RiskLevel::High
        } else if adjusted >= moderate {
            RiskLevel::Moderate
        } else if adjusted >= low {
            RiskLevel::Low
        } else {
            RiskLevel::VeryLow
        }
    }

    /// Adjusts a raw probability and categorizes it.
    #[must_use]
    pub fn assess(&self, raw: f64) -> (f64, RiskLevel) {
        let adjusted = self.adjust(raw);
        (adjusted, self.categorize(adjusted))
    }
}
