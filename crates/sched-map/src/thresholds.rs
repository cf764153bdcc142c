//! Confidence constants used across the decision stages.
//!
//! Every score is on a 0-100 scale except [`FUZZY_ACCEPTANCE`], which applies
//! to raw similarity in 0.0-1.0.

/// Cached decisions above this confidence are reused without re-analysis.
pub const CACHE_ACCEPT: f64 = 90.0;
/// Default caller threshold for accepting a stage's result.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 85.0;
/// Both proposals must exceed this confidence to earn the agreement bonus.
pub const AGREEMENT_BONUS_FLOOR: f64 = 80.0;
/// Flat bonus added to the agreement score of two confident proposals.
pub const AGREEMENT_BONUS: f64 = 10.0;
/// Confidence added to the proposal chosen by arbitration.
pub const ARBITRATION_BOOST: f64 = 10.0;
/// Upper bound for an arbitrated confidence.
pub const ARBITRATION_CAP: f64 = 95.0;
/// Minimum similarity for the fuzzy validator to accept a field.
pub const FUZZY_ACCEPTANCE: f64 = 0.5;

/// Tunable numbers of the decision pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionThresholds {
    /// Fixed cache-hit threshold; independent of the caller's threshold.
    pub cache_accept: f64,
    pub agreement_bonus_floor: f64,
    pub agreement_bonus: f64,
    pub arbitration_boost: f64,
    pub arbitration_cap: f64,
    pub fuzzy_acceptance: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            cache_accept: CACHE_ACCEPT,
            agreement_bonus_floor: AGREEMENT_BONUS_FLOOR,
            agreement_bonus: AGREEMENT_BONUS,
            arbitration_boost: ARBITRATION_BOOST,
            arbitration_cap: ARBITRATION_CAP,
            fuzzy_acceptance: FUZZY_ACCEPTANCE,
        }
    }
}

/// Clamps a self-reported confidence into 0-100; NaN becomes 0.
#[must_use]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
