use super::config::{
    Curve, FactorCurve, PayerProfileLimits, ScoreRounding, StarThresholds, TierNames,
};

pub const MAX_SCORE: f64 = 10.0;

pub const PROFILE_EARLY: &str = "Antecipado";
pub const PROFILE_ON_TIME: &str = "Pontual";
pub const PROFILE_LIGHT_DELAY: &str = "Atraso Leve";
pub const PROFILE_CRITICAL_DELAY: &str = "Atraso Crítico";
pub const PROFILE_NO_HISTORY: &str = "Sem Histórico Recente";

/// Clamp that never panics and maps NaN to `lo`.
pub fn bounded(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.max(lo).min(hi)
    }
}

impl FactorCurve {
    /// Sub-score in [0, 10] for a raw metric. Negative metrics score 0.
    pub fn score(&self, raw: f64) -> f64 {
        if !(self.full_scale > 0.0) || !(raw > 0.0) {
            return 0.0;
        }
        let ratio = (raw / self.full_scale).min(1.0);
        let shaped = match self.curve {
            Curve::Linear => ratio,
            Curve::Quadratic => ratio * ratio,
        };
        bounded(shaped * MAX_SCORE, 0.0, MAX_SCORE)
    }
}

/// `min(raw / divisor, cap)`, zero for a non-positive divisor or metric.
pub fn capped_ratio(raw: f64, divisor: f64, cap: f64) -> f64 {
    if !(divisor > 0.0) || !(raw > 0.0) {
        return 0.0;
    }
    bounded(raw / divisor, 0.0, cap.max(0.0))
}

/// Weighted average of `(score, weight)` pairs. Negative weights count as 0.
pub fn weighted_average(parts: &[(f64, f64)]) -> f64 {
    let (sum, total) = parts.iter().fold((0.0, 0.0), |(sum, total), &(score, weight)| {
        let weight = bounded(weight, 0.0, f64::MAX);
        (sum + score * weight, total + weight)
    });
    if total > 0.0 {
        sum / total
    } else {
        0.0
    }
}

/// Apply the configured rounding, then keep the score in [floor, 10].
pub fn finalize_score(raw: f64, rounding: ScoreRounding, floor: f64) -> f64 {
    let rounded = match rounding {
        ScoreRounding::Exact => raw,
        ScoreRounding::Ceil => raw.ceil(),
    };
    bounded(rounded, bounded(floor, 0.0, MAX_SCORE), MAX_SCORE)
}

/// Payer profile from the average payment delay.
pub fn payer_profile(average_delay_days: f64, limits: &PayerProfileLimits) -> &'static str {
    if average_delay_days < 0.0 {
        PROFILE_EARLY
    } else if average_delay_days > limits.critical_delay_days {
        PROFILE_CRITICAL_DELAY
    } else if average_delay_days > limits.light_delay_days {
        PROFILE_LIGHT_DELAY
    } else {
        PROFILE_ON_TIME
    }
}

/// Walk thresholds from five stars down; the first one met wins.
pub fn star_tier(index: f64, thresholds: &StarThresholds) -> u8 {
    let tiers = [
        (5, thresholds.five),
        (4, thresholds.four),
        (3, thresholds.three),
        (2, thresholds.two),
    ];
    tiers
        .iter()
        .find(|(_, min)| index >= *min)
        .map_or(1, |(stars, _)| *stars)
}

pub fn tier_name(stars: u8, names: &TierNames) -> &str {
    match stars {
        5 => &names.five,
        4 => &names.four,
        3 => &names.three,
        2 => &names.two,
        1 => &names.one,
        _ => &names.inactive,
    }
}
