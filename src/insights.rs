use serde::Serialize;
use std::fmt;

use crate::records::RawCustomerRecord;
use crate::scoring::InsightLimits;

/// Purchase momentum: last two weeks against the two weeks before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    #[serde(rename = "Subindo")]
    Rising,
    #[serde(rename = "Estável")]
    Stable,
    #[serde(rename = "Descendo")]
    Falling,
    #[serde(rename = "Sem Dados")]
    NoData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Rising => "Subindo",
            Trend::Stable => "Estável",
            Trend::Falling => "Descendo",
            Trend::NoData => "Sem Dados",
        };
        f.write_str(label)
    }
}

/// Strategic segment for high-tier customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Segment {
    /// Trusted, large limit, buying little.
    #[serde(rename = "Potencial Oculto")]
    HiddenPotential,
    /// Trusted customer whose purchases are dropping.
    #[serde(rename = "Risco de Churn")]
    ChurnRisk,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::HiddenPotential => f.write_str("Potencial Oculto"),
            Segment::ChurnRisk => f.write_str("Risco de Churn"),
        }
    }
}

pub fn purchase_trend(record: &RawCustomerRecord, limits: &InsightLimits) -> Trend {
    let recent = record.week1_value.max(0.0) + record.week2_value.max(0.0);
    let previous = record.week3_value.max(0.0) + record.week4_value.max(0.0);

    if recent == 0.0 && previous == 0.0 {
        return Trend::NoData;
    }
    if previous == 0.0 {
        return Trend::Rising;
    }

    let change_pct = (recent - previous) / previous * 100.0;
    let tolerance = limits.trend_tolerance_pct.abs();
    if change_pct > tolerance {
        Trend::Rising
    } else if change_pct < -tolerance {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

/// Only four and five star customers get a segment. Churn risk wins over
/// hidden potential.
pub fn strategic_segment(
    stars: u8,
    trend: Trend,
    credit_limit: f64,
    utilization: Option<f64>,
    limits: &InsightLimits,
) -> Option<Segment> {
    if stars < 4 {
        return None;
    }
    if trend == Trend::Falling {
        return Some(Segment::ChurnRisk);
    }
    match utilization {
        Some(pct)
            if credit_limit >= limits.hidden_potential_min_limit
                && pct <= limits.hidden_potential_max_utilization_pct =>
        {
            Some(Segment::HiddenPotential)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringSettings;

    fn weeks(w1: f64, w2: f64, w3: f64, w4: f64) -> RawCustomerRecord {
        RawCustomerRecord {
            week1_value: w1,
            week2_value: w2,
            week3_value: w3,
            week4_value: w4,
            ..Default::default()
        }
    }

    fn limits() -> InsightLimits {
        ScoringSettings::default().insights
    }

    #[test]
    fn test_trend_no_data() {
        assert_eq!(purchase_trend(&weeks(0.0, 0.0, 0.0, 0.0), &limits()), Trend::NoData);
    }

    #[test]
    fn test_trend_rising_from_nothing() {
        assert_eq!(purchase_trend(&weeks(100.0, 0.0, 0.0, 0.0), &limits()), Trend::Rising);
    }

    #[test]
    fn test_trend_within_tolerance_is_stable() {
        // 1050 vs 1000 is +5%
        assert_eq!(
            purchase_trend(&weeks(550.0, 500.0, 500.0, 500.0), &limits()),
            Trend::Stable
        );
    }

    #[test]
    fn test_trend_falling() {
        assert_eq!(
            purchase_trend(&weeks(100.0, 100.0, 500.0, 500.0), &limits()),
            Trend::Falling
        );
    }

    #[test]
    fn test_segment_requires_high_tier() {
        assert_eq!(
            strategic_segment(3, Trend::Falling, 50_000.0, Some(5.0), &limits()),
            None
        );
    }

    #[test]
    fn test_segment_churn_risk_wins() {
        assert_eq!(
            strategic_segment(5, Trend::Falling, 50_000.0, Some(5.0), &limits()),
            Some(Segment::ChurnRisk)
        );
    }

    #[test]
    fn test_segment_hidden_potential() {
        assert_eq!(
            strategic_segment(4, Trend::Stable, 50_000.0, Some(12.0), &limits()),
            Some(Segment::HiddenPotential)
        );
        assert_eq!(
            strategic_segment(4, Trend::Stable, 5_000.0, Some(12.0), &limits()),
            None
        );
        assert_eq!(strategic_segment(4, Trend::Stable, 50_000.0, None, &limits()), None);
    }

    #[test]
    fn test_labels_serialize_in_portuguese() {
        assert_eq!(serde_json::to_string(&Trend::Falling).unwrap(), "\"Descendo\"");
        assert_eq!(Segment::HiddenPotential.to_string(), "Potencial Oculto");
    }
}
