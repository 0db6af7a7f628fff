use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current settings file format.
pub const SETTINGS_VERSION: u32 = 1;

/// Weights and thresholds that drive every derived score.
///
/// Every key is required when read from a file: a missing weight would change
/// how customers are classified, so it fails at load time instead of silently
/// taking a default.
///
/// Example YAML (abridged):
/// ```yaml
/// version: 1
/// risk_weights: { utilization: 0.4, overdue_invoices: 0.4, average_delay: 0.2 }
/// risk_factors:
///   utilization: { curve: quadratic, full_scale: 100 }
///   overdue_invoices: { curve: linear, full_scale: 5 }
///   average_delay: { curve: linear, full_scale: 60 }
/// good_behavior_discount: 0.5
/// composite_weights: { value: 1.0, risk: 1.5 }
/// star_thresholds: { five: 5, four: 2, three: -1, two: -4 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringSettings {
    pub version: u32,

    /// Relative weights of the risk sub-scores (weighted average).
    pub risk_weights: RiskWeights,

    /// How each raw risk metric maps onto a 0-10 sub-score.
    pub risk_factors: RiskFactors,

    /// Fraction removed from the utilization sub-score when the customer has
    /// nothing overdue.
    pub good_behavior_discount: f64,

    pub value_factors: ValueFactors,

    /// Rounding applied to both final scores before the floor.
    pub score_rounding: ScoreRounding,

    /// Lowest value a computed score may take (0 or 1).
    pub score_floor: f64,

    /// IVE = value * composite_weights.value - risk * composite_weights.risk
    pub composite_weights: CompositeWeights,

    pub star_thresholds: StarThresholds,

    pub tier_names: TierNames,

    pub payer_profile: PayerProfileLimits,

    pub alerts: AlertLimits,

    /// Status codes that force the critical tier (compared upper-cased).
    pub critical_statuses: Vec<String>,

    /// Display labels for status codes ("BL" -> "Bloqueado").
    pub status_labels: BTreeMap<String, String>,

    pub insights: InsightLimits,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RiskWeights {
    pub utilization: f64,
    pub overdue_invoices: f64,
    pub average_delay: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RiskFactors {
    /// Input: credit utilization in percent.
    pub utilization: FactorCurve,
    /// Input: number of overdue invoices.
    pub overdue_invoices: FactorCurve,
    /// Input: average payment delay in days.
    pub average_delay: FactorCurve,
}

/// Maps a raw metric onto 0-10. `full_scale` is the raw value where the
/// sub-score reaches 10.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FactorCurve {
    pub curve: Curve,
    pub full_scale: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Linear,
    /// Penalizes the top of the range disproportionately.
    Quadratic,
}

/// Value sub-scores: `min(raw / divisor, factor_cap)`, summed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ValueFactors {
    /// Purchases in 90 days per value point.
    pub frequency_divisor: f64,
    /// Average ticket (currency) per value point.
    pub ticket_divisor: f64,
    pub factor_cap: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoreRounding {
    Exact,
    Ceil,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompositeWeights {
    pub value: f64,
    pub risk: f64,
}

/// Minimum IVE for each tier. Below `two` is one star.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StarThresholds {
    pub five: f64,
    pub four: f64,
    pub three: f64,
    pub two: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TierNames {
    pub five: String,
    pub four: String,
    pub three: String,
    pub two: String,
    pub one: String,
    pub inactive: String,
    /// Used for a critical status without an entry in `status_labels`.
    pub critical_fallback: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PayerProfileLimits {
    pub light_delay_days: f64,
    pub critical_delay_days: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AlertLimits {
    /// Warn when utilization is above this percentage.
    pub utilization_pct: f64,
    /// Hard ceiling: above this the customer is operating over the limit.
    pub over_limit_pct: f64,
    /// Warn when the oldest overdue invoice is older than this.
    pub critical_overdue_days: f64,
    pub blocked_status: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InsightLimits {
    /// Change between the last two weeks and the two before that, in percent,
    /// still considered stable.
    pub trend_tolerance_pct: f64,
    pub hidden_potential_max_utilization_pct: f64,
    pub hidden_potential_min_limit: f64,
}

/// Named starting points for a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Canonical,
    Legacy,
}

impl Preset {
    pub fn settings(self) -> ScoringSettings {
        match self {
            Preset::Canonical => ScoringSettings::default(),
            Preset::Legacy => ScoringSettings::legacy(),
        }
    }
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(code, label)| (code.to_string(), label.to_string()))
        .collect()
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            risk_weights: RiskWeights {
                utilization: 0.4,
                overdue_invoices: 0.4,
                average_delay: 0.2,
            },
            risk_factors: RiskFactors {
                utilization: FactorCurve {
                    curve: Curve::Quadratic,
                    full_scale: 100.0,
                },
                overdue_invoices: FactorCurve {
                    curve: Curve::Linear,
                    full_scale: 5.0,
                },
                average_delay: FactorCurve {
                    curve: Curve::Linear,
                    full_scale: 60.0,
                },
            },
            good_behavior_discount: 0.5,
            value_factors: ValueFactors {
                frequency_divisor: 2.0,
                ticket_divisor: 500.0,
                factor_cap: 5.0,
            },
            score_rounding: ScoreRounding::Exact,
            score_floor: 0.0,
            composite_weights: CompositeWeights {
                value: 1.0,
                risk: 1.5,
            },
            star_thresholds: StarThresholds {
                five: 5.0,
                four: 2.0,
                three: -1.0,
                two: -4.0,
            },
            tier_names: TierNames {
                five: "Cliente Elite (AAA)".to_string(),
                four: "Cliente Sólido (AA)".to_string(),
                three: "Cliente Neutro (A)".to_string(),
                two: "Cliente de Risco (B)".to_string(),
                one: "Cliente Crítico (C)".to_string(),
                inactive: "Cliente Inativo".to_string(),
                critical_fallback: "Crítico".to_string(),
            },
            payer_profile: PayerProfileLimits {
                light_delay_days: 5.0,
                critical_delay_days: 30.0,
            },
            alerts: AlertLimits {
                utilization_pct: 95.0,
                over_limit_pct: 110.0,
                critical_overdue_days: 60.0,
                blocked_status: "BL".to_string(),
            },
            critical_statuses: codes(&["DP", "RECA", "BL", "JU", "TJ", "PRCA"]),
            status_labels: labels(&[
                ("LI", "Liberado"),
                ("BL", "Bloqueado"),
                ("JU", "Jurídico"),
                ("TJ", "Protestado"),
                ("DP", "Dep. Antecipado"),
                ("RECA", "Recadastro"),
                ("PRCA", "Pré-cadastro"),
                ("IN", "Inativo"),
            ]),
            insights: InsightLimits {
                trend_tolerance_pct: 10.0,
                hidden_potential_max_utilization_pct: 30.0,
                hidden_potential_min_limit: 10_000.0,
            },
        }
    }
}

impl ScoringSettings {
    /// The first dashboard formula: linear divisors, scores rounded up with a
    /// floor of 1, and an unweighted IVE.
    pub fn legacy() -> Self {
        let canonical = Self::default();
        Self {
            risk_factors: RiskFactors {
                // 10% utilization per point
                utilization: FactorCurve {
                    curve: Curve::Linear,
                    full_scale: 100.0,
                },
                // 2 points per overdue invoice
                overdue_invoices: FactorCurve {
                    curve: Curve::Linear,
                    full_scale: 5.0,
                },
                // 5 days of delay per point
                average_delay: FactorCurve {
                    curve: Curve::Linear,
                    full_scale: 50.0,
                },
            },
            good_behavior_discount: 0.0,
            score_rounding: ScoreRounding::Ceil,
            score_floor: 1.0,
            composite_weights: CompositeWeights {
                value: 1.0,
                risk: 1.0,
            },
            star_thresholds: StarThresholds {
                five: 4.0,
                four: 1.0,
                three: -2.0,
                two: -5.0,
            },
            tier_names: TierNames {
                five: "Cliente Estrela".to_string(),
                four: "Bom Potencial".to_string(),
                three: "Neutro".to_string(),
                two: "Atenção".to_string(),
                one: "Alto Risco".to_string(),
                inactive: "Inativo".to_string(),
                critical_fallback: "Crítico".to_string(),
            },
            critical_statuses: codes(&["BL", "JU", "TJ", "DP"]),
            ..canonical
        }
    }

    /// Whether a normalized status code forces the critical tier.
    pub fn is_critical(&self, status: &str) -> bool {
        self.critical_statuses
            .iter()
            .any(|code| code.trim().eq_ignore_ascii_case(status))
    }

    pub fn status_label(&self, status: &str) -> Option<&str> {
        self.status_labels
            .iter()
            .find(|(code, _)| code.trim().eq_ignore_ascii_case(status))
            .map(|(_, label)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ScoringSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.composite_weights.risk, 1.5);
        assert_eq!(settings.risk_factors.utilization.curve, Curve::Quadratic);
        assert_eq!(settings.critical_statuses.len(), 6);
    }

    #[test]
    fn test_legacy_preset_overrides() {
        let legacy = Preset::Legacy.settings();
        assert_eq!(legacy.score_rounding, ScoreRounding::Ceil);
        assert_eq!(legacy.score_floor, 1.0);
        assert_eq!(legacy.composite_weights.risk, 1.0);
        assert!(!legacy.is_critical("RECA"));
        // untouched sections come from the canonical preset
        assert_eq!(legacy.alerts, ScoringSettings::default().alerts);
    }

    #[test]
    fn test_critical_membership_ignores_case() {
        let settings = ScoringSettings::default();
        assert!(settings.is_critical("BL"));
        assert!(settings.is_critical("reca"));
        assert!(!settings.is_critical("LI"));
        assert!(!settings.is_critical(""));
    }

    #[test]
    fn test_status_label_lookup() {
        let settings = ScoringSettings::default();
        assert_eq!(settings.status_label("TJ"), Some("Protestado"));
        assert_eq!(settings.status_label("XX"), None);
    }

    #[test]
    fn test_settings_serde_roundtrip() {
        let settings = ScoringSettings::legacy();
        let yaml = serde_saphyr::to_string(&settings).unwrap();
        let parsed: ScoringSettings = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(settings, parsed);
    }

    #[test]
    fn test_missing_key_fails_to_parse() {
        let settings = ScoringSettings::default();
        let yaml = serde_saphyr::to_string(&settings).unwrap();
        let without_discount: String = yaml
            .lines()
            .filter(|line| !line.starts_with("good_behavior_discount"))
            .collect::<Vec<_>>()
            .join("\n");
        let parsed: Result<ScoringSettings, _> = serde_saphyr::from_str(&without_discount);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_key_fails_to_parse() {
        let settings = ScoringSettings::default();
        let mut yaml = serde_saphyr::to_string(&settings).unwrap();
        yaml.push_str("\nbase_score: 100\n");
        let parsed: Result<ScoringSettings, _> = serde_saphyr::from_str(&yaml);
        assert!(parsed.is_err());
    }
}
