use super::config::{FactorCurve, ScoringSettings, SETTINGS_VERSION};

fn check_non_negative(errors: &mut Vec<String>, path: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{}: must be a non-negative number", path));
    }
}

fn check_positive(errors: &mut Vec<String>, path: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(format!("{}: must be greater than zero", path));
    }
}

fn check_curve(errors: &mut Vec<String>, path: &str, curve: &FactorCurve) {
    check_positive(errors, &format!("{}.full_scale", path), curve.full_scale);
}

/// Validate scoring settings before they reach the engine.
/// Returns all validation errors at once (not just the first).
pub fn validate_settings(settings: &ScoringSettings) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if settings.version != SETTINGS_VERSION {
        errors.push(format!(
            "version: unsupported settings version {} (expected {})",
            settings.version, SETTINGS_VERSION
        ));
    }

    // Risk weights
    let w = &settings.risk_weights;
    check_non_negative(&mut errors, "risk_weights.utilization", w.utilization);
    check_non_negative(&mut errors, "risk_weights.overdue_invoices", w.overdue_invoices);
    check_non_negative(&mut errors, "risk_weights.average_delay", w.average_delay);
    if w.utilization + w.overdue_invoices + w.average_delay <= 0.0 {
        errors.push("risk_weights: at least one weight must be greater than zero".to_string());
    }

    // Risk curves
    let f = &settings.risk_factors;
    check_curve(&mut errors, "risk_factors.utilization", &f.utilization);
    check_curve(&mut errors, "risk_factors.overdue_invoices", &f.overdue_invoices);
    check_curve(&mut errors, "risk_factors.average_delay", &f.average_delay);

    if !(0.0..=1.0).contains(&settings.good_behavior_discount) {
        errors.push("good_behavior_discount: must be between 0 and 1".to_string());
    }

    // Value factors
    let v = &settings.value_factors;
    check_positive(&mut errors, "value_factors.frequency_divisor", v.frequency_divisor);
    check_positive(&mut errors, "value_factors.ticket_divisor", v.ticket_divisor);
    check_positive(&mut errors, "value_factors.factor_cap", v.factor_cap);

    if !(0.0..=1.0).contains(&settings.score_floor) {
        errors.push("score_floor: must be between 0 and 1".to_string());
    }

    check_non_negative(&mut errors, "composite_weights.value", settings.composite_weights.value);
    check_non_negative(&mut errors, "composite_weights.risk", settings.composite_weights.risk);

    // Star thresholds must strictly descend from five to two
    let t = &settings.star_thresholds;
    let tiers = [("five", t.five), ("four", t.four), ("three", t.three), ("two", t.two)];
    for (name, value) in tiers {
        if !value.is_finite() {
            errors.push(format!("star_thresholds.{}: must be a finite number", name));
        }
    }
    for pair in tiers.windows(2) {
        let (upper, upper_value) = pair[0];
        let (lower, lower_value) = pair[1];
        if upper_value <= lower_value {
            errors.push(format!(
                "star_thresholds.{}: must be greater than star_thresholds.{} ({} <= {})",
                upper, lower, upper_value, lower_value
            ));
        }
    }

    // Tier names
    let n = &settings.tier_names;
    let names = [
        ("five", &n.five),
        ("four", &n.four),
        ("three", &n.three),
        ("two", &n.two),
        ("one", &n.one),
        ("inactive", &n.inactive),
        ("critical_fallback", &n.critical_fallback),
    ];
    for (key, name) in names {
        if name.trim().is_empty() {
            errors.push(format!("tier_names.{}: must not be empty", key));
        }
    }

    // Payer profile
    let p = &settings.payer_profile;
    check_non_negative(&mut errors, "payer_profile.light_delay_days", p.light_delay_days);
    check_non_negative(&mut errors, "payer_profile.critical_delay_days", p.critical_delay_days);
    if p.light_delay_days > p.critical_delay_days {
        errors.push(
            "payer_profile.light_delay_days: must not exceed critical_delay_days".to_string(),
        );
    }

    // Alerts
    let a = &settings.alerts;
    check_non_negative(&mut errors, "alerts.utilization_pct", a.utilization_pct);
    check_non_negative(&mut errors, "alerts.over_limit_pct", a.over_limit_pct);
    check_non_negative(&mut errors, "alerts.critical_overdue_days", a.critical_overdue_days);
    if a.blocked_status.trim().is_empty() {
        errors.push("alerts.blocked_status: must not be empty".to_string());
    }

    for (i, code) in settings.critical_statuses.iter().enumerate() {
        if code.trim().is_empty() {
            errors.push(format!("critical_statuses[{}]: must not be blank", i));
        }
    }
    for (code, label) in &settings.status_labels {
        if label.trim().is_empty() {
            errors.push(format!("status_labels.{}: must not be empty", code));
        }
    }

    let i = &settings.insights;
    check_non_negative(&mut errors, "insights.trend_tolerance_pct", i.trend_tolerance_pct);
    check_non_negative(
        &mut errors,
        "insights.hidden_potential_max_utilization_pct",
        i.hidden_potential_max_utilization_pct,
    );
    check_non_negative(
        &mut errors,
        "insights.hidden_potential_min_limit",
        i.hidden_potential_min_limit,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(validate_settings(&ScoringSettings::default()).is_ok());
        assert!(validate_settings(&ScoringSettings::legacy()).is_ok());
    }

    #[test]
    fn test_unsupported_version() {
        let settings = ScoringSettings {
            version: 2,
            ..Default::default()
        };
        let errors = validate_settings(&settings).unwrap_err();
        assert!(errors[0].starts_with("version"));
    }

    #[test]
    fn test_negative_weight() {
        let mut settings = ScoringSettings::default();
        settings.risk_weights.average_delay = -0.2;
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("risk_weights.average_delay"));
    }

    #[test]
    fn test_all_zero_weights() {
        let mut settings = ScoringSettings::default();
        settings.risk_weights.utilization = 0.0;
        settings.risk_weights.overdue_invoices = 0.0;
        settings.risk_weights.average_delay = 0.0;
        let errors = validate_settings(&settings).unwrap_err();
        assert!(errors[0].contains("at least one weight"));
    }

    #[test]
    fn test_zero_full_scale() {
        let mut settings = ScoringSettings::default();
        settings.risk_factors.overdue_invoices.full_scale = 0.0;
        let errors = validate_settings(&settings).unwrap_err();
        assert!(errors[0].contains("risk_factors.overdue_invoices.full_scale"));
    }

    #[test]
    fn test_discount_out_of_range() {
        let settings = ScoringSettings {
            good_behavior_discount: 1.5,
            ..Default::default()
        };
        let errors = validate_settings(&settings).unwrap_err();
        assert!(errors[0].contains("good_behavior_discount"));
    }

    #[test]
    fn test_thresholds_must_descend() {
        let mut settings = ScoringSettings::default();
        settings.star_thresholds.three = 3.0; // above four (2.0)
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("star_thresholds.four"));
    }

    #[test]
    fn test_nan_threshold() {
        let mut settings = ScoringSettings::default();
        settings.star_thresholds.five = f64::NAN;
        let errors = validate_settings(&settings).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("star_thresholds.five: must be a finite")));
    }

    #[test]
    fn test_payer_profile_order() {
        let mut settings = ScoringSettings::default();
        settings.payer_profile.light_delay_days = 40.0;
        let errors = validate_settings(&settings).unwrap_err();
        assert!(errors[0].contains("payer_profile.light_delay_days"));
    }

    #[test]
    fn test_blank_critical_code_and_empty_name() {
        let mut settings = ScoringSettings::default();
        settings.critical_statuses.push("  ".to_string());
        settings.tier_names.inactive = String::new();
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("critical_statuses[6]")));
        assert!(errors.iter().any(|e| e.contains("tier_names.inactive")));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = ScoringSettings::default();
        settings.value_factors.ticket_divisor = 0.0; // Error 1
        settings.score_floor = 2.0; // Error 2
        settings.alerts.utilization_pct = -1.0; // Error 3
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
