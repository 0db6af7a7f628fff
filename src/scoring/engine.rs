use tracing::{debug, trace};

use super::config::{AlertLimits, ScoringSettings};
use super::factors::{
    bounded, capped_ratio, finalize_score, payer_profile, star_tier, tier_name, weighted_average,
    MAX_SCORE, PROFILE_NO_HISTORY,
};
use crate::insights::{purchase_trend, strategic_segment};
use crate::records::{EnrichedCustomerRecord, FactorContribution, RawCustomerRecord, ScoreBreakdown};

pub const ALERT_BLOCKED: &str = "Cliente Bloqueado!";
pub const ALERT_OVER_LIMIT: &str = "Cliente operando acima do limite!";

/// Literal status name some sources send instead of the code.
const BLOCKED_STATUS_NAME: &str = "BLOQUEADO";

/// Score every record. Output order matches input order; nothing is
/// filtered and the inputs are not modified.
pub fn enrich(
    records: &[RawCustomerRecord],
    settings: &ScoringSettings,
) -> Vec<EnrichedCustomerRecord> {
    let enriched: Vec<_> = records
        .iter()
        .map(|record| enrich_record(record, settings))
        .collect();
    debug!(records = enriched.len(), "portfolio enriched");
    enriched
}

/// Intermediate result before the overrides and insights are applied.
struct Assessment {
    payer_profile: String,
    risk_score: f64,
    value_score: f64,
    stars: u8,
    tier_name: String,
    alert: Option<String>,
    breakdown: Option<ScoreBreakdown>,
}

pub fn enrich_record(record: &RawCustomerRecord, settings: &ScoringSettings) -> EnrichedCustomerRecord {
    let utilization = record.credit_utilization();
    let status = record.normalized_status();

    let mut assessment = if settings.is_critical(&status) {
        critical_assessment(&status, settings)
    } else {
        scored_assessment(record, utilization, &status, settings)
    };

    // Inactivity is the final word, including over a critical status.
    if record.is_inactive() {
        trace!(customer = record.customer_id, "inactive override");
        assessment.stars = 0;
        assessment.tier_name = settings.tier_names.inactive.clone();
        assessment.risk_score = 0.0;
        assessment.value_score = 0.0;
        assessment.payer_profile = PROFILE_NO_HISTORY.to_string();
        assessment.breakdown = None;
    }

    let ive = composite_index(assessment.value_score, assessment.risk_score, settings);
    let trend = purchase_trend(record, &settings.insights);
    let segment = strategic_segment(
        assessment.stars,
        trend,
        record.credit_limit,
        utilization,
        &settings.insights,
    );

    EnrichedCustomerRecord {
        raw: record.clone(),
        utilization,
        payer_profile: assessment.payer_profile,
        risk_score: assessment.risk_score,
        value_score: assessment.value_score,
        ive,
        stars: assessment.stars,
        tier_name: assessment.tier_name,
        alert: assessment.alert,
        trend,
        segment,
        breakdown: assessment.breakdown,
    }
}

/// IVE: value weighted up, risk weighted down.
pub fn composite_index(value_score: f64, risk_score: f64, settings: &ScoringSettings) -> f64 {
    let weights = &settings.composite_weights;
    let index = value_score * weights.value - risk_score * weights.risk;
    if index.is_finite() {
        index
    } else {
        0.0
    }
}

fn critical_assessment(status: &str, settings: &ScoringSettings) -> Assessment {
    let label = settings
        .status_label(status)
        .unwrap_or(&settings.tier_names.critical_fallback)
        .to_string();

    let alert = if is_blocked(status, &settings.alerts) {
        ALERT_BLOCKED.to_string()
    } else {
        format!("Situação de crédito crítica: {}.", label)
    };

    Assessment {
        payer_profile: label.clone(),
        risk_score: MAX_SCORE,
        value_score: 0.0,
        stars: 1,
        tier_name: label,
        alert: Some(alert),
        breakdown: None,
    }
}

fn scored_assessment(
    record: &RawCustomerRecord,
    utilization: Option<f64>,
    status: &str,
    settings: &ScoringSettings,
) -> Assessment {
    let factors = &settings.risk_factors;
    let weights = &settings.risk_weights;

    let utilization_pct = utilization.unwrap_or(0.0);
    let mut utilization_risk = factors.utilization.score(utilization_pct);
    let overdue_risk = factors.overdue_invoices.score(record.overdue_invoices as f64);
    let delay_risk = factors.average_delay.score(record.average_delay_days);

    let discount_applied = record.overdue_invoices == 0 && record.oldest_overdue_days <= 0.0;
    if discount_applied {
        utilization_risk *= 1.0 - bounded(settings.good_behavior_discount, 0.0, 1.0);
    }

    let risk_raw = weighted_average(&[
        (utilization_risk, weights.utilization),
        (overdue_risk, weights.overdue_invoices),
        (delay_risk, weights.average_delay),
    ]);
    let risk_score = finalize_score(risk_raw, settings.score_rounding, settings.score_floor);

    let value = &settings.value_factors;
    let frequency = capped_ratio(
        record.purchases_90d as f64,
        value.frequency_divisor,
        value.factor_cap,
    );
    let ticket = capped_ratio(record.average_ticket_90d, value.ticket_divisor, value.factor_cap);
    let value_score =
        finalize_score(frequency + ticket, settings.score_rounding, settings.score_floor);

    let index = composite_index(value_score, risk_score, settings);
    let stars = star_tier(index, &settings.star_thresholds);

    trace!(
        customer = record.customer_id,
        risk_score,
        value_score,
        index,
        stars,
        "scored"
    );

    Assessment {
        payer_profile: payer_profile(record.average_delay_days, &settings.payer_profile)
            .to_string(),
        risk_score,
        value_score,
        stars,
        tier_name: tier_name(stars, &settings.tier_names).to_string(),
        alert: evaluate_alert(status, utilization, record.oldest_overdue_days, &settings.alerts),
        breakdown: Some(ScoreBreakdown {
            risk: vec![
                FactorContribution {
                    label: "Utilization",
                    raw: utilization_pct,
                    score: utilization_risk,
                    weight: weights.utilization,
                },
                FactorContribution {
                    label: "Overdue invoices",
                    raw: record.overdue_invoices as f64,
                    score: overdue_risk,
                    weight: weights.overdue_invoices,
                },
                FactorContribution {
                    label: "Average delay",
                    raw: record.average_delay_days,
                    score: delay_risk,
                    weight: weights.average_delay,
                },
            ],
            value: vec![
                FactorContribution {
                    label: "Frequency",
                    raw: record.purchases_90d as f64,
                    score: frequency,
                    weight: 1.0,
                },
                FactorContribution {
                    label: "Average ticket",
                    raw: record.average_ticket_90d,
                    score: ticket,
                    weight: 1.0,
                },
            ],
            discount_applied,
        }),
    }
}

fn is_blocked(status: &str, alerts: &AlertLimits) -> bool {
    status == BLOCKED_STATUS_NAME || alerts.blocked_status.trim().eq_ignore_ascii_case(status)
}

/// First matching alert wins.
pub fn evaluate_alert(
    status: &str,
    utilization: Option<f64>,
    oldest_overdue_days: f64,
    alerts: &AlertLimits,
) -> Option<String> {
    if !status.is_empty() && is_blocked(status, alerts) {
        return Some(ALERT_BLOCKED.to_string());
    }
    if let Some(pct) = utilization {
        if pct > alerts.over_limit_pct {
            return Some(ALERT_OVER_LIMIT.to_string());
        }
    }
    if oldest_overdue_days > alerts.critical_overdue_days {
        return Some(format!(
            "Título vencido há mais de {} dias.",
            alerts.critical_overdue_days
        ));
    }
    match utilization {
        Some(pct) if pct > alerts.utilization_pct => Some(format!(
            "Limite de crédito quase esgotado ({}%).",
            pct.round() as i64
        )),
        _ => None,
    }
}
