use serde::{Deserialize, Serialize};

use super::amount;
use crate::insights::{Segment, Trend};

/// One customer row as delivered by the portfolio API.
///
/// Field names on the wire follow the API (`limiteCredito`, `saldoDevedor`...).
/// Numeric fields tolerate currency strings and missing values. The id and
/// text fields are just as forgiving: an unreadable value falls back to 0 or
/// an empty string instead of rejecting the batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawCustomerRecord {
    #[serde(rename = "clienteId", default, deserialize_with = "amount::id")]
    pub customer_id: i64,

    #[serde(rename = "nomeCliente", default, deserialize_with = "amount::text")]
    pub name: String,

    #[serde(rename = "situacaoCredito", default, deserialize_with = "amount::text")]
    pub credit_status: String,

    #[serde(
        rename = "limiteCredito",
        alias = "limiteDeCredito",
        default,
        deserialize_with = "amount::lenient"
    )]
    pub credit_limit: f64,

    #[serde(rename = "saldoDevedor", default, deserialize_with = "amount::lenient")]
    pub outstanding_balance: f64,

    #[serde(rename = "titulosVencidos", default, deserialize_with = "amount::count")]
    pub overdue_invoices: u32,

    #[serde(
        rename = "diasVencidoMaisAntigo",
        alias = "diasDoVencidoMaisAntigo",
        default,
        deserialize_with = "amount::lenient"
    )]
    pub oldest_overdue_days: f64,

    /// Negative means the customer usually pays early.
    #[serde(rename = "atrasoMedioDias", default, deserialize_with = "amount::lenient")]
    pub average_delay_days: f64,

    #[serde(rename = "compras90Dias", default, deserialize_with = "amount::count")]
    pub purchases_90d: u32,

    #[serde(rename = "mediaCompra90Dias", default, deserialize_with = "amount::lenient")]
    pub average_ticket_90d: f64,

    // Weekly purchase values, week 1 is the most recent.
    #[serde(rename = "valorSemana1", default, deserialize_with = "amount::lenient")]
    pub week1_value: f64,
    #[serde(rename = "valorSemana2", default, deserialize_with = "amount::lenient")]
    pub week2_value: f64,
    #[serde(rename = "valorSemana3", default, deserialize_with = "amount::lenient")]
    pub week3_value: f64,
    #[serde(rename = "valorSemana4", default, deserialize_with = "amount::lenient")]
    pub week4_value: f64,
}

impl RawCustomerRecord {
    /// Status code trimmed and upper-cased ("  bl " -> "BL").
    pub fn normalized_status(&self) -> String {
        self.credit_status.trim().to_uppercase()
    }

    /// No outstanding balance and no purchases in the trailing 90 days.
    pub fn is_inactive(&self) -> bool {
        self.outstanding_balance == 0.0 && self.purchases_90d == 0
    }

    /// Credit utilization in percent, `None` only when the limit is not positive.
    ///
    /// A ratio that overflows saturates at `f64::MAX` so the most over-limit
    /// customers keep the highest utilization.
    pub fn credit_utilization(&self) -> Option<f64> {
        if self.credit_limit > 0.0 {
            let pct = self.outstanding_balance / self.credit_limit * 100.0;
            Some(if pct.is_nan() {
                0.0
            } else {
                pct.clamp(f64::MIN, f64::MAX)
            })
        } else {
            None
        }
    }
}

/// One sub-score that fed into the risk or value score.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorContribution {
    pub label: &'static str, // e.g. "Utilization", "Frequency"
    pub raw: f64,            // input metric
    pub score: f64,          // sub-score on the 0-10 (or capped) scale
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub risk: Vec<FactorContribution>,
    pub value: Vec<FactorContribution>,
    pub discount_applied: bool,
}

/// A customer row after scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedCustomerRecord {
    #[serde(flatten)]
    pub raw: RawCustomerRecord,

    /// `None` when the credit limit is not positive; shown as "N/A".
    #[serde(rename = "utilizacaoLimite")]
    pub utilization: Option<f64>,

    #[serde(rename = "perfilPagador")]
    pub payer_profile: String,

    #[serde(rename = "scoreRisco")]
    pub risk_score: f64,

    #[serde(rename = "scoreValor")]
    pub value_score: f64,

    /// Strategic value index (IVE).
    pub ive: f64,

    #[serde(rename = "classificacaoEstrelas")]
    pub stars: u8,

    #[serde(rename = "classificacaoNome")]
    pub tier_name: String,

    #[serde(rename = "alerta")]
    pub alert: Option<String>,

    #[serde(rename = "tendencia")]
    pub trend: Trend,

    #[serde(rename = "segmento")]
    pub segment: Option<Segment>,

    /// Sub-scores behind the numbers. Absent when an override decided the tier.
    #[serde(skip)]
    pub breakdown: Option<ScoreBreakdown>,
}
