use serde::Serialize;
use std::collections::BTreeMap;

use crate::records::EnrichedCustomerRecord;

/// Portfolio totals and the number of customers per star tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    #[serde(rename = "totalClientes")]
    pub total_customers: usize,
    #[serde(rename = "totalSaldoDevedor")]
    pub total_balance: f64,
    #[serde(rename = "totalLimiteCredito")]
    pub total_credit_limit: f64,
    /// Sum of unused limit per customer; over-limit customers add nothing.
    #[serde(rename = "totalSaldoDisponivel")]
    pub total_available: f64,
    /// Every tier 0..=5 is present, zero counts included.
    #[serde(rename = "distribuicaoEstrelas")]
    pub star_distribution: BTreeMap<u8, usize>,
    /// Customers carrying an alert.
    #[serde(rename = "totalAlertas")]
    pub alerts: usize,
}

impl PortfolioSummary {
    pub fn count(&self, stars: u8) -> usize {
        self.star_distribution.get(&stars).copied().unwrap_or(0)
    }
}

pub fn summarize(records: &[EnrichedCustomerRecord]) -> PortfolioSummary {
    let mut star_distribution: BTreeMap<u8, usize> = (0..=5).map(|stars| (stars, 0)).collect();
    let mut total_balance = 0.0;
    let mut total_credit_limit = 0.0;
    let mut total_available = 0.0;
    let mut alerts = 0;

    for record in records {
        *star_distribution.entry(record.stars).or_insert(0) += 1;
        total_balance += record.raw.outstanding_balance;
        total_credit_limit += record.raw.credit_limit;
        total_available += (record.raw.credit_limit - record.raw.outstanding_balance).max(0.0);
        if record.alert.is_some() {
            alerts += 1;
        }
    }

    PortfolioSummary {
        total_customers: records.len(),
        total_balance,
        total_credit_limit,
        total_available,
        star_distribution,
        alerts,
    }
}
