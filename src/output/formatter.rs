use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::records::EnrichedCustomerRecord;
use crate::summary::PortfolioSummary;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Score with one decimal, trailing ".0" dropped ("7.5", "10").
/// Values that round to zero print as "0", never "-0".
pub fn format_score(score: f64) -> String {
    let formatted = match format!("{:.1}", score) {
        s if s == "-0.0" => "0.0".to_string(),
        s => s,
    };
    formatted
        .strip_suffix(".0")
        .map(str::to_string)
        .unwrap_or(formatted)
}

/// Utilization percentage rounded, or "N/A" when there is no credit limit.
pub fn format_utilization(utilization: Option<f64>) -> String {
    match utilization {
        Some(pct) => format!("{}%", pct.round() as i64),
        None => "N/A".to_string(),
    }
}

/// Five-slot star bar; inactive customers get a dash.
pub fn format_stars(stars: u8) -> String {
    if stars == 0 {
        return "-".to_string();
    }
    let filled = stars.min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn colored_stars(stars: u8, text: &str) -> String {
    match stars {
        5 | 4 => text.green().to_string(),
        3 => text.to_string(),
        2 => text.yellow().to_string(),
        1 => text.red().to_string(),
        _ => text.dimmed().to_string(),
    }
}

/// Format enriched customers as a table in input order.
/// Columns: ID, stars, risk, value, IVE, utilization, name, alert.
pub fn format_scored_table(records: &[EnrichedCustomerRecord], use_colors: bool) -> String {
    if records.is_empty() {
        return "No customers found.".to_string();
    }

    let term_width = get_terminal_width();
    let separator = "  ";
    // id(8) stars(5) risk(4) value(4) ive(6) util(5) + separators
    let fixed_width = 8 + 5 + 4 + 4 + 6 + 5 + separator.len() * 6;

    records
        .iter()
        .map(|record| {
            let id = format!("{:>8}", record.raw.customer_id);
            let stars = format_stars(record.stars);
            let stars_padded = format!("{:<5}", stars);
            let risk = format!("{:>4}", format_score(record.risk_score));
            let value = format!("{:>4}", format_score(record.value_score));
            let ive = format!("{:>6}", format_score(record.ive));
            let utilization = format!("{:>5}", format_utilization(record.utilization));

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&record.raw.name, (width - fixed_width).min(40))
                }
                Some(_) => truncate_name(&record.raw.name, 20),
                None => record.raw.name.clone(),
            };
            let alert = record.alert.as_deref().unwrap_or("");

            if use_colors {
                format!(
                    "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
                    id.dimmed(),
                    colored_stars(record.stars, &stars_padded),
                    risk,
                    value,
                    ive.bold(),
                    utilization,
                    name,
                    alert.red(),
                    sep = separator
                )
            } else {
                format!(
                    "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
                    id,
                    stars_padded,
                    risk,
                    value,
                    ive,
                    utilization,
                    name,
                    alert,
                    sep = separator
                )
                .trim_end()
                .to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format customers as tab-separated values for scripting
/// Columns: id, stars, tier, risk, value, ive, utilization, profile, alert, name (no headers, no colors)
pub fn format_tsv(records: &[EnrichedCustomerRecord]) -> String {
    records
        .iter()
        .map(|record| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                record.raw.customer_id,
                record.stars,
                record.tier_name,
                format_score(record.risk_score),
                format_score(record.value_score),
                format_score(record.ive),
                format_utilization(record.utilization),
                record.payer_profile,
                record.alert.as_deref().unwrap_or(""),
                record.raw.name.replace('\t', " ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty JSON array with the API field names.
pub fn format_json(records: &[EnrichedCustomerRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize enriched records")
}

/// Detailed multi-line output for a single customer (verbose mode)
pub fn format_record_detail(record: &EnrichedCustomerRecord, use_colors: bool) -> String {
    let header = format!(
        "#{} {} - {} {}",
        record.raw.customer_id,
        record.raw.name,
        format_stars(record.stars),
        record.tier_name
    );
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    lines.push(format!("  Status: {}", record.raw.normalized_status()));
    lines.push(format!(
        "  Utilization: {}  Payer profile: {}",
        format_utilization(record.utilization),
        record.payer_profile
    ));
    lines.push(format!(
        "  Risk: {}  Value: {}  IVE: {}",
        format_score(record.risk_score),
        format_score(record.value_score),
        format_score(record.ive)
    ));

    if let Some(breakdown) = &record.breakdown {
        for factor in &breakdown.risk {
            lines.push(format!(
                "    risk  {:<18} raw {:>10}  -> {:>4} (weight {})",
                factor.label,
                format_score(factor.raw),
                format_score(factor.score),
                factor.weight
            ));
        }
        for factor in &breakdown.value {
            lines.push(format!(
                "    value {:<18} raw {:>10}  -> {:>4}",
                factor.label,
                format_score(factor.raw),
                format_score(factor.score)
            ));
        }
        if breakdown.discount_applied {
            lines.push("    good behavior discount applied".to_string());
        }
    }

    lines.push(format!("  Trend: {}", record.trend));
    if let Some(segment) = record.segment {
        lines.push(format!("  Segment: {}", segment));
    }
    if let Some(alert) = &record.alert {
        let line = format!("  Alert: {}", alert);
        lines.push(if use_colors { line.red().to_string() } else { line });
    }

    lines.join("\n")
}

/// Portfolio totals and star distribution, one line each.
pub fn format_summary(summary: &PortfolioSummary, use_colors: bool) -> String {
    let mut lines = vec![
        format!("Customers:        {}", summary.total_customers),
        format!("Outstanding:      {:.2}", summary.total_balance),
        format!("Credit limit:     {:.2}", summary.total_credit_limit),
        format!("Available credit: {:.2}", summary.total_available),
        format!("With alerts:      {}", summary.alerts),
    ];
    for stars in (0..=5).rev() {
        let label = if stars == 0 {
            "Inactive".to_string()
        } else {
            format_stars(stars)
        };
        let label = format!("{:<8}", label);
        let label = if use_colors {
            colored_stars(stars, &label)
        } else {
            label
        };
        lines.push(format!("  {}  {}", label, summary.count(stars)));
    }
    lines.join("\n")
}
