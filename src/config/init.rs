use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_settings_path, save_settings};
use crate::scoring::{validate_settings, Preset};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes" || input == "s" || input == "sim")
    }
}

/// Ask for a number until one passes `check`. Accepts "0,4" as well as "0.4".
fn prompt_number(message: &str, default: f64, check: impl Fn(f64) -> Result<(), String>) -> Result<f64> {
    loop {
        let input = prompt_with_default(message, &default.to_string())?;
        match input.replace(',', ".").parse::<f64>() {
            Ok(v) if v.is_finite() => match check(v) {
                Ok(()) => return Ok(v),
                Err(reason) => println!("  Invalid: {}. Try again.", reason),
            },
            _ => println!("  Invalid: not a number. Try again."),
        }
    }
}

fn non_negative(v: f64) -> Result<(), String> {
    if v >= 0.0 {
        Ok(())
    } else {
        Err("must be non-negative".to_string())
    }
}

fn fraction(v: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err("must be between 0 and 1".to_string())
    }
}

fn any(_: f64) -> Result<(), String> {
    Ok(())
}

/// Run the interactive wizard that writes a settings file.
///
/// Starts from `preset` and optionally walks through the weights an analyst
/// usually tunes. If `default_path` is Some, it is offered as the save path.
pub fn run_init_wizard(default_path: Option<PathBuf>, preset: Preset) -> Result<()> {
    println!();
    println!("Carteira Score Settings Wizard");
    println!("==============================");
    println!();

    let mut settings = preset.settings();

    if prompt_yes_no("Tune weights and thresholds? (n keeps the preset)", false)? {
        println!();
        println!("Risk score weights are relative: they are normalized by their sum.");
        let w = settings.risk_weights;
        settings.risk_weights.utilization =
            prompt_number("Weight: credit utilization", w.utilization, non_negative)?;
        settings.risk_weights.overdue_invoices =
            prompt_number("Weight: overdue invoices", w.overdue_invoices, non_negative)?;
        settings.risk_weights.average_delay =
            prompt_number("Weight: average payment delay", w.average_delay, non_negative)?;

        println!();
        println!("Customers with nothing overdue get their utilization risk discounted.");
        settings.good_behavior_discount = prompt_number(
            "Good behavior discount (0-1)",
            settings.good_behavior_discount,
            fraction,
        )?;

        println!();
        println!("IVE = value score x value weight - risk score x risk weight");
        let c = settings.composite_weights;
        settings.composite_weights.value = prompt_number("IVE value weight", c.value, non_negative)?;
        settings.composite_weights.risk = prompt_number("IVE risk weight", c.risk, non_negative)?;

        println!();
        println!("Minimum IVE for each star tier (must descend).");
        let t = settings.star_thresholds;
        settings.star_thresholds.five = prompt_number("5 stars from IVE", t.five, any)?;
        settings.star_thresholds.four = prompt_number("4 stars from IVE", t.four, any)?;
        settings.star_thresholds.three = prompt_number("3 stars from IVE", t.three, any)?;
        settings.star_thresholds.two = prompt_number("2 stars from IVE", t.two, any)?;

        println!();
        let a = settings.alerts.clone();
        settings.alerts.utilization_pct =
            prompt_number("Alert when utilization exceeds (%)", a.utilization_pct, non_negative)?;
        settings.alerts.critical_overdue_days = prompt_number(
            "Alert when oldest overdue invoice exceeds (days)",
            a.critical_overdue_days,
            non_negative,
        )?;
    }

    if let Err(errors) = validate_settings(&settings) {
        println!();
        println!("These settings are not valid:");
        for error in &errors {
            println!("  - {}", error);
        }
        anyhow::bail!("Settings not saved ({} errors)", errors.len());
    }

    let default_settings_path = match default_path {
        Some(path) => path,
        None => get_settings_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the settings be saved?",
        &default_settings_path.display().to_string(),
    )?;
    let settings_path = PathBuf::from(&path_str);

    if settings_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Settings already exist at {}. Overwrite?",
                settings_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    save_settings(&settings_path, &settings)?;

    println!();
    println!("Settings written to {}", settings_path.display());
    println!("Run `carteira-score score --input clientes.json` to score a portfolio.");

    Ok(())
}
