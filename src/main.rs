use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carteira_score::config;
use carteira_score::output;
use carteira_score::records::{self, RawCustomerRecord};
use carteira_score::scoring::{self, Preset, ScoringSettings};
use carteira_score::summary::summarize;
use carteira_score::worker::AnalysisWorker;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Tsv,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Canonical,
    Legacy,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Canonical => Preset::Canonical,
            PresetArg::Legacy => Preset::Legacy,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score customers and print them in input order (default)
    Score {
        /// JSON file with customer rows, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Only print customers in this star tier (0 = inactive)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
        stars: Option<u8>,
    },
    /// Print portfolio totals and the star distribution
    Summary {
        /// JSON file with customer rows, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the settings file and list every problem
    Check,
    /// Create a settings file interactively
    Init {
        #[arg(long, value_enum, default_value_t = PresetArg::Canonical)]
        preset: PresetArg,
    },
    /// Re-score whenever the settings file changes
    Watch {
        /// JSON file with customer rows
        #[arg(short, long)]
        input: PathBuf,

        /// How often to look at the settings file (e.g. "2s", "500ms")
        #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
        interval: Duration,
    },
}

#[derive(Parser, Debug)]
#[command(name = "carteira-score")]
#[command(about = "Credit portfolio risk and value scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to settings file (defaults to ~/.config/carteira-score/settings.yaml)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "carteira_score=debug"
    } else {
        "carteira_score=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate settings, exiting with EXIT_CONFIG on any problem.
fn settings_or_exit(path: Option<&Path>) -> ScoringSettings {
    let settings = match config::resolve_settings(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = scoring::validate_settings(&settings) {
        eprintln!("Settings errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    settings
}

fn records_or_exit(input: &Path) -> Vec<RawCustomerRecord> {
    match records::load_records(input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Score {
        input: PathBuf::from("-"),
        format: OutputFormat::Table,
        stars: None,
    });
    let settings_path = cli.settings.as_deref();

    match command {
        Commands::Score {
            input,
            format,
            stars,
        } => {
            let start_time = Instant::now();
            let settings = settings_or_exit(settings_path);
            let raw = records_or_exit(&input);
            debug!(records = raw.len(), "loaded customer rows");

            let enriched = scoring::enrich(&raw, &settings);
            let shown: Vec<_> = match stars {
                Some(tier) => enriched.into_iter().filter(|r| r.stars == tier).collect(),
                None => enriched,
            };

            match format {
                OutputFormat::Table => {
                    let use_colors = output::should_use_colors();
                    if cli.verbose && !shown.is_empty() {
                        for record in &shown {
                            println!("{}", output::format_record_detail(record, use_colors));
                            println!();
                        }
                    } else {
                        println!("{}", output::format_scored_table(&shown, use_colors));
                    }
                }
                OutputFormat::Tsv => println!("{}", output::format_tsv(&shown)),
                OutputFormat::Json => match output::format_json(&shown) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Output error: {:#}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                },
            }

            debug!(
                shown = shown.len(),
                elapsed = ?start_time.elapsed(),
                "scoring finished"
            );
        }
        Commands::Summary { input, json } => {
            let settings = settings_or_exit(settings_path);
            let raw = records_or_exit(&input);
            let summary = summarize(&scoring::enrich(&raw, &settings));

            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Output error: {}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                }
            } else {
                println!(
                    "{}",
                    output::format_summary(&summary, output::should_use_colors())
                );
            }
        }
        Commands::Check => {
            settings_or_exit(settings_path);
            match settings_path {
                Some(path) => println!("Settings OK: {}", path.display()),
                None => println!("Settings OK"),
            }
        }
        Commands::Init { preset } => {
            let default_path = cli.settings.clone();
            if let Err(e) = config::init::run_init_wizard(default_path, preset.into()) {
                eprintln!("Init error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
        Commands::Watch { input, interval } => {
            let path = match cli.settings.clone() {
                Some(p) => p,
                None => match config::get_settings_path() {
                    Ok(p) => p,
                    Err(e) => {
                        eprintln!("Config error: {:#}", e);
                        std::process::exit(EXIT_CONFIG);
                    }
                },
            };
            let raw = Arc::new(records_or_exit(&input));
            let settings = settings_or_exit(Some(&path));
            watch(path, raw, settings, interval).await;
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the settings file and re-score on every change until Ctrl-C.
/// Invalid edits are reported and the previous settings stay in effect.
async fn watch(
    path: PathBuf,
    records: Arc<Vec<RawCustomerRecord>>,
    settings: ScoringSettings,
    interval: Duration,
) {
    let mut worker = AnalysisWorker::spawn();
    let mut results = worker.subscribe();
    let mut last_modified = modified_at(&path);
    worker.submit(Arc::clone(&records), Arc::new(settings));
    info!(path = %path.display(), "watching settings");

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let modified = modified_at(&path);
                if modified == last_modified {
                    continue;
                }
                last_modified = modified;

                match config::load_settings(&path) {
                    Ok(updated) => match scoring::validate_settings(&updated) {
                        Ok(()) => {
                            let generation = worker.submit(Arc::clone(&records), Arc::new(updated));
                            debug!(generation, "settings changed, re-scoring");
                        }
                        Err(errors) => {
                            for error in errors {
                                warn!("settings rejected: {}", error);
                            }
                        }
                    },
                    Err(e) => warn!("settings rejected: {:#}", e),
                }
            }
            changed = results.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = results.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    println!(
                        "{}",
                        output::format_summary(&snapshot.summary, output::should_use_colors())
                    );
                    println!();
                }
            }
        }
    }

    worker.shutdown().await;
}
