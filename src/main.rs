//! Wattlytics - Electricity Bill Analytics Tool
//!
//! A CLI for analyzing monthly electricity bills under a slab tariff.
//! Loads bills from CSV, manual entries or sample data and reports trends,
//! saving tips, household comparisons and next-month predictions.

mod analytics;
mod comparison;
mod config;
mod display;
mod error;
mod export;
mod helpers;
mod logging;
mod models;
mod parser;
mod projections;
mod recommendations;
mod session;
mod tariff;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, ConfigOverrides, OutputFormat};
use display::{
    display_bill, display_comparison, display_history_table, display_json, display_load_report,
    display_prediction, display_report_enhanced, display_report_table, display_tips, print_error,
    print_info, print_warning,
};
use error::WattlyticsError;
use export::{export_history_to_csv, export_summary_to_csv};
use models::{LoadReport, validate_quantity};
use serde_json::json;
use session::{DashboardReport, Session};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "wattlytics")]
#[command(about = "Electricity bill analytics - slab tariffs, trends, tips and predictions")]
#[command(version)]
#[command(
    long_about = "Wattlytics analyzes monthly electricity bills priced with a slab tariff.

EXAMPLES:
  wattlytics --sample                       # Analyze 12 months of sample bills
  wattlytics --sample=24 predict            # Predict from 24 sample months
  wattlytics --file bills.csv               # Analyze bills from a CSV file
  wattlytics --entry Jan-24:250 --entry Feb-24:280:1500 predict
  wattlytics --sample --update Mar-24:200 --drop Apr-24 history
  cat bills.csv | wattlytics --file - tips
  wattlytics --file bills.csv --json tips   # Saving tips as JSON
  wattlytics --tariff \"100:3,200:4.5,*:8\" bill 350
  wattlytics --sample export -o report      # Write report.history.csv and report.summary.csv
  wattlytics config --show                  # View current configuration

INPUT:
  The CSV file needs a header of month,units,amount. Rows that fail to parse
  are skipped and reported; an empty amount is rejected."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        short,
        long,
        value_name = "PATH",
        global = true,
        help = "Load bills from a CSV file (- for stdin)",
        long_help = "Load bills from a CSV file with a month,units,amount header.\nUse - to read from standard input.\nMalformed rows are skipped and listed with their line number."
    )]
    file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "MONTHS",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "12",
        global = true,
        help = "Load generated sample bills (default 12 months)",
        long_help = "Load generated sample bills. Defaults to 12 months; pass a count with --sample=N.\nSample labels must not collide with bills already loaded."
    )]
    sample: Option<usize>,

    #[arg(
        short,
        long = "entry",
        value_name = "LABEL:UNITS[:AMOUNT]",
        global = true,
        help = "Add a bill manually (repeatable)",
        long_help = "Add a bill manually. Repeat for several months.\nWhen AMOUNT is omitted it is computed from the tariff.\nExample: --entry Jan-24:250 --entry Feb-24:280:1500"
    )]
    entries: Vec<String>,

    #[arg(
        short,
        long = "update",
        value_name = "LABEL:UNITS[:AMOUNT]",
        global = true,
        help = "Replace an already loaded bill (repeatable)"
    )]
    updates: Vec<String>,

    #[arg(
        long = "drop",
        value_name = "LABEL",
        global = true,
        help = "Remove a loaded bill before analysis (repeatable)"
    )]
    drops: Vec<String>,

    #[arg(
        short,
        long,
        global = true,
        help = "Output in JSON format",
        long_help = "Output the report as pretty-printed JSON for scripting and pipelines"
    )]
    json: bool,

    #[arg(
        long,
        global = true,
        help = "Use plain tables instead of the enhanced view"
    )]
    classic: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Show debug diagnostics on stderr"
    )]
    verbose: bool,

    #[arg(
        short,
        long,
        value_name = "PATH",
        global = true,
        help = "Use this config file instead of the default"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "SLABS",
        global = true,
        help = "Slab tariff, e.g. \"100:3,200:4.5,*:8\"",
        long_help = "Override the slab tariff. Each entry is UPPER:RATE with slabs in ascending order;\nthe last entry uses * as an open upper bound.\nExample: --tariff \"100:3,200:4.5,300:6,*:8\""
    )]
    tariff: Option<String>,

    #[arg(
        long,
        value_name = "AMOUNT",
        global = true,
        help = "Override the fixed monthly charge"
    )]
    fixed_charge: Option<f64>,

    #[arg(
        long,
        value_name = "FRACTION",
        global = true,
        help = "High consumption threshold above the average (e.g. 0.2)"
    )]
    threshold: Option<f64>,

    #[arg(
        long,
        value_name = "FRACTION",
        global = true,
        help = "Prediction margin for best/worst cases (e.g. 0.1)"
    )]
    margin: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full dashboard: bills, summary, tips, comparison and prediction (default)
    #[command(alias = "a")]
    Analyze,
    /// Money-saving tips with estimated savings
    #[command(alias = "t")]
    Tips,
    /// Compare average consumption with household benchmarks
    #[command(alias = "c")]
    Compare,
    /// Predict next month's consumption and bill
    #[command(alias = "p")]
    Predict,
    /// Compute the bill for a number of units with a slab breakdown
    #[command(alias = "b")]
    Bill {
        /// Units consumed (kWh)
        units: f64,
    },
    /// List loaded bills with high consumption months highlighted
    #[command(alias = "h")]
    History,
    /// Export bills and summary to CSV
    #[command(alias = "e")]
    Export {
        #[arg(
            short,
            long,
            value_name = "BASE",
            help = "Output base path (default: wattlytics_export in the export directory)"
        )]
        output: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[arg(long, help = "Show the current configuration")]
        show: bool,
        #[arg(long, help = "Reset the configuration file to defaults")]
        reset: bool,
        #[arg(long, help = "Write a default configuration file if none exists")]
        init: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Render {
    Enhanced,
    Table,
    Json,
}

fn main() {
    if let Err(e) = run() {
        let message = match e.downcast_ref::<WattlyticsError>() {
            Some(err) => err.detailed_message(),
            None => format!("{:#}", e),
        };
        print_error(&message);
        std::process::exit(1);
    }
}

/// Main application logic
fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    // Config commands work on the file itself, before overrides
    if let Some(Commands::Config { show, reset, init }) = &cli.command {
        return handle_config_command(&config_path, *show, *reset, *init);
    }

    let config = Config::load_from(&config_path)?;
    let overrides = ConfigOverrides {
        tariff_spec: cli.tariff.clone(),
        fixed_charge: cli.fixed_charge,
        high_consumption_threshold: cli.threshold,
        prediction_margin: cli.margin,
    };
    let config = config.with_overrides(&overrides)?;

    let render = if cli.json {
        Render::Json
    } else if cli.classic {
        Render::Table
    } else {
        match config.default_output_format {
            OutputFormat::Enhanced => Render::Enhanced,
            OutputFormat::Table => Render::Table,
            OutputFormat::Json => Render::Json,
        }
    };

    let mut session = Session::new(config)?;

    // Bill calculation needs a tariff only
    if let Some(Commands::Bill { units }) = &cli.command {
        return handle_bill_command(&session, *units, render);
    }

    load_input(&mut session, &cli, render)?;
    let report = session.analyze()?;

    match cli.command.unwrap_or(Commands::Analyze) {
        Commands::Analyze => match render {
            Render::Json => display_json(&report)?,
            Render::Table => display_report_table(&report),
            Render::Enhanced => display_report_enhanced(&report),
        },
        Commands::Tips => match render {
            Render::Json => display_json(&json!({
                "tips": report.tips,
                "savings": report.savings,
            }))?,
            _ => display_tips(&report.tips, &report.savings),
        },
        Commands::Compare => match render {
            Render::Json => display_json(&json!({
                "average_units": report.summary.avg_units,
                "comparisons": report.comparisons,
                "profile": report.profile,
            }))?,
            _ => display_comparison(&report.comparisons, report.profile.as_ref()),
        },
        Commands::Predict => match render {
            Render::Json => display_json(&report.prediction)?,
            _ => display_prediction(&report.prediction),
        },
        Commands::History => match render {
            Render::Json => display_json(&json!({
                "history": report.history,
                "high_consumption": report.high_consumption,
                "monthly_rates": report.monthly_rates,
            }))?,
            _ => display_history_table(&report.history, &report.high_consumption),
        },
        Commands::Export { output } => {
            handle_export_command(&report, output.as_deref(), session.config())?
        }
        Commands::Bill { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}

/// File first, then sample bills, manual entries, updates and drops on top
fn load_input(session: &mut Session, cli: &Cli, render: Render) -> Result<()> {
    if let Some(path) = &cli.file {
        if path.as_os_str() == "-" {
            let report = session.load_tabular(std::io::stdin().lock())?;
            show_load_report("stdin", &report, render);
        } else {
            let report = session
                .load_file(path)
                .with_context(|| format!("Failed to load bills from {}", path.display()))?;
            show_load_report(&path.display().to_string(), &report, render);
        }
    }

    if let Some(months) = cli.sample {
        let report = session.load_sample(months)?;
        show_load_report("sample data", &report, render);
    }

    for entry in &cli.entries {
        let (label, units, amount) = parse_entry(entry)?;
        session.add_record(&label, units, amount)?;
    }

    for update in &cli.updates {
        let (label, units, amount) = parse_entry(update)?;
        session.update_record(&label, units, amount)?;
    }

    for label in &cli.drops {
        session.remove_record(label)?;
    }

    Ok(())
}

fn show_load_report(source: &str, report: &LoadReport, render: Render) {
    if render != Render::Json {
        display_load_report(source, report);
    } else if !report.skipped.is_empty() {
        print_warning(&format!(
            "Skipped {} row(s) from {}",
            report.skipped_count(),
            source
        ));
    }
}

/// `LABEL:UNITS[:AMOUNT]`
fn parse_entry(entry: &str) -> error::Result<(String, f64, Option<f64>)> {
    let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) || parts[0].is_empty() {
        return Err(WattlyticsError::validation_error(
            "entry",
            &format!("expected LABEL:UNITS[:AMOUNT], got '{}'", entry),
        ));
    }

    let units = parts[1].parse::<f64>().map_err(|_| {
        WattlyticsError::validation_error("units", &format!("'{}' is not a number", parts[1]))
    })?;
    let amount = match parts.get(2) {
        Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
            WattlyticsError::validation_error("amount", &format!("'{}' is not a number", raw))
        })?),
        None => None,
    };

    Ok((parts[0].to_string(), units, amount))
}

/// Units are checked like a manual entry before pricing
fn handle_bill_command(session: &Session, units: f64, render: Render) -> Result<()> {
    validate_quantity("units", units)?;
    let tariff = session.tariff();
    let amount = tariff.compute_bill(units);
    let breakdown = tariff.slab_breakdown(units);

    match render {
        Render::Json => display_json(&json!({
            "units": units,
            "amount": amount,
            "fixed_charge": tariff.fixed_charge(),
            "breakdown": breakdown,
        }))?,
        _ => display_bill(units, amount, &breakdown, tariff),
    }

    Ok(())
}

/// Handle configuration commands
fn handle_config_command(path: &Path, show: bool, reset: bool, init: bool) -> Result<()> {
    if reset {
        Config::default().save_to(path)?;
        print_info(&format!("Configuration reset to defaults: {}", path.display()));
        return Ok(());
    }

    if init {
        if path.exists() {
            print_warning(&format!(
                "Configuration already exists at {}",
                path.display()
            ));
        } else {
            Config::default().save_to(path)?;
            print_info(&format!("Configuration written to {}", path.display()));
        }
        return Ok(());
    }

    let config = Config::load_from(path)?;
    if show {
        println!("Current Configuration:");
        println!("Config File: {}", path.display());
        println!(
            "High Consumption Threshold: {:.0}%",
            config.high_consumption_threshold * 100.0
        );
        println!("Prediction Window: {} month(s)", config.prediction_window);
        println!("Prediction Margin: ±{:.0}%", config.prediction_margin * 100.0);
        println!("Default Output Format: {:?}", config.default_output_format);
        println!("Export Directory: {:?}", config.export_directory);
        println!("Fixed Charge: {:.2}", config.tariff.fixed_charge());
        println!("Slabs:");
        for slab in config.tariff.slabs() {
            match slab.upper {
                Some(upper) => println!("  {:.0}-{:.0}: {:.2}/unit", slab.lower, upper, slab.rate),
                None => println!("  {:.0}+: {:.2}/unit", slab.lower, slab.rate),
            }
        }
    } else {
        print_info("Use --show, --reset or --init");
    }

    Ok(())
}

/// Handle data export commands
fn handle_export_command(
    report: &DashboardReport,
    output_path: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let base_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.get_export_directory().join("wattlytics_export"));

    let history_path = with_suffix(&base_path, ".history.csv");
    export_history_to_csv(report, &history_path)?;
    print_info(&format!("Bills exported to: {}", history_path.display()));

    let summary_path = with_suffix(&base_path, ".summary.csv");
    export_summary_to_csv(report, &summary_path)?;
    print_info(&format!("Summary exported to: {}", summary_path.display()));

    Ok(())
}

/// Append to the file name; dots already in `base` are kept
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
