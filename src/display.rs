use crate::analytics::{AnalyticsSummary, TrendDirection};
use crate::comparison::{ComparisonResult, HouseholdProfile, ProfileVerdict, RangePosition};
use crate::error::Result;
use crate::models::{BillRecord, LoadReport};
use crate::projections::Prediction;
use crate::recommendations::{Priority, SavingsTotals, Tip};
use crate::session::DashboardReport;
use crate::tariff::{SlabCharge, Tariff};
use chrono::Local;
use colored::*;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use serde::Serialize;

pub fn display_report_enhanced(report: &DashboardReport) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    println!("{}", "═".repeat(80).bright_black());
    println!(
        "{}  {}",
        "⚡ Electricity Bill Analytics".bright_blue().bold(),
        format!("Generated {}", timestamp).dimmed()
    );
    println!("{}", "═".repeat(80).bright_black());
    println!();

    display_summary_card(&report.summary);
    println!();

    section("📋 Your Electricity Bills");
    display_history_table(&report.history, &report.high_consumption);
    println!();

    section("💡 Money-Saving Tips");
    display_tips(&report.tips, &report.savings);
    println!();

    section("🏘️ How You Compare");
    display_comparison(&report.comparisons, report.profile.as_ref());
    println!();

    section("🔮 Next Month Prediction");
    display_prediction(&report.prediction);

    println!();
    println!("{}", "═".repeat(80).bright_black());
}

/// Plain tables only, no cards
pub fn display_report_table(report: &DashboardReport) {
    println!("{}", "Electricity Bill Report".bold());
    display_history_table(&report.history, &report.high_consumption);
    display_summary_table(&report.summary);
    display_tips_table(&report.tips);
    display_comparison_table(&report.comparisons);
    display_prediction_table(&report.prediction);
}

pub fn display_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

fn section(title: &str) {
    println!("{}", "─".repeat(80).bright_black());
    println!("{}", title.bright_green().bold());
    println!("{}", "─".repeat(80).bright_black());
}

fn display_summary_card(summary: &AnalyticsSummary) {
    let trend_icon = match summary.trend_direction {
        TrendDirection::Increasing => "📈",
        TrendDirection::Decreasing => "📉",
        TrendDirection::Stable => "➡️",
    };

    println!("{}", "📊 SUMMARY STATISTICS".bright_yellow().bold());
    println!("┌─────────────────────────────────────────────────────────────────────────────┐");
    println!(
        "│ ⚡ Avg Units: {}  │  💰 Avg Bill: {}  │  📅 Months: {} │",
        format_units(summary.avg_units).bright_magenta().bold(),
        format_currency(summary.avg_amount).bright_green().bold(),
        summary.record_count.to_string().bright_blue().bold()
    );
    println!("├─────────────────────────────────────────────────────────────────────────────┤");
    println!(
        "│ 🔺 Peak: {} ({})  │  🔻 Lowest: {} ({}) │",
        summary.peak_period.bright_red(),
        format_units(summary.peak_units),
        summary.lowest_period.green(),
        format_units(summary.lowest_units)
    );
    println!("├─────────────────────────────────────────────────────────────────────────────┤");
    println!(
        "│ 📉 Rate: {}/unit  │  {} Trend: {:.1}%  │  🧾 Total: {} │",
        format_currency(summary.cost_per_unit).bright_cyan(),
        trend_icon,
        summary.trend_percent.abs(),
        format_currency(summary.total_amount).bright_yellow()
    );
    println!("└─────────────────────────────────────────────────────────────────────────────┘");
}

fn display_summary_table(summary: &AnalyticsSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Metric").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    let trend: Vec<String> = summary.trend.iter().map(|d| format!("{:+.0}", d)).collect();
    let rows = [
        ("Average Units", format_units(summary.avg_units)),
        ("Average Bill", format_currency(summary.avg_amount)),
        (
            "Peak Month",
            format!("{} ({})", summary.peak_period, format_units(summary.peak_units)),
        ),
        (
            "Lowest Month",
            format!(
                "{} ({})",
                summary.lowest_period,
                format_units(summary.lowest_units)
            ),
        ),
        ("Cost Per Unit", format_currency(summary.cost_per_unit)),
        ("Month-over-Month", trend.join(", ")),
        ("Trend", format!("{:+.1}%", summary.trend_percent)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value)]);
    }

    println!("{table}");
}

pub fn display_history_table(records: &[BillRecord], high_consumption: &[BillRecord]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Month").fg(Color::Cyan),
            Cell::new("Units (kWh)").fg(Color::Cyan),
            Cell::new("Amount").fg(Color::Cyan),
            Cell::new("Rate / Unit").fg(Color::Cyan),
        ]);

    for record in records {
        let high = high_consumption
            .iter()
            .any(|h| h.period_label == record.period_label);
        let units_cell = Cell::new(format_units(record.units));
        table.add_row(vec![
            Cell::new(&record.period_label),
            if high {
                units_cell.fg(Color::Red)
            } else {
                units_cell
            },
            Cell::new(format_currency(record.amount)),
            Cell::new(format_currency(record.cost_per_unit())),
        ]);
    }

    if !records.is_empty() {
        let total_units: f64 = records.iter().map(|r| r.units).sum();
        let total_amount: f64 = records.iter().map(|r| r.amount).sum();
        table.add_row(vec![
            Cell::new("Total").fg(Color::Yellow),
            Cell::new(format_units(total_units)).fg(Color::Yellow),
            Cell::new(format_currency(total_amount)).fg(Color::Yellow),
            Cell::new("").fg(Color::Yellow),
        ]);
    }

    println!("{table}");
}

pub fn display_tips(tips: &[Tip], savings: &SavingsTotals) {
    println!(
        "💵 Potential Monthly Savings: {}   💰 Yearly: {}",
        format_currency(savings.monthly).bright_green().bold(),
        format_currency(savings.yearly).bright_green().bold()
    );
    println!();

    for (i, tip) in tips.iter().enumerate() {
        let badge = match tip.priority {
            Priority::High => "HIGH".red().bold(),
            Priority::Medium => "MEDIUM".yellow().bold(),
            Priority::Low => "LOW".green().bold(),
        };
        println!("{}. {} [{}]", i + 1, tip.name.bold(), badge);
        println!("   {}", tip.description.dimmed());
        println!("   ✅ {}", tip.action);
        println!(
            "   💰 ~{}/month ({}/year)",
            format_currency(tip.monthly_savings).bright_green(),
            format_currency(tip.yearly_savings)
        );
    }
}

fn display_tips_table(tips: &[Tip]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Tip").fg(Color::Cyan),
            Cell::new("Priority").fg(Color::Cyan),
            Cell::new("Monthly Savings").fg(Color::Cyan),
            Cell::new("Yearly Savings").fg(Color::Cyan),
        ]);

    for tip in tips {
        table.add_row(vec![
            Cell::new(&tip.name),
            Cell::new(format!("{:?}", tip.priority)),
            Cell::new(format_currency(tip.monthly_savings)),
            Cell::new(format_currency(tip.yearly_savings)),
        ]);
    }

    println!("{table}");
}

pub fn display_comparison(comparisons: &[ComparisonResult], profile: Option<&HouseholdProfile>) {
    display_comparison_table(comparisons);

    let Some(profile) = profile else {
        return;
    };
    println!(
        "📍 Your consumption profile matches: {}",
        profile.category.bright_blue().bold()
    );
    match profile.verdict {
        ProfileVerdict::MoreThanTypical => {
            println!(
                "{} You're using {:.0}% MORE than a typical {}",
                "⚠️".yellow(),
                profile.difference_percent,
                profile.category
            );
            println!(
                "💰 Potential monthly savings: {} by optimizing to typical levels",
                format_currency(profile.potential_monthly_savings)
                    .bright_red()
                    .bold()
            );
        }
        ProfileVerdict::LessThanTypical => println!(
            "{} Great job! You're using {:.0}% LESS than a typical {}",
            "✅".green(),
            profile.difference_percent.abs(),
            profile.category
        ),
        ProfileVerdict::Typical => println!(
            "{} Your consumption is within the normal range for this house type",
            "✅".green()
        ),
    }
}

fn display_comparison_table(comparisons: &[ComparisonResult]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("House Type").fg(Color::Cyan),
            Cell::new("Typical Range").fg(Color::Cyan),
            Cell::new("Difference").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);

    for result in comparisons {
        let status = match result.position {
            RangePosition::Below => Cell::new("Below range").fg(Color::Green),
            RangePosition::Within => Cell::new("Within range").fg(Color::Yellow),
            RangePosition::Above => Cell::new("Above range").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&result.category),
            Cell::new(format!(
                "{:.0}-{:.0} units",
                result.min_units, result.max_units
            )),
            Cell::new(format!("{:+.0} units", result.delta_units)),
            status,
        ]);
    }

    println!("{table}");
}

pub fn display_prediction(prediction: &Prediction) {
    println!(
        "🔮 Expected Consumption: {} ({:+.0} vs avg)",
        format_units(prediction.expected_units).bright_magenta().bold(),
        prediction.delta_units_vs_average
    );
    println!(
        "💰 Expected Bill: {} ({} vs avg)",
        format_currency(prediction.expected_amount)
            .bright_green()
            .bold(),
        format_signed_currency(prediction.delta_amount_vs_average)
    );
    println!(
        "   Best Case: {}   Worst Case: {}   Range: {}",
        format_currency(prediction.best_case_amount).green(),
        format_currency(prediction.worst_case_amount).red(),
        format_currency(prediction.amount_range)
    );
    println!(
        "{}",
        format!(
            "💡 Based on the last {} month(s) ±{:.0}%",
            prediction.records_used,
            prediction.margin * 100.0
        )
        .dimmed()
    );
}

fn display_prediction_table(prediction: &Prediction) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Case").fg(Color::Cyan),
            Cell::new("Units").fg(Color::Cyan),
            Cell::new("Bill").fg(Color::Cyan),
        ]);

    let rows = [
        ("Best", prediction.best_case_units, prediction.best_case_amount),
        (
            "Expected",
            prediction.expected_units,
            prediction.expected_amount,
        ),
        (
            "Worst",
            prediction.worst_case_units,
            prediction.worst_case_amount,
        ),
    ];
    for (case, units, amount) in rows {
        table.add_row(vec![
            Cell::new(case),
            Cell::new(format_units(units)),
            Cell::new(format_currency(amount)),
        ]);
    }

    println!("{table}");
}

pub fn display_bill(units: f64, amount: f64, breakdown: &[SlabCharge], tariff: &Tariff) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Slab").fg(Color::Cyan),
            Cell::new("Rate").fg(Color::Cyan),
            Cell::new("Units Billed").fg(Color::Cyan),
            Cell::new("Charge").fg(Color::Cyan),
        ]);

    for charge in breakdown {
        let slab = match charge.upper {
            Some(upper) => format!("{:.0}-{:.0}", charge.lower, upper),
            None => format!("{:.0}+", charge.lower),
        };
        table.add_row(vec![
            Cell::new(slab),
            Cell::new(format_currency(charge.rate)),
            Cell::new(format_units(charge.units)),
            Cell::new(format_currency(charge.amount)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Fixed charge"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format_currency(tariff.fixed_charge())),
    ]);
    table.add_row(vec![
        Cell::new("Total").fg(Color::Yellow),
        Cell::new("").fg(Color::Yellow),
        Cell::new(format_units(units)).fg(Color::Yellow),
        Cell::new(format_currency(amount)).fg(Color::Yellow),
    ]);

    println!("{table}");
}

pub fn display_load_report(source: &str, report: &LoadReport) {
    print_info(&format!("Loaded {} month(s) from {}", report.loaded, source));
    if !report.skipped.is_empty() {
        print_warning(&format!("Skipped {} row(s):", report.skipped_count()));
        for row in &report.skipped {
            eprintln!("  line {}: {}", row.line, row.reason);
        }
    }
}

fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{}₹{}.{}", sign, group_thousands(whole), cents)
}

fn format_signed_currency(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+{}", format_currency(amount))
    } else {
        format_currency(amount)
    }
}

fn format_units(units: f64) -> String {
    format!("{} kWh", group_thousands(&format!("{:.0}", units)))
}

fn group_thousands(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut result = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue(), message);
}
