use crate::error::{Result, WattlyticsError};
use crate::helpers::{calculate_average, compare_floats};
use crate::models::{BillHistory, BillRecord};
use serde::Serialize;
use std::cmp::Ordering;

/// Default fraction above the average that flags a month as high consumption
pub const DEFAULT_HIGH_CONSUMPTION_THRESHOLD: f64 = 0.20;

/// Minimum history for the early-vs-recent trend percentage
const TREND_PERCENT_MIN_RECORDS: usize = 6;
const TREND_WINDOW: usize = 3;
/// Trend percentages inside this band count as stable
const STABLE_TREND_BAND: f64 = 5.0;

/// Trend direction for usage patterns
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Aggregate statistics over a bill history, recomputed on every request
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub record_count: usize,
    pub avg_units: f64,
    pub avg_amount: f64,
    pub peak_units: f64,
    pub peak_period: String,
    pub lowest_units: f64,
    pub lowest_period: String,
    pub total_units: f64,
    pub total_amount: f64,
    /// avg_amount / avg_units, 0 when nothing was consumed
    pub cost_per_unit: f64,
    /// Period-over-period unit deltas
    pub trend: Vec<f64>,
    /// Recent-3 vs first-3 change in percent; 0 below six records
    pub trend_percent: f64,
    pub trend_direction: TrendDirection,
    pub high_consumption_threshold: f64,
}

/// Per-month blended rate
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRate {
    pub period_label: String,
    pub cost_per_unit: f64,
}

pub fn summarize(history: &BillHistory, threshold: f64) -> Result<AnalyticsSummary> {
    let records = history.records();
    if records.is_empty() {
        return Err(WattlyticsError::insufficient_data(1, 0));
    }

    let units: Vec<f64> = records.iter().map(|r| r.units).collect();
    let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();

    let avg_units = calculate_average(&units);
    let avg_amount = calculate_average(&amounts);

    // First occurrence wins ties in both directions
    let peak = first_extreme(records, Ordering::Greater);
    let lowest = first_extreme(records, Ordering::Less);

    let cost_per_unit = if avg_units > 0.0 {
        avg_amount / avg_units
    } else {
        0.0
    };

    let trend = units.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let trend_percent = calculate_trend_percent(&units);

    Ok(AnalyticsSummary {
        record_count: records.len(),
        avg_units,
        avg_amount,
        peak_units: peak.units,
        peak_period: peak.period_label.clone(),
        lowest_units: lowest.units,
        lowest_period: lowest.period_label.clone(),
        total_units: history.total_units(),
        total_amount: history.total_amount(),
        cost_per_unit,
        trend,
        trend_percent,
        trend_direction: classify_trend(trend_percent),
        high_consumption_threshold: threshold,
    })
}

fn first_extreme(records: &[BillRecord], wanted: Ordering) -> &BillRecord {
    records
        .iter()
        .skip(1)
        .fold(&records[0], |best, record| {
            if compare_floats(record.units, best.units) == wanted {
                record
            } else {
                best
            }
        })
}

fn calculate_trend_percent(units: &[f64]) -> f64 {
    if units.len() < TREND_PERCENT_MIN_RECORDS {
        return 0.0;
    }

    let early = calculate_average(&units[..TREND_WINDOW]);
    let recent = calculate_average(&units[units.len() - TREND_WINDOW..]);
    if early > 0.0 {
        (recent - early) / early * 100.0
    } else {
        0.0
    }
}

fn classify_trend(trend_percent: f64) -> TrendDirection {
    if trend_percent > STABLE_TREND_BAND {
        TrendDirection::Increasing
    } else if trend_percent < -STABLE_TREND_BAND {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Months whose units exceed the average by more than the summary's threshold
pub fn high_consumption_months(
    history: &BillHistory,
    summary: &AnalyticsSummary,
) -> Vec<BillRecord> {
    let limit = summary.avg_units * (1.0 + summary.high_consumption_threshold);
    history
        .records()
        .iter()
        .filter(|r| r.units > limit)
        .cloned()
        .collect()
}

pub fn monthly_cost_per_unit(history: &BillHistory) -> Vec<MonthlyRate> {
    history
        .records()
        .iter()
        .map(|r| MonthlyRate {
            period_label: r.period_label.clone(),
            cost_per_unit: r.cost_per_unit(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::Tariff;

    fn history_of(rows: &[(&str, f64, f64)]) -> BillHistory {
        let tariff = Tariff::default();
        let mut history = BillHistory::new();
        for (label, units, amount) in rows {
            history
                .add_record(label, *units, Some(*amount), &tariff)
                .unwrap();
        }
        history
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let err = summarize(&BillHistory::new(), DEFAULT_HIGH_CONSUMPTION_THRESHOLD).unwrap_err();
        assert!(matches!(err, WattlyticsError::InsufficientData { .. }));
    }

    #[test]
    fn test_three_month_scenario() {
        let history = history_of(&[
            ("Jan", 250.0, 1500.0),
            ("Feb", 280.0, 1700.0),
            ("Mar", 320.0, 2100.0),
        ]);
        let summary = summarize(&history, DEFAULT_HIGH_CONSUMPTION_THRESHOLD).unwrap();

        assert!((summary.avg_units - 283.33).abs() < 0.01);
        assert!((summary.avg_amount - 1766.67).abs() < 0.01);
        assert_eq!(summary.peak_period, "Mar");
        assert_eq!(summary.peak_units, 320.0);
        assert_eq!(summary.lowest_period, "Jan");
        assert_eq!(summary.trend, vec![30.0, 40.0]);
        assert_eq!(summary.trend_percent, 0.0);
        assert_eq!(summary.trend_direction, TrendDirection::Stable);
        assert_eq!(summary.total_units, 850.0);
    }

    #[test]
    fn test_single_record_summary() {
        let history = history_of(&[("Jan", 250.0, 1500.0)]);
        let summary = summarize(&history, DEFAULT_HIGH_CONSUMPTION_THRESHOLD).unwrap();
        assert!(summary.trend.is_empty());
        assert_eq!(summary.cost_per_unit, 6.0);

        let history = history_of(&[("Jan", 0.0, 50.0)]);
        let summary = summarize(&history, DEFAULT_HIGH_CONSUMPTION_THRESHOLD).unwrap();
        assert_eq!(summary.cost_per_unit, 0.0);
    }

    #[test]
    fn test_peak_tie_breaks_on_first_occurrence() {
        let history = history_of(&[
            ("Jan", 300.0, 1.0),
            ("Feb", 100.0, 1.0),
            ("Mar", 300.0, 1.0),
            ("Apr", 100.0, 1.0),
        ]);
        let summary = summarize(&history, DEFAULT_HIGH_CONSUMPTION_THRESHOLD).unwrap();
        assert_eq!(summary.peak_period, "Jan");
        assert_eq!(summary.lowest_period, "Feb");
    }

    #[test]
    fn test_trend_percent_over_six_months() {
        let history = history_of(&[
            ("m1", 100.0, 1.0),
            ("m2", 100.0, 1.0),
            ("m3", 100.0, 1.0),
            ("m4", 120.0, 1.0),
            ("m5", 120.0, 1.0),
            ("m6", 120.0, 1.0),
        ]);
        let summary = summarize(&history, DEFAULT_HIGH_CONSUMPTION_THRESHOLD).unwrap();
        assert!((summary.trend_percent - 20.0).abs() < 1e-9);
        assert_eq!(summary.trend_direction, TrendDirection::Increasing);
    }

    #[test]
    fn test_high_consumption_months_keep_order() {
        let history = history_of(&[
            ("Jan", 100.0, 1.0),
            ("Feb", 200.0, 1.0),
            ("Mar", 100.0, 1.0),
            ("Apr", 180.0, 1.0),
            ("May", 100.0, 1.0),
        ]);
        // average 136, limit 163.2
        let summary = summarize(&history, DEFAULT_HIGH_CONSUMPTION_THRESHOLD).unwrap();
        let high: Vec<String> = high_consumption_months(&history, &summary)
            .into_iter()
            .map(|r| r.period_label)
            .collect();
        assert_eq!(high, vec!["Feb", "Apr"]);

        let strict = summarize(&history, 0.4).unwrap();
        let high = high_consumption_months(&history, &strict);
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].period_label, "Feb");
    }

    #[test]
    fn test_monthly_cost_per_unit() {
        let history = history_of(&[("Jan", 0.0, 50.0), ("Feb", 100.0, 350.0)]);
        let rates = monthly_cost_per_unit(&history);
        assert_eq!(rates[0].cost_per_unit, 0.0);
        assert_eq!(rates[1].cost_per_unit, 3.5);
    }
}
