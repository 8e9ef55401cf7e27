use crate::error::{Result, WattlyticsError};
use crate::helpers::calculate_average;
use crate::models::BillHistory;
use crate::tariff::{Tariff, round_currency};
use serde::Serialize;

pub const DEFAULT_PREDICTION_WINDOW: usize = 3;
pub const DEFAULT_PREDICTION_MARGIN: f64 = 0.1;

/// Next-month estimate derived from the most recent bills
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Number of trailing records the estimate is based on
    pub records_used: usize,
    pub margin: f64,
    pub expected_units: f64,
    pub best_case_units: f64,
    pub worst_case_units: f64,
    pub expected_amount: f64,
    pub best_case_amount: f64,
    pub worst_case_amount: f64,
    /// worst minus best amount
    pub amount_range: f64,
    /// Expected units minus the all-history average
    pub delta_units_vs_average: f64,
    /// Expected amount minus the all-history average bill
    pub delta_amount_vs_average: f64,
}

/// Trailing-average predictor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predictor {
    window: usize,
    margin: f64,
}

impl Default for Predictor {
    fn default() -> Self {
        Self {
            window: DEFAULT_PREDICTION_WINDOW,
            margin: DEFAULT_PREDICTION_MARGIN,
        }
    }
}

impl Predictor {
    pub fn new(window: usize, margin: f64) -> Result<Self> {
        if window == 0 {
            return Err(WattlyticsError::config_error(
                "prediction window must cover at least one month",
            ));
        }
        if !margin.is_finite() || !(0.0..1.0).contains(&margin) {
            return Err(WattlyticsError::config_error(&format!(
                "prediction margin must be in [0, 1), got {}",
                margin
            )));
        }
        Ok(Self { window, margin })
    }

    /// Average the last `window` months (all of them when fewer exist)
    /// and price the expected, best and worst cases through `tariff`.
    pub fn predict_next(&self, history: &BillHistory, tariff: &Tariff) -> Result<Prediction> {
        if history.is_empty() {
            return Err(WattlyticsError::insufficient_data(1, 0));
        }

        let recent = history.last_n(self.window);
        let recent_units: Vec<f64> = recent.iter().map(|r| r.units).collect();
        let expected_units = calculate_average(&recent_units);

        let best_case_units = expected_units * (1.0 - self.margin);
        let worst_case_units = expected_units * (1.0 + self.margin);

        let expected_amount = tariff.compute_bill(expected_units);
        let best_case_amount = tariff.compute_bill(best_case_units);
        let worst_case_amount = tariff.compute_bill(worst_case_units);

        let count = history.len() as f64;
        let avg_units = history.total_units() / count;
        let avg_amount = history.total_amount() / count;

        tracing::debug!(
            records_used = recent.len(),
            expected_units,
            expected_amount,
            "next month predicted"
        );

        Ok(Prediction {
            records_used: recent.len(),
            margin: self.margin,
            expected_units,
            best_case_units,
            worst_case_units,
            expected_amount,
            best_case_amount,
            worst_case_amount,
            amount_range: round_currency(worst_case_amount - best_case_amount),
            delta_units_vs_average: expected_units - avg_units,
            delta_amount_vs_average: round_currency(expected_amount - avg_amount),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(units: &[f64]) -> BillHistory {
        let tariff = Tariff::default();
        let mut history = BillHistory::new();
        for (i, u) in units.iter().enumerate() {
            history
                .add_record(&format!("m{}", i + 1), *u, None, &tariff)
                .unwrap();
        }
        history
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let err = Predictor::default()
            .predict_next(&BillHistory::new(), &Tariff::default())
            .unwrap_err();
        assert!(matches!(err, WattlyticsError::InsufficientData { .. }));
    }

    #[test]
    fn test_single_record_prediction() {
        let tariff = Tariff::default();
        let prediction = Predictor::default()
            .predict_next(&history(&[250.0]), &tariff)
            .unwrap();

        assert_eq!(prediction.records_used, 1);
        assert_eq!(prediction.expected_units, 250.0);
        assert!(prediction.best_case_units <= prediction.expected_units);
        assert!(prediction.expected_units <= prediction.worst_case_units);
        assert!(prediction.best_case_amount <= prediction.expected_amount);
        assert!(prediction.expected_amount <= prediction.worst_case_amount);
        assert_eq!(prediction.expected_amount, tariff.compute_bill(250.0));
        assert_eq!(prediction.delta_units_vs_average, 0.0);
    }

    #[test]
    fn test_uses_last_three_records() {
        let tariff = Tariff::default();
        let prediction = Predictor::default()
            .predict_next(&history(&[100.0, 100.0, 250.0, 280.0, 320.0]), &tariff)
            .unwrap();

        assert_eq!(prediction.records_used, 3);
        assert!((prediction.expected_units - 283.333).abs() < 0.001);
        assert!((prediction.best_case_units - 255.0).abs() < 1e-9);
        assert!((prediction.worst_case_units - 311.666).abs() < 0.001);
        assert_eq!(
            prediction.worst_case_amount,
            tariff.compute_bill(prediction.worst_case_units)
        );
        assert!(prediction.delta_units_vs_average > 0.0);
    }

    #[test]
    fn test_short_history_uses_everything() {
        let prediction = Predictor::default()
            .predict_next(&history(&[100.0, 200.0]), &Tariff::default())
            .unwrap();
        assert_eq!(prediction.records_used, 2);
        assert_eq!(prediction.expected_units, 150.0);
    }

    #[test]
    fn test_zero_margin_collapses_range() {
        let predictor = Predictor::new(3, 0.0).unwrap();
        let prediction = predictor
            .predict_next(&history(&[200.0, 210.0]), &Tariff::default())
            .unwrap();
        assert_eq!(prediction.best_case_amount, prediction.worst_case_amount);
        assert_eq!(prediction.amount_range, 0.0);
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(Predictor::new(0, 0.1).is_err());
        assert!(Predictor::new(3, -0.1).is_err());
        assert!(Predictor::new(3, 1.0).is_err());
        assert!(Predictor::new(3, f64::NAN).is_err());
    }
}
