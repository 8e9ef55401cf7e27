use crate::error::{Result, WattlyticsError};
use crate::tariff::{Tariff, round_currency};
use serde::{Deserialize, Serialize};

/// One month's bill. Replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    #[serde(rename = "month")]
    pub period_label: String,
    pub units: f64,
    pub amount: f64,
}

impl BillRecord {
    /// Validated constructor; a missing amount is billed through `tariff`
    pub fn new(
        period_label: &str,
        units: f64,
        amount: Option<f64>,
        tariff: &Tariff,
    ) -> Result<Self> {
        let period_label = period_label.trim();
        if period_label.is_empty() {
            return Err(WattlyticsError::validation_error(
                "month",
                "period label must not be empty",
            ));
        }
        validate_quantity("units", units)?;

        let amount = match amount {
            Some(amount) => {
                validate_quantity("amount", amount)?;
                amount
            }
            None => tariff.compute_bill(units),
        };

        Ok(Self {
            period_label: period_label.to_string(),
            units,
            amount,
        })
    }

    /// Blended rate for this bill, 0 when no units were consumed
    pub fn cost_per_unit(&self) -> f64 {
        if self.units > 0.0 {
            self.amount / self.units
        } else {
            0.0
        }
    }
}

/// Units and amounts must be finite and non-negative
pub fn validate_quantity(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(WattlyticsError::validation_error(
            field,
            &format!("{} is not a finite number", value),
        ));
    }
    if value < 0.0 {
        return Err(WattlyticsError::validation_error(
            field,
            &format!("must not be negative, got {}", value),
        ));
    }
    Ok(())
}

/// A row dropped while loading tabular input
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the source, header included
    pub line: usize,
    pub reason: String,
}

/// Outcome of a tabular load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Chronological bill list; insertion order is the timeline
#[derive(Debug, Clone, Default, Serialize)]
pub struct BillHistory {
    records: Vec<BillRecord>,
}

impl BillHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[BillRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, period_label: &str) -> Option<usize> {
        let label = period_label.trim();
        self.records.iter().position(|r| r.period_label == label)
    }

    /// Append a new month. Duplicated labels are rejected; use `update_record`.
    pub fn add_record(
        &mut self,
        period_label: &str,
        units: f64,
        amount: Option<f64>,
        tariff: &Tariff,
    ) -> Result<&BillRecord> {
        let record = BillRecord::new(period_label, units, amount, tariff)?;
        self.push(record)
    }

    /// Append an already validated record
    pub fn push(&mut self, record: BillRecord) -> Result<&BillRecord> {
        if self.position(&record.period_label).is_some() {
            return Err(WattlyticsError::validation_error(
                "month",
                &format!(
                    "a bill for '{}' already exists; update it instead",
                    record.period_label
                ),
            ));
        }

        tracing::debug!(
            month = %record.period_label,
            units = record.units,
            amount = record.amount,
            "bill record added"
        );
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Replace an existing month in place, keeping its position in the timeline
    pub fn update_record(
        &mut self,
        period_label: &str,
        units: f64,
        amount: Option<f64>,
        tariff: &Tariff,
    ) -> Result<&BillRecord> {
        let index = self.position(period_label).ok_or_else(|| {
            WattlyticsError::validation_error(
                "month",
                &format!("no bill for '{}' to update", period_label.trim()),
            )
        })?;
        let record = BillRecord::new(period_label, units, amount, tariff)?;

        tracing::debug!(month = %record.period_label, "bill record replaced");
        self.records[index] = record;
        Ok(&self.records[index])
    }

    pub fn remove_record(&mut self, period_label: &str) -> Option<BillRecord> {
        self.position(period_label).map(|i| self.records.remove(i))
    }

    /// The most recent `n` records, oldest first
    pub fn last_n(&self, n: usize) -> &[BillRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn total_units(&self) -> f64 {
        self.records.iter().map(|r| r.units).sum()
    }

    pub fn total_amount(&self) -> f64 {
        round_currency(self.records.iter().map(|r| r.amount).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_record_derives_amount() {
        let tariff = Tariff::default();
        let mut history = BillHistory::new();
        let record = history.add_record("Jan-24", 150.0, None, &tariff).unwrap();
        assert_eq!(record.amount, 575.0);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_add_record_keeps_supplied_amount() {
        let tariff = Tariff::default();
        let mut history = BillHistory::new();
        history
            .add_record("Jan-24", 250.0, Some(1500.0), &tariff)
            .unwrap();
        assert_eq!(history.records()[0].amount, 1500.0);
    }

    #[test]
    fn test_invalid_entries_leave_history_untouched() {
        let tariff = Tariff::default();
        let mut history = BillHistory::new();
        history.add_record("Jan-24", 100.0, None, &tariff).unwrap();

        assert!(matches!(
            history.add_record("Feb-24", -1.0, None, &tariff),
            Err(WattlyticsError::Validation { .. })
        ));
        assert!(history.add_record("Feb-24", 10.0, Some(-5.0), &tariff).is_err());
        assert!(history.add_record("  ", 10.0, None, &tariff).is_err());
        assert!(history.add_record("Feb-24", f64::NAN, None, &tariff).is_err());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_duplicate_label_rejected_then_updated() {
        let tariff = Tariff::default();
        let mut history = BillHistory::new();
        history.add_record("Jan-24", 100.0, None, &tariff).unwrap();
        history.add_record("Feb-24", 120.0, None, &tariff).unwrap();

        let err = history.add_record("Jan-24", 200.0, None, &tariff).unwrap_err();
        assert!(err.to_string().contains("update it instead"));

        history
            .update_record("Jan-24", 200.0, Some(900.0), &tariff)
            .unwrap();
        assert_eq!(history.records()[0].units, 200.0);
        assert_eq!(history.records()[0].amount, 900.0);
        assert_eq!(history.records()[1].period_label, "Feb-24");

        assert!(history.update_record("Mar-24", 1.0, None, &tariff).is_err());
    }

    #[test]
    fn test_last_n_and_totals() {
        let tariff = Tariff::default();
        let mut history = BillHistory::new();
        for (label, units) in [("a", 10.0), ("b", 20.0), ("c", 30.0), ("d", 40.0)] {
            history.add_record(label, units, Some(units), &tariff).unwrap();
        }
        let last: Vec<&str> = history
            .last_n(3)
            .iter()
            .map(|r| r.period_label.as_str())
            .collect();
        assert_eq!(last, vec!["b", "c", "d"]);
        assert_eq!(history.last_n(10).len(), 4);
        assert_eq!(history.total_units(), 100.0);

        assert_eq!(history.remove_record(" b ").map(|r| r.units), Some(20.0));
        assert!(history.remove_record("b").is_none());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_cost_per_unit() {
        let tariff = Tariff::default();
        let record = BillRecord::new("Jan-24", 0.0, Some(50.0), &tariff).unwrap();
        assert_eq!(record.cost_per_unit(), 0.0);
        let record = BillRecord::new("Jan-24", 250.0, Some(1500.0), &tariff).unwrap();
        assert_eq!(record.cost_per_unit(), 6.0);
    }
}
