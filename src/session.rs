use crate::analytics::{
    AnalyticsSummary, MonthlyRate, high_consumption_months, monthly_cost_per_unit, summarize,
};
use crate::comparison::{ComparisonResult, HouseholdProfile, closest_profile, compare};
use crate::config::Config;
use crate::error::{Result, WattlyticsError};
use crate::models::{BillHistory, BillRecord, LoadReport};
use crate::parser;
use crate::projections::{Prediction, Predictor};
use crate::recommendations::{SavingsTotals, Tip, recommend, total_savings};
use crate::tariff::Tariff;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Everything the presentation layer needs for one analysis request
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    /// Slab table that priced derived amounts and predictions
    pub tariff: Tariff,
    pub history: Vec<BillRecord>,
    pub summary: AnalyticsSummary,
    pub high_consumption: Vec<BillRecord>,
    pub monthly_rates: Vec<MonthlyRate>,
    pub tips: Vec<Tip>,
    pub savings: SavingsTotals,
    pub comparisons: Vec<ComparisonResult>,
    pub profile: Option<HouseholdProfile>,
    pub prediction: Prediction,
}

/// One user's working state: validated settings plus their bills.
/// Passed explicitly through the pipeline; nothing is global.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    predictor: Predictor,
    history: BillHistory,
}

impl Session {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let predictor = config.predictor()?;
        Ok(Self {
            config,
            predictor,
            history: BillHistory::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tariff(&self) -> &Tariff {
        &self.config.tariff
    }

    pub fn history(&self) -> &BillHistory {
        &self.history
    }

    pub fn add_record(&mut self, period_label: &str, units: f64, amount: Option<f64>) -> Result<&BillRecord> {
        self.history
            .add_record(period_label, units, amount, &self.config.tariff)
    }

    pub fn update_record(
        &mut self,
        period_label: &str,
        units: f64,
        amount: Option<f64>,
    ) -> Result<&BillRecord> {
        self.history
            .update_record(period_label, units, amount, &self.config.tariff)
    }

    pub fn load_tabular<R: Read>(&mut self, reader: R) -> Result<LoadReport> {
        parser::load_from_tabular(&mut self.history, reader, &self.config.tariff)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<LoadReport> {
        parser::load_from_path(&mut self.history, path, &self.config.tariff)
    }

    pub fn load_sample(&mut self, n: usize) -> Result<LoadReport> {
        parser::load_sample(&mut self.history, n, &self.config.tariff)
    }

    pub fn remove_record(&mut self, period_label: &str) -> Result<BillRecord> {
        self.history.remove_record(period_label).ok_or_else(|| {
            WattlyticsError::validation_error(
                "month",
                &format!("no bill for '{}' to remove", period_label.trim()),
            )
        })
    }

    pub fn summarize(&self) -> Result<AnalyticsSummary> {
        summarize(&self.history, self.config.high_consumption_threshold)
    }

    pub fn predict_next(&self) -> Result<Prediction> {
        self.predictor
            .predict_next(&self.history, &self.config.tariff)
    }

    /// Run the whole pipeline. Fails before producing anything when the
    /// history is empty.
    pub fn analyze(&self) -> Result<DashboardReport> {
        let summary = self.summarize()?;
        let prediction = self.predict_next()?;

        let tips = recommend(&summary);
        let savings = total_savings(&tips);

        Ok(DashboardReport {
            tariff: self.config.tariff.clone(),
            history: self.history.records().to_vec(),
            high_consumption: high_consumption_months(&self.history, &summary),
            monthly_rates: monthly_cost_per_unit(&self.history),
            comparisons: compare(summary.avg_units),
            profile: closest_profile(summary.avg_units, &self.config.tariff),
            tips,
            savings,
            summary,
            prediction,
        })
    }
}
