use crate::session::DashboardReport;
use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

/// Bills in the same `month,units,amount` layout the loader reads, plus the blended rate
pub fn export_history_to_csv(report: &DashboardReport, path: &Path) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(path)?);

    wtr.write_record(["month", "units", "amount", "cost_per_unit"])?;

    for (record, rate) in report.history.iter().zip(&report.monthly_rates) {
        wtr.write_record(&[
            record.period_label.clone(),
            record.units.to_string(),
            format!("{:.2}", record.amount),
            format!("{:.4}", rate.cost_per_unit),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_summary_to_csv(report: &DashboardReport, path: &Path) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(path)?);
    let summary = &report.summary;
    let prediction = &report.prediction;

    wtr.write_record(["Metric", "Value"])?;

    wtr.write_record(["Months", &summary.record_count.to_string()])?;
    wtr.write_record(["Total Units", &format!("{:.2}", summary.total_units)])?;
    wtr.write_record(["Total Amount", &format!("{:.2}", summary.total_amount)])?;
    wtr.write_record(["Average Units", &format!("{:.2}", summary.avg_units)])?;
    wtr.write_record(["Average Amount", &format!("{:.2}", summary.avg_amount)])?;
    wtr.write_record(["Cost Per Unit", &format!("{:.4}", summary.cost_per_unit)])?;
    wtr.write_record(["Peak Month", &summary.peak_period])?;
    wtr.write_record(["Peak Units", &format!("{:.2}", summary.peak_units)])?;
    wtr.write_record(["Lowest Month", &summary.lowest_period])?;
    wtr.write_record(["Trend Percent", &format!("{:.1}", summary.trend_percent)])?;
    wtr.write_record([
        "High Consumption Months",
        &report.high_consumption.len().to_string(),
    ])?;

    wtr.write_record([
        "Predicted Units",
        &format!("{:.2}", prediction.expected_units),
    ])?;
    wtr.write_record([
        "Predicted Amount",
        &format!("{:.2}", prediction.expected_amount),
    ])?;
    wtr.write_record([
        "Best Case Amount",
        &format!("{:.2}", prediction.best_case_amount),
    ])?;
    wtr.write_record([
        "Worst Case Amount",
        &format!("{:.2}", prediction.worst_case_amount),
    ])?;

    wtr.write_record([
        "Potential Monthly Savings",
        &format!("{:.2}", report.savings.monthly),
    ])?;
    wtr.write_record([
        "Potential Yearly Savings",
        &format!("{:.2}", report.savings.yearly),
    ])?;

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::BillHistory;
    use crate::parser::load_from_path;
    use crate::session::Session;
    use tempfile::TempDir;

    fn sample_report() -> DashboardReport {
        let mut session = Session::new(Config::default()).unwrap();
        session.load_sample(6).unwrap();
        session.analyze().unwrap()
    }

    #[test]
    fn test_history_export_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bills.history.csv");
        let report = sample_report();
        export_history_to_csv(&report, &path).unwrap();

        let config = Config::default();
        let mut reloaded = BillHistory::new();
        let load = load_from_path(&mut reloaded, &path, &config.tariff).unwrap();
        assert_eq!(load.skipped_count(), 0);
        assert_eq!(reloaded.records(), report.history.as_slice());
    }

    #[test]
    fn test_summary_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bills.summary.csv");
        export_summary_to_csv(&sample_report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Metric,Value"));
        assert!(content.contains("Months,6"));
        assert!(content.contains("Peak Month,May-24"));
    }
}
