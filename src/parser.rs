use crate::error::{Result, WattlyticsError};
use crate::models::{BillHistory, BillRecord, LoadReport, SkippedRow};
use crate::tariff::Tariff;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 3] = ["month", "units", "amount"];

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Monthly units for the demo household: mild winter, summer AC peak
const SAMPLE_UNITS: [f64; 12] = [
    220.0, 200.0, 240.0, 320.0, 380.0, 350.0, 340.0, 310.0, 270.0, 250.0, 230.0, 240.0,
];

const SAMPLE_START_YEAR: u32 = 24;

struct ColumnIndex {
    month: usize,
    units: usize,
    amount: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| find(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(WattlyticsError::parse_error(
                Some(1),
                &format!("header is missing column(s): {}", missing.join(", ")),
            ));
        }

        Ok(Self {
            month: find("month").unwrap_or_default(),
            units: find("units").unwrap_or_default(),
            amount: find("amount").unwrap_or_default(),
        })
    }
}

/// Load `month,units,amount` rows into `history`.
///
/// Bad rows are skipped and listed in the returned report; good rows still
/// load. A header without the required columns fails the whole load and
/// leaves `history` untouched.
pub fn load_from_tabular<R: Read>(
    history: &mut BillHistory,
    reader: R,
    tariff: &Tariff,
) -> Result<LoadReport> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut report = LoadReport::default();
    for (index, result) in csv_reader.records().enumerate() {
        let fallback_line = index + 2;
        let outcome = result
            .map_err(WattlyticsError::from)
            .and_then(|row| {
                let line = row
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                parse_row(&row, &columns, line, tariff).map(|record| (line, record))
            })
            .and_then(|(line, record)| {
                history
                    .push(record)
                    .map(|_| ())
                    .map_err(|e| WattlyticsError::parse_error(Some(line), &e.to_string()))
            });

        match outcome {
            Ok(()) => report.loaded += 1,
            Err(err) => {
                let line = match &err {
                    WattlyticsError::Parse {
                        line: Some(line), ..
                    } => *line,
                    _ => fallback_line,
                };
                tracing::warn!(line, error = %err, "skipping bill row");
                report.skipped.push(SkippedRow {
                    line,
                    reason: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        loaded = report.loaded,
        skipped = report.skipped_count(),
        "tabular bill load finished"
    );
    Ok(report)
}

/// Open `path` and load it with [`load_from_tabular`]
pub fn load_from_path(history: &mut BillHistory, path: &Path, tariff: &Tariff) -> Result<LoadReport> {
    let file = File::open(path)?;
    load_from_tabular(history, file, tariff)
}

fn parse_row(
    row: &StringRecord,
    columns: &ColumnIndex,
    line: usize,
    tariff: &Tariff,
) -> Result<BillRecord> {
    let month = required_field(row, columns.month, "month", line)?;
    let units = numeric_field(row, columns.units, "units", line)?;
    let amount = numeric_field(row, columns.amount, "amount", line)?;

    BillRecord::new(month, units, Some(amount), tariff)
        .map_err(|e| WattlyticsError::parse_error(Some(line), &e.to_string()))
}

fn required_field<'a>(
    row: &'a StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'a str> {
    match row.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(WattlyticsError::parse_error(
            Some(line),
            &format!("missing required field '{}'", name),
        )),
    }
}

fn numeric_field(row: &StringRecord, index: usize, name: &str, line: usize) -> Result<f64> {
    let raw = required_field(row, index, name, line)?;
    raw.parse::<f64>().map_err(|_| {
        WattlyticsError::parse_error(
            Some(line),
            &format!("'{}' is not a number in field '{}'", raw, name),
        )
    })
}

/// Fill `history` with `n` demo months priced through `tariff`.
/// Deterministic: the same `n` always yields the same bills.
///
/// All or nothing: if any generated label is already in `history`, or `n`
/// runs past the last two-digit year, nothing is added.
pub fn load_sample(history: &mut BillHistory, n: usize, tariff: &Tariff) -> Result<LoadReport> {
    let max_months = (100 - SAMPLE_START_YEAR as usize) * 12;
    if n > max_months {
        return Err(WattlyticsError::validation_error(
            "months",
            &format!("at most {} sample months are available, asked for {}", max_months, n),
        ));
    }

    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let label = format!(
            "{}-{:02}",
            MONTH_NAMES[i % 12],
            SAMPLE_START_YEAR + (i / 12) as u32
        );
        records.push(BillRecord::new(&label, SAMPLE_UNITS[i % 12], None, tariff)?);
    }

    let clashes: Vec<&str> = history
        .records()
        .iter()
        .map(|r| r.period_label.as_str())
        .filter(|label| records.iter().any(|r| r.period_label == *label))
        .collect();
    if !clashes.is_empty() {
        return Err(WattlyticsError::validation_error(
            "month",
            &format!(
                "sample months already loaded: {}; nothing was added",
                clashes.join(", ")
            ),
        ));
    }

    let mut report = LoadReport::default();
    for record in records {
        history.push(record)?;
        report.loaded += 1;
    }
    Ok(report)
}
