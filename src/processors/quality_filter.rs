use crate::config::PipelineConfig;
use crate::models::{CanonicalRow, CleanedDataset, Element};
use crate::utils::constants::{MAX_VALID_PRECIP, MAX_VALID_TEMP, MIN_VALID_TEMP};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Why a row was removed from the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingValue,
    NonFiniteValue,
    TemperatureOutOfRange,
    NegativePrecipitation,
    PrecipitationAboveMax,
    OutsideDateWindow,
    QualityFlagged,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingValue => "missing_value",
            DropReason::NonFiniteValue => "non_finite_value",
            DropReason::TemperatureOutOfRange => "temperature_out_of_range",
            DropReason::NegativePrecipitation => "negative_precipitation",
            DropReason::PrecipitationAboveMax => "precipitation_above_max",
            DropReason::OutsideDateWindow => "outside_date_window",
            DropReason::QualityFlagged => "quality_flagged",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drop tallies for one filter pass. A row failing several rules is counted
/// once in `dropped_rows` and once per failing rule in `by_reason`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
    pub by_reason: BTreeMap<DropReason, usize>,
}

impl FilterReport {
    pub fn count(&self, reason: DropReason) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }
}

pub struct QualityFilter {
    min_temperature_c: f64,
    max_temperature_c: f64,
    max_precipitation_mm: f64,
    valid_from: NaiveDate,
    valid_to: NaiveDate,
    reject_quality_flagged: bool,
}

impl QualityFilter {
    /// Default plausibility bounds over the given historical window.
    pub fn new(valid_from: NaiveDate, valid_to: NaiveDate) -> Self {
        Self {
            min_temperature_c: MIN_VALID_TEMP,
            max_temperature_c: MAX_VALID_TEMP,
            max_precipitation_mm: MAX_VALID_PRECIP,
            valid_from,
            valid_to,
            reject_quality_flagged: false,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_temperature_c: config.min_temperature_c,
            max_temperature_c: config.max_temperature_c,
            max_precipitation_mm: config.max_precipitation_mm,
            valid_from: config.valid_from,
            valid_to: config.effective_valid_to(),
            reject_quality_flagged: config.reject_quality_flagged,
        }
    }

    pub fn with_reject_quality_flagged(mut self, reject: bool) -> Self {
        self.reject_quality_flagged = reject;
        self
    }

    /// Every rule the row fails. Empty means the row is kept.
    pub fn check_row(&self, row: &CanonicalRow) -> Vec<DropReason> {
        let mut reasons = Vec::new();

        match row.value {
            None => reasons.push(DropReason::MissingValue),
            // NaN compares false against every bound
            Some(value) if !value.is_finite() => reasons.push(DropReason::NonFiniteValue),
            Some(value) => match row.element {
                Element::MaxTemperature | Element::MinTemperature => {
                    if value < self.min_temperature_c || value > self.max_temperature_c {
                        reasons.push(DropReason::TemperatureOutOfRange);
                    }
                }
                Element::Precipitation => {
                    if value < 0.0 {
                        reasons.push(DropReason::NegativePrecipitation);
                    }
                    if value > self.max_precipitation_mm {
                        reasons.push(DropReason::PrecipitationAboveMax);
                    }
                }
            },
        }

        if row.date < self.valid_from || row.date > self.valid_to {
            reasons.push(DropReason::OutsideDateWindow);
        }

        if self.reject_quality_flagged && row.is_flagged() {
            reasons.push(DropReason::QualityFlagged);
        }

        reasons
    }

    /// Filter unified rows. Row order is preserved, so sorted unique input
    /// yields a sorted unique dataset. Filtering a cleaned dataset's rows
    /// again keeps every row.
    pub fn filter(&self, rows: Vec<CanonicalRow>) -> (CleanedDataset, FilterReport) {
        let mut report = FilterReport {
            total_rows: rows.len(),
            ..Default::default()
        };

        let mut kept = Vec::with_capacity(rows.len());

        for row in rows {
            let reasons = self.check_row(&row);

            if reasons.is_empty() {
                kept.push(row);
                continue;
            }

            report.dropped_rows += 1;
            for reason in reasons {
                *report.by_reason.entry(reason).or_insert(0) += 1;
            }
        }

        report.kept_rows = kept.len();
        debug!(
            "Quality filter kept {} of {} rows",
            report.kept_rows, report.total_rows
        );

        (CleanedDataset::from_filtered(kept), report)
    }

    pub fn generate_summary(&self, report: &FilterReport) -> String {
        let mut summary = String::new();
        let pct = |n: usize| {
            if report.total_rows == 0 {
                0.0
            } else {
                100.0 * n as f64 / report.total_rows as f64
            }
        };

        summary.push_str("=== Quality Filter Report ===\n");
        summary.push_str(&format!("Total Rows: {}\n", report.total_rows));
        summary.push_str(&format!(
            "Kept Rows: {} ({:.1}%)\n",
            report.kept_rows,
            pct(report.kept_rows)
        ));
        summary.push_str(&format!(
            "Dropped Rows: {} ({:.1}%)\n",
            report.dropped_rows,
            pct(report.dropped_rows)
        ));

        if !report.by_reason.is_empty() {
            summary.push_str("\nDrops by Reason:\n");
            for (reason, count) in &report.by_reason {
                summary.push_str(&format!("  {}: {}\n", reason, count));
            }
        }

        summary
    }
}
