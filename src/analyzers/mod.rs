pub mod extremes;
pub mod monthly;
pub mod precipitation;
pub mod seasonal;
pub mod stats;
pub mod trend;

pub use extremes::station_extremes;
pub use monthly::monthly_temperature;
pub use precipitation::annual_precipitation;
pub use seasonal::seasonal_comparison;
pub use trend::temporal_trend;

use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{AggregateResults, CleanedDataset};
use crate::utils::constants::{DEFAULT_MIN_PRECIP_DAYS, DEFAULT_MIN_TREND_YEARS};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Computes the five analytical views over a cleaned dataset.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    min_precip_days_per_year: usize,
    min_trend_years: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            min_precip_days_per_year: DEFAULT_MIN_PRECIP_DAYS,
            min_trend_years: DEFAULT_MIN_TREND_YEARS,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_precip_days_per_year: config.min_precip_days_per_year,
            min_trend_years: config.min_trend_years,
        }
    }

    pub fn with_min_trend_years(mut self, years: usize) -> Self {
        self.min_trend_years = years;
        self
    }

    /// Run the five aggregations as independent blocking tasks over the
    /// shared read-only dataset.
    pub async fn aggregate(&self, dataset: Arc<CleanedDataset>) -> Result<AggregateResults> {
        if dataset.is_empty() {
            return Err(ProcessingError::EmptyDataset {
                stage: "quality filtering".to_string(),
            });
        }

        info!("Aggregating {}", dataset.summary());

        let min_precip_days = self.min_precip_days_per_year;
        let min_trend_years = self.min_trend_years;

        let data = dataset.clone();
        let monthly_handle: JoinHandle<_> =
            tokio::task::spawn_blocking(move || monthly_temperature(&data));

        let data = dataset.clone();
        let precip_handle: JoinHandle<_> =
            tokio::task::spawn_blocking(move || annual_precipitation(&data, min_precip_days));

        let data = dataset.clone();
        let extremes_handle: JoinHandle<_> =
            tokio::task::spawn_blocking(move || station_extremes(&data));

        let data = dataset.clone();
        let seasonal_handle: JoinHandle<_> =
            tokio::task::spawn_blocking(move || seasonal_comparison(&data));

        let data = dataset;
        let trend_handle: JoinHandle<_> =
            tokio::task::spawn_blocking(move || temporal_trend(&data, min_trend_years));

        let (monthly_temperature, precipitation, extremes, seasonal, trend) = tokio::try_join!(
            monthly_handle,
            precip_handle,
            extremes_handle,
            seasonal_handle,
            trend_handle
        )?;

        Ok(AggregateResults {
            monthly_temperature,
            precipitation,
            extremes,
            seasonal,
            trend,
        })
    }

    /// Sequential variant for callers without a runtime.
    pub fn aggregate_blocking(&self, dataset: &CleanedDataset) -> Result<AggregateResults> {
        if dataset.is_empty() {
            return Err(ProcessingError::EmptyDataset {
                stage: "quality filtering".to_string(),
            });
        }

        Ok(AggregateResults {
            monthly_temperature: monthly_temperature(dataset),
            precipitation: annual_precipitation(dataset, self.min_precip_days_per_year),
            extremes: station_extremes(dataset),
            seasonal: seasonal_comparison(dataset),
            trend: temporal_trend(dataset, self.min_trend_years),
        })
    }

    pub fn generate_summary(&self, results: &AggregateResults) -> String {
        let mut summary = String::new();

        let computable_cv = results
            .precipitation
            .variability
            .iter()
            .filter(|v| v.coefficient_of_variation.is_computable())
            .count();
        let computable_trends = results
            .trend
            .stations
            .iter()
            .filter(|t| t.fit.is_computable())
            .count();

        summary.push_str("=== Aggregation Results ===\n");
        summary.push_str(&format!(
            "Monthly Buckets: {} ({} calendar months)\n",
            results.monthly_temperature.buckets.len(),
            results.monthly_temperature.climatology.len()
        ));
        summary.push_str(&format!(
            "Station-Years of Precipitation: {} ({} of {} stations with variability)\n",
            results.precipitation.annual.len(),
            computable_cv,
            results.precipitation.variability.len()
        ));
        summary.push_str(&format!("Stations with Extremes: {}\n", results.extremes.len()));
        summary.push_str(&format!(
            "Seasonal Summaries: {} ({} deltas)\n",
            results.seasonal.summaries.len(),
            results.seasonal.deltas.len()
        ));
        summary.push_str(&format!(
            "Station Trends: {} of {} computable\n",
            computable_trends,
            results.trend.stations.len()
        ));

        let correlation = &results.trend.correlation;
        match (correlation.coefficient.value(), correlation.strength) {
            (Some(r), Some(strength)) => summary.push_str(&format!(
                "Temperature/Precipitation Correlation: {:.3} ({:?}, {} days)\n",
                r, strength, correlation.pairs
            )),
            _ => summary.push_str("Temperature/Precipitation Correlation: insufficient data\n"),
        }

        summary
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{CanonicalRow, CleanedDataset, Element};
    use chrono::NaiveDate;

    pub fn row(station: &str, date: &str, element: Element, value: f64) -> CanonicalRow {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        CanonicalRow::new(station, date, element, Some(value))
    }

    pub fn dataset(mut rows: Vec<CanonicalRow>) -> CleanedDataset {
        rows.sort_by(|a, b| a.sort_cmp(b));
        CleanedDataset::from_filtered(rows)
    }
}
