use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Season;

/// A statistic that may not be computable from the available data.
///
/// Insufficient-data conditions are surfaced explicitly instead of being
/// replaced with zero or a null aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Estimate<T> {
    Value(T),
    InsufficientData { reason: String },
}

impl<T> Estimate<T> {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Estimate::InsufficientData {
            reason: reason.into(),
        }
    }

    pub fn from_option(value: Option<T>, reason: impl Into<String>) -> Self {
        match value {
            Some(v) => Estimate::Value(v),
            None => Estimate::insufficient(reason),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Estimate::Value(v) => Some(v),
            Estimate::InsufficientData { .. } => None,
        }
    }

    pub fn is_computable(&self) -> bool {
        matches!(self, Estimate::Value(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Estimate::Value(_) => "ok",
            Estimate::InsufficientData { .. } => "insufficient_data",
        }
    }
}

impl Estimate<f64> {
    pub fn combine(&self, other: &Estimate<f64>, op: impl Fn(f64, f64) -> f64) -> Estimate<f64> {
        match (self, other) {
            (Estimate::Value(a), Estimate::Value(b)) => Estimate::Value(op(*a, *b)),
            (Estimate::InsufficientData { reason }, _) | (_, Estimate::InsufficientData { reason }) => {
                Estimate::insufficient(reason.clone())
            }
        }
    }
}

/// Monthly temperature statistics for one (station, year, month) bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTemperature {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    /// Mean over every TMAX and TMIN reading in the bucket.
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: Estimate<f64>,
    pub count: usize,
    pub mean_max: Estimate<f64>,
    pub mean_min: Estimate<f64>,
}

/// Calendar-month mean of the monthly bucket means across stations and years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyClimatology {
    pub month: u32,
    pub mean_of_means: f64,
    pub station_count: usize,
    pub bucket_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualPrecipitation {
    pub station_id: String,
    pub year: i32,
    pub total_mm: f64,
    pub valid_days: usize,
    pub mean_daily_mm: f64,
    /// Sample standard deviation of the daily amounts.
    pub std_dev_daily_mm: Estimate<f64>,
    pub max_daily_mm: f64,
    /// Whether the year had enough valid days to count towards variability.
    pub meets_coverage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationVariability {
    pub station_id: String,
    pub years_total: usize,
    pub years_qualifying: usize,
    pub mean_annual_mm: Estimate<f64>,
    pub std_dev_mm: Estimate<f64>,
    pub coefficient_of_variation: Estimate<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtremeReading {
    pub value: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationExtremes {
    pub station_id: String,
    pub highest_max_temperature: Estimate<ExtremeReading>,
    pub lowest_min_temperature: Estimate<ExtremeReading>,
    pub highest_daily_precipitation: Estimate<ExtremeReading>,
    /// Mean over every TMAX and TMIN reading of the station.
    pub mean_temperature: Estimate<f64>,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalSummary {
    pub station_id: String,
    pub season: Season,
    pub mean_max: Estimate<f64>,
    pub mean_min: Estimate<f64>,
    /// Highest and lowest of all temperature readings in the season.
    pub max_temperature: Estimate<f64>,
    pub min_temperature: Estimate<f64>,
    pub mean_daily_precipitation: Estimate<f64>,
    pub observations: usize,
}

/// Change in seasonal means between two consecutive seasons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalDelta {
    pub station_id: String,
    pub from: Season,
    pub to: Season,
    pub delta_max: Estimate<f64>,
    pub delta_min: Estimate<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendFit {
    /// °C per year.
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl TrendFit {
    pub fn slope_per_decade(&self) -> f64 {
        self.slope * 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTrend {
    pub station_id: String,
    pub distinct_years: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub fit: Estimate<TrendFit>,
}

/// Dataset-wide per-year averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSeriesPoint {
    pub year: i32,
    pub mean_temperature: Estimate<f64>,
    pub mean_daily_precipitation: Estimate<f64>,
    pub observations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

impl CorrelationStrength {
    pub fn classify(coefficient: f64) -> Self {
        let magnitude = coefficient.abs();
        if magnitude < 0.3 {
            CorrelationStrength::Weak
        } else if magnitude < 0.7 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Strong
        }
    }
}

/// Pearson correlation of daily mean temperature against same-day precipitation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperaturePrecipitationCorrelation {
    pub coefficient: Estimate<f64>,
    pub strength: Option<CorrelationStrength>,
    pub pairs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub stations: Vec<StationTrend>,
    pub annual_series: Vec<AnnualSeriesPoint>,
    pub correlation: TemperaturePrecipitationCorrelation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTemperatureReport {
    pub buckets: Vec<MonthlyTemperature>,
    pub climatology: Vec<MonthlyClimatology>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationReport {
    pub annual: Vec<AnnualPrecipitation>,
    pub variability: Vec<PrecipitationVariability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalReport {
    pub summaries: Vec<SeasonalSummary>,
    pub deltas: Vec<SeasonalDelta>,
}

/// The five analytical views produced from one cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResults {
    pub monthly_temperature: MonthlyTemperatureReport,
    pub precipitation: PrecipitationReport,
    pub extremes: Vec<StationExtremes>,
    pub seasonal: SeasonalReport,
    pub trend: TrendReport,
}
