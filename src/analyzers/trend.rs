use crate::analyzers::stats::{linear_regression, mean, pearson};
use crate::models::{
    AnnualSeriesPoint, CleanedDataset, CorrelationStrength, Element, Estimate, StationTrend,
    TemperaturePrecipitationCorrelation, TrendReport,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Temporal trend view: per-station warming slope, the dataset-wide annual
/// series and the temperature/precipitation correlation.
pub fn temporal_trend(dataset: &CleanedDataset, min_years: usize) -> TrendReport {
    TrendReport {
        stations: station_trends(dataset, min_years),
        annual_series: annual_series(dataset),
        correlation: temperature_precipitation_correlation(dataset),
    }
}

/// OLS slope of annual mean temperature (all TMAX and TMIN readings of the
/// year) against year, for every station with temperature readings.
pub fn station_trends(dataset: &CleanedDataset, min_years: usize) -> Vec<StationTrend> {
    let mut years: BTreeMap<&str, BTreeMap<i32, Vec<f64>>> = BTreeMap::new();

    for row in dataset.iter().filter(|r| r.element.is_temperature()) {
        if let Some(value) = row.value {
            years
                .entry(row.station_id.as_str())
                .or_default()
                .entry(row.year())
                .or_default()
                .push(value);
        }
    }

    years
        .into_iter()
        .filter_map(|(station_id, by_year)| {
            let points: Vec<(f64, f64)> = by_year
                .iter()
                .filter_map(|(year, values)| Some((*year as f64, mean(values)?)))
                .collect();

            let first_year = *by_year.keys().next()?;
            let last_year = *by_year.keys().next_back()?;
            let distinct_years = points.len();

            let fit = if distinct_years < min_years {
                Estimate::insufficient(format!(
                    "{} distinct years, need {}",
                    distinct_years, min_years
                ))
            } else {
                Estimate::from_option(linear_regression(&points), "degenerate year range")
            };

            Some(StationTrend {
                station_id: station_id.to_string(),
                distinct_years,
                first_year,
                last_year,
                fit,
            })
        })
        .collect()
}

#[derive(Default)]
struct YearBucket {
    temperature: Vec<f64>,
    precipitation: Vec<f64>,
    observations: usize,
}

pub fn annual_series(dataset: &CleanedDataset) -> Vec<AnnualSeriesPoint> {
    let mut years: BTreeMap<i32, YearBucket> = BTreeMap::new();

    for row in dataset.iter() {
        let bucket = years.entry(row.year()).or_default();
        bucket.observations += 1;

        let Some(value) = row.value else { continue };
        if row.element.is_temperature() {
            bucket.temperature.push(value);
        } else {
            bucket.precipitation.push(value);
        }
    }

    years
        .into_iter()
        .map(|(year, bucket)| AnnualSeriesPoint {
            year,
            mean_temperature: Estimate::from_option(mean(&bucket.temperature), "no temperature readings"),
            mean_daily_precipitation: Estimate::from_option(
                mean(&bucket.precipitation),
                "no precipitation readings",
            ),
            observations: bucket.observations,
        })
        .collect()
}

#[derive(Default)]
struct DailyReadings {
    max: Option<f64>,
    min: Option<f64>,
    precipitation: Option<f64>,
}

/// Pearson correlation of daily mean temperature, `(TMAX + TMIN) / 2` on
/// days with both, against same-day precipitation at the same station.
pub fn temperature_precipitation_correlation(
    dataset: &CleanedDataset,
) -> TemperaturePrecipitationCorrelation {
    let mut days: BTreeMap<(&str, NaiveDate), DailyReadings> = BTreeMap::new();

    for row in dataset.iter() {
        let day = days.entry((row.station_id.as_str(), row.date)).or_default();
        match row.element {
            Element::MaxTemperature => day.max = row.value,
            Element::MinTemperature => day.min = row.value,
            Element::Precipitation => day.precipitation = row.value,
        }
    }

    let pairs: Vec<(f64, f64)> = days
        .values()
        .filter_map(|d| Some(((d.max? + d.min?) / 2.0, d.precipitation?)))
        .collect();

    let coefficient = Estimate::from_option(
        pearson(&pairs),
        format!("{} paired days, or a constant series", pairs.len()),
    );
    let strength = coefficient.value().map(|c| CorrelationStrength::classify(*c));

    TemperaturePrecipitationCorrelation {
        coefficient,
        strength,
        pairs: pairs.len(),
    }
}
