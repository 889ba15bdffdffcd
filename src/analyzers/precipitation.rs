use crate::analyzers::stats::{coefficient_of_variation, mean, sample_std_dev};
use crate::models::{
    AnnualPrecipitation, CleanedDataset, Element, Estimate, PrecipitationReport,
    PrecipitationVariability,
};
use std::collections::BTreeMap;

/// Annual precipitation totals per (station, year) and the per-station
/// variability of those totals.
///
/// Every year reports its sum. Only years with at least
/// `min_days_per_year` valid readings count towards variability.
pub fn annual_precipitation(dataset: &CleanedDataset, min_days_per_year: usize) -> PrecipitationReport {
    let mut years: BTreeMap<(&str, i32), Vec<f64>> = BTreeMap::new();

    for row in dataset.iter().filter(|r| r.element == Element::Precipitation) {
        if let Some(value) = row.value {
            years
                .entry((row.station_id.as_str(), row.year()))
                .or_default()
                .push(value);
        }
    }

    let annual: Vec<AnnualPrecipitation> = years
        .into_iter()
        .map(|((station_id, year), values)| {
            let total: f64 = values.iter().sum();
            AnnualPrecipitation {
                station_id: station_id.to_string(),
                year,
                total_mm: total,
                valid_days: values.len(),
                mean_daily_mm: total / values.len() as f64,
                std_dev_daily_mm: Estimate::from_option(
                    sample_std_dev(&values),
                    "fewer than 2 valid days",
                ),
                max_daily_mm: values.iter().copied().fold(f64::MIN, f64::max),
                meets_coverage: values.len() >= min_days_per_year,
            }
        })
        .collect();

    let variability = variability(&annual, min_days_per_year);

    PrecipitationReport {
        annual,
        variability,
    }
}

fn variability(annual: &[AnnualPrecipitation], min_days_per_year: usize) -> Vec<PrecipitationVariability> {
    let mut by_station: BTreeMap<&str, Vec<&AnnualPrecipitation>> = BTreeMap::new();
    for year in annual {
        by_station.entry(year.station_id.as_str()).or_default().push(year);
    }

    by_station
        .into_iter()
        .map(|(station_id, years)| {
            let totals: Vec<f64> = years
                .iter()
                .filter(|y| y.meets_coverage)
                .map(|y| y.total_mm)
                .collect();

            let too_few = format!(
                "{} years with >= {} valid days, need 2",
                totals.len(),
                min_days_per_year
            );

            let coefficient_of_variation = if totals.len() < 2 {
                Estimate::insufficient(too_few.clone())
            } else {
                Estimate::from_option(
                    coefficient_of_variation(&totals),
                    "mean annual precipitation is zero",
                )
            };

            PrecipitationVariability {
                station_id: station_id.to_string(),
                years_total: years.len(),
                years_qualifying: totals.len(),
                mean_annual_mm: Estimate::from_option(mean(&totals), too_few.clone()),
                std_dev_mm: Estimate::from_option(sample_std_dev(&totals), too_few),
                coefficient_of_variation,
            }
        })
        .collect()
}
