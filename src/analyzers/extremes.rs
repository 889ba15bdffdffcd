use crate::analyzers::stats::mean;
use crate::models::{CleanedDataset, Element, Estimate, ExtremeReading, StationExtremes};
use std::collections::BTreeMap;

#[derive(Default)]
struct StationAccumulator {
    highest_max: Option<ExtremeReading>,
    lowest_min: Option<ExtremeReading>,
    wettest_day: Option<ExtremeReading>,
    temperatures: Vec<f64>,
    observations: usize,
}

/// Replace `current` when `candidate` is strictly more extreme, or equally
/// extreme on an earlier date.
fn keep_extreme(
    current: &mut Option<ExtremeReading>,
    candidate: ExtremeReading,
    more_extreme: impl Fn(f64, f64) -> bool,
) {
    let replace = match current {
        None => true,
        Some(existing) => {
            more_extreme(candidate.value, existing.value)
                || (candidate.value == existing.value && candidate.date < existing.date)
        }
    };
    if replace {
        *current = Some(candidate);
    }
}

/// Per-station record high TMAX, record low TMIN and wettest day, each with
/// the date it occurred. Ties go to the earliest date.
pub fn station_extremes(dataset: &CleanedDataset) -> Vec<StationExtremes> {
    let mut stations: BTreeMap<&str, StationAccumulator> = BTreeMap::new();

    for row in dataset.iter() {
        let acc = stations.entry(row.station_id.as_str()).or_default();
        acc.observations += 1;

        let Some(value) = row.value else { continue };
        let reading = ExtremeReading {
            value,
            date: row.date,
        };

        if row.element.is_temperature() {
            acc.temperatures.push(value);
        }

        match row.element {
            Element::MaxTemperature => keep_extreme(&mut acc.highest_max, reading, |a, b| a > b),
            Element::MinTemperature => keep_extreme(&mut acc.lowest_min, reading, |a, b| a < b),
            Element::Precipitation => keep_extreme(&mut acc.wettest_day, reading, |a, b| a > b),
        }
    }

    stations
        .into_iter()
        .map(|(station_id, acc)| StationExtremes {
            station_id: station_id.to_string(),
            highest_max_temperature: Estimate::from_option(acc.highest_max, "no TMAX readings"),
            lowest_min_temperature: Estimate::from_option(acc.lowest_min, "no TMIN readings"),
            highest_daily_precipitation: Estimate::from_option(acc.wettest_day, "no PRCP readings"),
            mean_temperature: Estimate::from_option(
                mean(&acc.temperatures),
                "no temperature readings",
            ),
            observations: acc.observations,
        })
        .collect()
}
