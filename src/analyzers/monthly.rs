use crate::analyzers::stats::{mean, min_max, sample_std_dev};
use crate::models::{
    CleanedDataset, Element, Estimate, MonthlyClimatology, MonthlyTemperature,
    MonthlyTemperatureReport,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct MonthBucket {
    all: Vec<f64>,
    max: Vec<f64>,
    min: Vec<f64>,
}

/// Monthly temperature statistics per (station, year, month) over every
/// TMAX and TMIN reading, plus a calendar-month climatology of the bucket
/// means across stations and years.
pub fn monthly_temperature(dataset: &CleanedDataset) -> MonthlyTemperatureReport {
    let mut buckets: BTreeMap<(&str, i32, u32), MonthBucket> = BTreeMap::new();

    for row in dataset.iter().filter(|r| r.element.is_temperature()) {
        let Some(value) = row.value else { continue };
        let bucket = buckets
            .entry((row.station_id.as_str(), row.year(), row.month()))
            .or_default();

        bucket.all.push(value);
        match row.element {
            Element::MaxTemperature => bucket.max.push(value),
            Element::MinTemperature => bucket.min.push(value),
            Element::Precipitation => {}
        }
    }

    let mut results = Vec::with_capacity(buckets.len());

    for ((station_id, year, month), bucket) in &buckets {
        let (Some(bucket_mean), Some((lo, hi))) = (mean(&bucket.all), min_max(&bucket.all)) else {
            continue;
        };

        results.push(MonthlyTemperature {
            station_id: station_id.to_string(),
            year: *year,
            month: *month,
            mean: bucket_mean,
            min: lo,
            max: hi,
            std_dev: Estimate::from_option(
                sample_std_dev(&bucket.all),
                "fewer than 2 readings",
            ),
            count: bucket.all.len(),
            mean_max: Estimate::from_option(mean(&bucket.max), "no TMAX readings"),
            mean_min: Estimate::from_option(mean(&bucket.min), "no TMIN readings"),
        });
    }

    let climatology = climatology(&results);

    MonthlyTemperatureReport {
        buckets: results,
        climatology,
    }
}

fn climatology(buckets: &[MonthlyTemperature]) -> Vec<MonthlyClimatology> {
    let mut by_month: BTreeMap<u32, (Vec<f64>, BTreeSet<&str>)> = BTreeMap::new();

    for bucket in buckets {
        let entry = by_month.entry(bucket.month).or_default();
        entry.0.push(bucket.mean);
        entry.1.insert(bucket.station_id.as_str());
    }

    by_month
        .into_iter()
        .filter_map(|(month, (means, stations))| {
            Some(MonthlyClimatology {
                month,
                mean_of_means: mean(&means)?,
                station_count: stations.len(),
                bucket_count: means.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{dataset, row};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_monthly_mean_of_readings() {
        let data = dataset(vec![
            row("S1", "2020-01-01", Element::MaxTemperature, 10.0),
            row("S1", "2020-01-02", Element::MaxTemperature, 12.0),
            row("S1", "2020-01-03", Element::MaxTemperature, 14.0),
            row("S1", "2020-01-03", Element::Precipitation, 50.0),
        ]);

        let report = monthly_temperature(&data);

        assert_eq!(report.buckets.len(), 1);
        let jan = &report.buckets[0];
        assert_eq!((jan.year, jan.month), (2020, 1));
        assert_eq!(jan.mean, 12.0);
        assert_eq!((jan.min, jan.max), (10.0, 14.0));
        assert_eq!(jan.count, 3);
        assert_eq!(jan.std_dev, Estimate::Value(2.0));
        assert_eq!(jan.mean_max, Estimate::Value(12.0));
        assert!(!jan.mean_min.is_computable());
    }

    #[test]
    fn test_max_and_min_pooled() {
        let data = dataset(vec![
            row("S1", "2020-07-01", Element::MaxTemperature, 30.0),
            row("S1", "2020-07-01", Element::MinTemperature, 20.0),
        ]);

        let report = monthly_temperature(&data);
        let july = &report.buckets[0];

        assert_eq!(july.mean, 25.0);
        assert_eq!(july.mean_max, Estimate::Value(30.0));
        assert_eq!(july.mean_min, Estimate::Value(20.0));
    }

    #[test]
    fn test_climatology_averages_bucket_means() {
        let data = dataset(vec![
            row("S1", "2019-01-01", Element::MaxTemperature, 2.0),
            row("S1", "2020-01-01", Element::MaxTemperature, 4.0),
            row("S1", "2020-01-02", Element::MaxTemperature, 4.0),
            row("S2", "2020-01-01", Element::MaxTemperature, 9.0),
            row("S2", "2020-02-01", Element::MaxTemperature, 1.0),
        ]);

        let report = monthly_temperature(&data);

        assert_eq!(report.buckets.len(), 4);
        assert_eq!(
            report.climatology,
            vec![
                MonthlyClimatology {
                    month: 1,
                    mean_of_means: 5.0,
                    station_count: 2,
                    bucket_count: 3,
                },
                MonthlyClimatology {
                    month: 2,
                    mean_of_means: 1.0,
                    station_count: 1,
                    bucket_count: 1,
                },
            ]
        );
    }
}
