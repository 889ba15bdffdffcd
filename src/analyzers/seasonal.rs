use crate::analyzers::stats::{mean, min_max};
use crate::models::{
    CleanedDataset, Element, Estimate, Season, SeasonalDelta, SeasonalReport, SeasonalSummary,
};
use std::collections::BTreeMap;

#[derive(Default)]
struct SeasonBucket {
    max: Vec<f64>,
    min: Vec<f64>,
    precipitation: Vec<f64>,
}

/// Per-station seasonal means and the change between consecutive seasons
/// (winter→spring→summer→autumn→winter).
pub fn seasonal_comparison(dataset: &CleanedDataset) -> SeasonalReport {
    let mut buckets: BTreeMap<(&str, Season), SeasonBucket> = BTreeMap::new();

    for row in dataset.iter() {
        let Some(value) = row.value else { continue };
        let bucket = buckets
            .entry((row.station_id.as_str(), Season::from_month(row.month())))
            .or_default();

        match row.element {
            Element::MaxTemperature => bucket.max.push(value),
            Element::MinTemperature => bucket.min.push(value),
            Element::Precipitation => bucket.precipitation.push(value),
        }
    }

    let summaries: Vec<SeasonalSummary> = buckets
        .iter()
        .map(|((station_id, season), bucket)| {
            let temperatures: Vec<f64> = bucket.max.iter().chain(&bucket.min).copied().collect();
            let range = min_max(&temperatures);
            let no_temperature = format!("no {} temperature readings", season);

            SeasonalSummary {
                station_id: station_id.to_string(),
                season: *season,
                mean_max: Estimate::from_option(mean(&bucket.max), format!("no {} TMAX", season)),
                mean_min: Estimate::from_option(mean(&bucket.min), format!("no {} TMIN", season)),
                max_temperature: Estimate::from_option(
                    range.map(|(_, hi)| hi),
                    no_temperature.clone(),
                ),
                min_temperature: Estimate::from_option(range.map(|(lo, _)| lo), no_temperature),
                mean_daily_precipitation: Estimate::from_option(
                    mean(&bucket.precipitation),
                    format!("no {} PRCP", season),
                ),
                observations: bucket.max.len() + bucket.min.len() + bucket.precipitation.len(),
            }
        })
        .collect();

    let deltas = deltas(&summaries);

    SeasonalReport { summaries, deltas }
}

fn deltas(summaries: &[SeasonalSummary]) -> Vec<SeasonalDelta> {
    let mut by_station: BTreeMap<&str, BTreeMap<Season, &SeasonalSummary>> = BTreeMap::new();
    for summary in summaries {
        by_station
            .entry(summary.station_id.as_str())
            .or_default()
            .insert(summary.season, summary);
    }

    let mut deltas = Vec::new();

    for (station_id, seasons) in by_station {
        for from in Season::CYCLE {
            let to = from.next();

            deltas.push(SeasonalDelta {
                station_id: station_id.to_string(),
                from,
                to,
                delta_max: season_change(&seasons, from, to, |s| &s.mean_max),
                delta_min: season_change(&seasons, from, to, |s| &s.mean_min),
            });
        }
    }

    deltas
}

fn season_change(
    seasons: &BTreeMap<Season, &SeasonalSummary>,
    from: Season,
    to: Season,
    select: impl Fn(&SeasonalSummary) -> &Estimate<f64>,
) -> Estimate<f64> {
    let pick = |season: Season| match seasons.get(&season) {
        Some(summary) => select(summary).clone(),
        None => Estimate::insufficient(format!("no {} readings", season)),
    };

    pick(to).combine(&pick(from), |a, b| a - b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{dataset, row};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_seasonal_means() {
        let data = dataset(vec![
            row("S1", "2020-01-15", Element::MaxTemperature, 2.0),
            row("S1", "2020-12-15", Element::MaxTemperature, 4.0),
            row("S1", "2020-07-01", Element::MaxTemperature, 30.0),
            row("S1", "2020-07-01", Element::MinTemperature, 18.0),
            row("S1", "2020-07-01", Element::Precipitation, 3.0),
        ]);

        let report = seasonal_comparison(&data);

        assert_eq!(report.summaries.len(), 2);
        let winter = &report.summaries[0];
        assert_eq!(winter.season, Season::Winter);
        assert_eq!(winter.mean_max, Estimate::Value(3.0));
        assert!(!winter.mean_min.is_computable());
        assert_eq!(winter.observations, 2);

        assert_eq!(winter.max_temperature, Estimate::Value(4.0));
        assert_eq!(winter.min_temperature, Estimate::Value(2.0));

        let summer = &report.summaries[1];
        assert_eq!(summer.season, Season::Summer);
        assert_eq!(summer.mean_daily_precipitation, Estimate::Value(3.0));
        assert_eq!(summer.max_temperature, Estimate::Value(30.0));
        assert_eq!(summer.min_temperature, Estimate::Value(18.0));
        assert_eq!(summer.observations, 3);
    }

    #[test]
    fn test_deltas_follow_cycle() {
        let data = dataset(vec![
            row("S1", "2020-01-15", Element::MaxTemperature, 0.0),
            row("S1", "2020-04-15", Element::MaxTemperature, 12.0),
            row("S1", "2020-07-15", Element::MaxTemperature, 28.0),
            row("S1", "2020-10-15", Element::MaxTemperature, 14.0),
        ]);

        let report = seasonal_comparison(&data);
        let pairs: Vec<(Season, Season, Option<f64>)> = report
            .deltas
            .iter()
            .map(|d| (d.from, d.to, d.delta_max.value().copied()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                (Season::Winter, Season::Spring, Some(12.0)),
                (Season::Spring, Season::Summer, Some(16.0)),
                (Season::Summer, Season::Autumn, Some(-14.0)),
                (Season::Autumn, Season::Winter, Some(-14.0)),
            ]
        );
        assert!(report.deltas.iter().all(|d| !d.delta_min.is_computable()));
    }

    #[test]
    fn test_missing_season_makes_delta_not_computable() {
        let data = dataset(vec![row("S1", "2020-07-15", Element::MaxTemperature, 28.0)]);

        let report = seasonal_comparison(&data);

        assert_eq!(report.deltas.len(), 4);
        assert!(report.deltas.iter().all(|d| !d.delta_max.is_computable()));
    }
}
