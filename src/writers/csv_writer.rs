use crate::error::{ProcessingError, Result};
use crate::models::{
    AggregateResults, AnnualPrecipitation, AnnualSeriesPoint, CanonicalRow, Element, Estimate,
    ExtremeReading, MonthlyClimatology, MonthlyTemperature, PrecipitationVariability,
    SeasonalDelta, SeasonalSummary, StationExtremes, StationTrend,
};
use crate::processors::normalizer::{NormalizedFile, ParseStats};
use crate::utils::constants::{
    ANNUAL_PRECIP_CSV, ANNUAL_SERIES_CSV, CSV_DATE_FORMAT, DEFAULT_BUFFER_SIZE, EXTREMES_CSV,
    MONTHLY_CLIMATOLOGY_CSV, MONTHLY_MEAN_TEMP_CSV, PRECIP_VARIABILITY_CSV, SEASONAL_CSV,
    SEASONAL_DELTAS_CSV, TREND_CSV,
};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const ROW_HEADERS: [&str; 4] = ["station_id", "date", "element", "value"];

const STATUS_OK: &str = "ok";
const STATUS_INSUFFICIENT: &str = "insufficient_data";

/// A result-table row. `status` is `insufficient_data` when any statistic in
/// the row could not be computed; those cells are left empty.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn fields(&self) -> Vec<String>;
    fn computable(&self) -> bool {
        true
    }
}

fn decimal(value: f64) -> String {
    format!("{:.4}", value)
}

fn estimate(value: &Estimate<f64>) -> String {
    value.value().map(|v| decimal(*v)).unwrap_or_default()
}

fn extreme_cells(reading: &Estimate<ExtremeReading>) -> [String; 2] {
    match reading.value() {
        Some(r) => [decimal(r.value), r.date.format(CSV_DATE_FORMAT).to_string()],
        None => [String::new(), String::new()],
    }
}

impl TableRow for MonthlyTemperature {
    fn headers() -> &'static [&'static str] {
        &[
            "station_id", "year", "month", "mean_temp_c", "min_temp_c", "max_temp_c",
            "std_dev_c", "count", "mean_tmax_c", "mean_tmin_c", "status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.station_id.clone(),
            self.year.to_string(),
            self.month.to_string(),
            decimal(self.mean),
            decimal(self.min),
            decimal(self.max),
            estimate(&self.std_dev),
            self.count.to_string(),
            estimate(&self.mean_max),
            estimate(&self.mean_min),
        ]
    }

    fn computable(&self) -> bool {
        self.std_dev.is_computable() && self.mean_max.is_computable() && self.mean_min.is_computable()
    }
}

impl TableRow for MonthlyClimatology {
    fn headers() -> &'static [&'static str] {
        &["month", "mean_temp_c", "station_count", "bucket_count", "status"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.month.to_string(),
            decimal(self.mean_of_means),
            self.station_count.to_string(),
            self.bucket_count.to_string(),
        ]
    }
}

impl TableRow for AnnualPrecipitation {
    fn headers() -> &'static [&'static str] {
        &[
            "station_id", "year", "total_mm", "valid_days", "mean_daily_mm", "std_dev_daily_mm",
            "max_daily_mm", "meets_coverage", "status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.station_id.clone(),
            self.year.to_string(),
            decimal(self.total_mm),
            self.valid_days.to_string(),
            decimal(self.mean_daily_mm),
            estimate(&self.std_dev_daily_mm),
            decimal(self.max_daily_mm),
            self.meets_coverage.to_string(),
        ]
    }

    fn computable(&self) -> bool {
        self.std_dev_daily_mm.is_computable()
    }
}

impl TableRow for PrecipitationVariability {
    fn headers() -> &'static [&'static str] {
        &[
            "station_id", "years_total", "years_qualifying", "mean_annual_mm", "std_dev_mm",
            "coefficient_of_variation", "status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.station_id.clone(),
            self.years_total.to_string(),
            self.years_qualifying.to_string(),
            estimate(&self.mean_annual_mm),
            estimate(&self.std_dev_mm),
            estimate(&self.coefficient_of_variation),
        ]
    }

    fn computable(&self) -> bool {
        self.coefficient_of_variation.is_computable()
    }
}

impl TableRow for StationExtremes {
    fn headers() -> &'static [&'static str] {
        &[
            "station_id", "max_tmax_c", "max_tmax_date", "min_tmin_c", "min_tmin_date",
            "max_prcp_mm", "max_prcp_date", "mean_temp_c", "observations", "status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![self.station_id.clone()];
        fields.extend(extreme_cells(&self.highest_max_temperature));
        fields.extend(extreme_cells(&self.lowest_min_temperature));
        fields.extend(extreme_cells(&self.highest_daily_precipitation));
        fields.push(estimate(&self.mean_temperature));
        fields.push(self.observations.to_string());
        fields
    }

    fn computable(&self) -> bool {
        self.highest_max_temperature.is_computable()
            && self.lowest_min_temperature.is_computable()
            && self.highest_daily_precipitation.is_computable()
            && self.mean_temperature.is_computable()
    }
}

impl TableRow for SeasonalSummary {
    fn headers() -> &'static [&'static str] {
        &[
            "station_id", "season", "mean_tmax_c", "mean_tmin_c", "max_temp_c", "min_temp_c",
            "mean_daily_prcp_mm", "observations", "status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.station_id.clone(),
            self.season.to_string(),
            estimate(&self.mean_max),
            estimate(&self.mean_min),
            estimate(&self.max_temperature),
            estimate(&self.min_temperature),
            estimate(&self.mean_daily_precipitation),
            self.observations.to_string(),
        ]
    }

    fn computable(&self) -> bool {
        self.mean_max.is_computable()
            && self.mean_min.is_computable()
            && self.max_temperature.is_computable()
            && self.min_temperature.is_computable()
            && self.mean_daily_precipitation.is_computable()
    }
}

impl TableRow for SeasonalDelta {
    fn headers() -> &'static [&'static str] {
        &["station_id", "from_season", "to_season", "delta_tmax_c", "delta_tmin_c", "status"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.station_id.clone(),
            self.from.to_string(),
            self.to.to_string(),
            estimate(&self.delta_max),
            estimate(&self.delta_min),
        ]
    }

    fn computable(&self) -> bool {
        self.delta_max.is_computable() && self.delta_min.is_computable()
    }
}

impl TableRow for StationTrend {
    fn headers() -> &'static [&'static str] {
        &[
            "station_id", "distinct_years", "first_year", "last_year", "slope_c_per_year",
            "slope_c_per_decade", "intercept_c", "r_squared", "status",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.station_id.clone(),
            self.distinct_years.to_string(),
            self.first_year.to_string(),
            self.last_year.to_string(),
        ];
        match self.fit.value() {
            Some(fit) => fields.extend([
                decimal(fit.slope),
                decimal(fit.slope_per_decade()),
                decimal(fit.intercept),
                decimal(fit.r_squared),
            ]),
            None => fields.extend(std::iter::repeat(String::new()).take(4)),
        }
        fields
    }

    fn computable(&self) -> bool {
        self.fit.is_computable()
    }
}

impl TableRow for AnnualSeriesPoint {
    fn headers() -> &'static [&'static str] {
        &["year", "mean_temp_c", "mean_daily_prcp_mm", "observations", "status"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.year.to_string(),
            estimate(&self.mean_temperature),
            estimate(&self.mean_daily_precipitation),
            self.observations.to_string(),
        ]
    }

    fn computable(&self) -> bool {
        self.mean_temperature.is_computable() && self.mean_daily_precipitation.is_computable()
    }
}

/// CSV output of canonical rows and aggregation result tables.
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write canonical rows as `station_id,date,element,value`; an absent
    /// value is an empty cell.
    pub fn write_rows(&self, rows: &[CanonicalRow], path: &Path) -> Result<()> {
        let file = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, File::create(path)?);
        let mut writer = csv::Writer::from_writer(file);

        writer.write_record(ROW_HEADERS)?;
        for row in rows {
            let date = row.date.format(CSV_DATE_FORMAT).to_string();
            let value = row.value.map(|v| v.to_string()).unwrap_or_default();
            writer.write_record([
                row.station_id.as_str(),
                date.as_str(),
                row.element.code(),
                value.as_str(),
            ])?;
        }

        writer.flush()?;
        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }

    /// Read rows written by [`CsvWriter::write_rows`]. Malformed records are
    /// counted and skipped; a wrong header or an I/O failure fails the file.
    pub fn read_rows(&self, path: &Path) -> Result<NormalizedFile> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        if headers.iter().ne(ROW_HEADERS.iter().copied()) {
            return Err(ProcessingError::InvalidFormat(format!(
                "{}: expected header {}",
                path.display(),
                ROW_HEADERS.join(",")
            )));
        }

        let mut rows = Vec::new();
        let mut stats = ParseStats::default();

        for result in reader.records() {
            stats.lines_read += 1;

            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(_) => {
                    stats.malformed_lines += 1;
                    continue;
                }
            };

            match parse_row(&record) {
                Ok(row) => {
                    if row.value.is_none() {
                        stats.missing_values += 1;
                    }
                    rows.push(row);
                }
                Err(e) => {
                    debug!("{} line {}: {}", path.display(), stats.lines_read + 1, e);
                    stats.malformed_lines += 1;
                }
            }
        }

        stats.rows_emitted = rows.len();

        Ok(NormalizedFile {
            path: path.to_path_buf(),
            rows,
            stats,
        })
    }

    pub fn write_table<T: TableRow>(&self, rows: &[T], path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        let mut writer = csv::Writer::from_writer(file);

        writer.write_record(T::headers())?;
        for row in rows {
            let mut fields = row.fields();
            fields.push(
                if row.computable() {
                    STATUS_OK
                } else {
                    STATUS_INSUFFICIENT
                }
                .to_string(),
            );
            writer.write_record(&fields)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write all nine result tables into `dir`, returning their paths.
    pub fn write_results(&self, results: &AggregateResults, dir: &Path) -> Result<Vec<PathBuf>> {
        let path = |name: &str| dir.join(name);
        let mut written = Vec::new();

        let mut write = |name: &str, f: &dyn Fn(&Path) -> Result<()>| -> Result<()> {
            let p = path(name);
            f(&p)?;
            written.push(p);
            Ok(())
        };

        write(MONTHLY_MEAN_TEMP_CSV, &|p| {
            self.write_table(&results.monthly_temperature.buckets, p)
        })?;
        write(MONTHLY_CLIMATOLOGY_CSV, &|p| {
            self.write_table(&results.monthly_temperature.climatology, p)
        })?;
        write(ANNUAL_PRECIP_CSV, &|p| self.write_table(&results.precipitation.annual, p))?;
        write(PRECIP_VARIABILITY_CSV, &|p| {
            self.write_table(&results.precipitation.variability, p)
        })?;
        write(EXTREMES_CSV, &|p| self.write_table(&results.extremes, p))?;
        write(SEASONAL_CSV, &|p| self.write_table(&results.seasonal.summaries, p))?;
        write(SEASONAL_DELTAS_CSV, &|p| self.write_table(&results.seasonal.deltas, p))?;
        write(TREND_CSV, &|p| self.write_table(&results.trend.stations, p))?;
        write(ANNUAL_SERIES_CSV, &|p| self.write_table(&results.trend.annual_series, p))?;

        Ok(written)
    }
}

fn parse_row(record: &csv::StringRecord) -> Result<CanonicalRow> {
    let malformed = |what: &str| ProcessingError::MalformedRecord(what.to_string());

    if record.len() != ROW_HEADERS.len() {
        return Err(malformed("wrong field count"));
    }

    let date = NaiveDate::parse_from_str(&record[1], CSV_DATE_FORMAT)
        .map_err(|_| malformed("invalid date"))?;
    let element = Element::from_code(&record[2]).ok_or_else(|| malformed("unknown element"))?;
    let value = match record[3].trim() {
        "" => None,
        v => Some(v.parse::<f64>().map_err(|_| malformed("invalid value"))?),
    };

    Ok(CanonicalRow::new(&record[0], date, element, value))
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut file, value)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Season, TrendFit};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rows_written_and_read_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("unified.csv");
        let rows = vec![
            CanonicalRow::new("S1", ymd(2020, 1, 1), Element::Precipitation, Some(0.0)),
            CanonicalRow::new("S1", ymd(2020, 1, 1), Element::MaxTemperature, Some(-3.4)),
            CanonicalRow::new("S1", ymd(2020, 1, 1), Element::MinTemperature, None),
        ];

        let writer = CsvWriter::new();
        writer.write_rows(&rows, &path)?;

        let text = std::fs::read_to_string(&path)?;
        assert_eq!(
            text,
            "station_id,date,element,value\n\
             S1,2020-01-01,PRCP,0\n\
             S1,2020-01-01,TMAX,-3.4\n\
             S1,2020-01-01,TMIN,\n"
        );
        let read_back = writer.read_rows(&path)?;
        assert_eq!(read_back.rows, rows);
        assert_eq!(read_back.stats.missing_values, 1);
        assert_eq!(read_back.stats.malformed_lines, 0);

        Ok(())
    }

    #[test]
    fn test_read_skips_and_counts_bad_rows() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cleaned.csv");

        std::fs::write(
            &path,
            "station_id,date,element,value\n\
             S1,2020-02-28,TMAX,1\n\
             S1,2020-02-30,TMAX,2\n\
             S1,2020-03-01,SNOW,3\n\
             S1,2020-03-01,TMAX,warm\n\
             S1,2020-03-02\n\
             S1,2020-03-02,TMAX,4\n",
        )?;
        let file = CsvWriter::new().read_rows(&path)?;

        let days: Vec<u32> = file.rows.iter().map(|r| r.day()).collect();
        assert_eq!(days, vec![28, 2]);
        assert_eq!(file.stats.lines_read, 6);
        assert_eq!(file.stats.malformed_lines, 4);
        assert_eq!(file.stats.rows_emitted, 2);

        Ok(())
    }

    #[test]
    fn test_read_rejects_wrong_header() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cleaned.csv");

        std::fs::write(&path, "a,b\n1,2\n")?;
        assert!(matches!(
            CsvWriter::new().read_rows(&path),
            Err(ProcessingError::InvalidFormat(_))
        ));

        Ok(())
    }

    #[test]
    fn test_insufficient_data_cells() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("trend.csv");

        let trends = vec![
            StationTrend {
                station_id: "S1".to_string(),
                distinct_years: 3,
                first_year: 2018,
                last_year: 2020,
                fit: Estimate::insufficient("3 distinct years, need 10"),
            },
            StationTrend {
                station_id: "S2".to_string(),
                distinct_years: 12,
                first_year: 2000,
                last_year: 2011,
                fit: Estimate::Value(TrendFit {
                    slope: 0.02,
                    intercept: -30.0,
                    r_squared: 0.5,
                }),
            },
        ];

        CsvWriter::new().write_table(&trends, &path)?;

        let lines: Vec<String> = std::fs::read_to_string(&path)?
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(lines[1], "S1,3,2018,2020,,,,,insufficient_data");
        assert_eq!(lines[2], "S2,12,2000,2011,0.0200,0.2000,-30.0000,0.5000,ok");

        Ok(())
    }

    #[test]
    fn test_seasonal_delta_row() {
        let delta = SeasonalDelta {
            station_id: "S1".to_string(),
            from: Season::Autumn,
            to: Season::Winter,
            delta_max: Estimate::Value(-12.5),
            delta_min: Estimate::insufficient("no winter TMIN"),
        };

        assert_eq!(delta.fields(), vec!["S1", "autumn", "winter", "-12.5000", ""]);
        assert!(!delta.computable());
        assert_eq!(SeasonalDelta::headers().len(), delta.fields().len() + 1);
    }
}
