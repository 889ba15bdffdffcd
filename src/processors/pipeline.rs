use crate::analyzers::Aggregator;
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{AggregateResults, CanonicalRow, CleanedDataset, TemperaturePrecipitationCorrelation};
use crate::processors::normalizer::ParseStats;
use crate::processors::quality_filter::{FilterReport, QualityFilter};
use crate::processors::sampler::Sampler;
use crate::processors::unifier::{UnifyReport, Unifier};
use crate::readers::{ConcurrentReader, FailedFile};
use crate::utils::constants::{CLEANED_CSV, CLEANED_PARQUET, SUMMARY_JSON, UNIFIED_CSV};
use crate::utils::progress::ProgressReporter;
use crate::writers::{write_json, CsvWriter, ParquetWriter};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub stations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl DatasetSummary {
    fn of(dataset: &CleanedDataset) -> Self {
        let range = dataset.date_range();
        Self {
            rows: dataset.len(),
            stations: dataset.stations().len(),
            first_date: range.map(|(start, _)| start),
            last_date: range.map(|(_, end)| end),
        }
    }
}

/// Everything a run learned, written to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub elapsed_seconds: f64,
    pub inputs: Vec<PathBuf>,
    pub files_read: usize,
    pub failed_files: Vec<FailedFile>,
    pub parse: ParseStats,
    pub unify: UnifyReport,
    pub filter: FilterReport,
    pub dataset: DatasetSummary,
    pub correlation: Option<TemperaturePrecipitationCorrelation>,
    pub outputs: Vec<PathBuf>,
}

impl RunSummary {
    fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            started_at: Local::now(),
            elapsed_seconds: 0.0,
            inputs,
            files_read: 0,
            failed_files: Vec::new(),
            parse: ParseStats::default(),
            unify: UnifyReport::default(),
            filter: FilterReport::default(),
            dataset: DatasetSummary::default(),
            correlation: None,
            outputs: Vec::new(),
        }
    }
}

/// Read, unified and filtered data, ready for aggregation.
pub struct PreparedData {
    pub unified: Vec<CanonicalRow>,
    pub dataset: CleanedDataset,
    pub summary: RunSummary,
}

/// Drives the pipeline stages in order: read, unify, filter, aggregate.
pub struct PipelineRunner {
    config: PipelineConfig,
    quiet: bool,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            quiet: false,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read every station file, unify and filter.
    pub async fn prepare(&self) -> Result<PreparedData> {
        let started = Instant::now();
        let mut summary = RunSummary::new(self.config.input_dirs.clone());

        let files = ConcurrentReader::discover_station_files(&self.config.input_dirs)?;
        let progress = Arc::new(ProgressReporter::new(
            files.len() as u64,
            "Reading station files...",
            self.quiet,
        ));

        let reader = ConcurrentReader::new(self.config.max_workers).with_mmap(self.config.use_mmap);
        let task_progress = progress.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            reader.read_all(&files, Some(task_progress.as_ref()))
        })
        .await??;

        summary.files_read = outcome.files_read();
        summary.parse = outcome.stats.clone();
        summary.failed_files = outcome.failed_files.clone();

        let unifier = Unifier::new();
        let (unified, unify_report) = unifier.unify(outcome.files);
        info!(
            "Unified {} rows into {} ({} duplicates replaced)",
            unify_report.input_rows, unify_report.output_rows, unify_report.duplicates_replaced
        );
        summary.unify = unify_report;

        let (dataset, filter_report) = self.filter(unified.clone());
        summary.filter = filter_report;
        summary.dataset = DatasetSummary::of(&dataset);
        summary.elapsed_seconds = started.elapsed().as_secs_f64();

        Ok(PreparedData {
            unified,
            dataset,
            summary,
        })
    }

    fn filter(&self, rows: Vec<CanonicalRow>) -> (CleanedDataset, FilterReport) {
        let filter = QualityFilter::from_config(&self.config);
        let (dataset, report) = filter.filter(rows);
        info!(
            "Quality filter kept {} of {} rows",
            report.kept_rows, report.total_rows
        );
        debug!("{}", filter.generate_summary(&report));
        (dataset, report)
    }

    /// Prepare without writing anything. An input that filters down to
    /// nothing is fatal here as it is for a full run.
    pub async fn validate(&self) -> Result<PreparedData> {
        let prepared = self.prepare().await?;
        ensure_not_empty(&prepared.dataset)?;
        Ok(prepared)
    }

    /// Full run: every output file plus `summary.json`.
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let prepared = self.prepare().await?;
        let mut summary = prepared.summary;
        ensure_not_empty(&prepared.dataset)?;

        self.ensure_output_dir()?;
        let csv = CsvWriter::new();

        let unified_path = self.config.output_path(UNIFIED_CSV);
        csv.write_rows(&prepared.unified, &unified_path)?;
        summary.outputs.push(unified_path);
        drop(prepared.unified);

        let cleaned_path = self.config.output_path(CLEANED_CSV);
        csv.write_rows(prepared.dataset.rows(), &cleaned_path)?;
        summary.outputs.push(cleaned_path);

        if self.config.write_parquet {
            let parquet_path = self.config.output_path(CLEANED_PARQUET);
            ParquetWriter::new()
                .with_compression(&self.config.parquet_compression)?
                .write_rows(prepared.dataset.rows(), &parquet_path)?;
            summary.outputs.push(parquet_path);
        }

        let results = self.aggregate(prepared.dataset).await?;
        self.finish(&results, &mut summary, started)?;

        Ok(summary)
    }

    /// Aggregate a previously written cleaned CSV. Unify and filter are
    /// re-applied; both leave an already cleaned file unchanged.
    pub async fn run_from_cleaned(&self, input: &Path) -> Result<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary::new(vec![input.to_path_buf()]);

        let dataset = self.read_cleaned(input, &mut summary)?;

        self.ensure_output_dir()?;
        let results = self.aggregate(dataset).await?;
        self.finish(&results, &mut summary, started)?;

        Ok(summary)
    }

    /// Rebuild a cleaned dataset from a canonical-row CSV, recording each
    /// stage in `summary`.
    fn read_cleaned(&self, input: &Path, summary: &mut RunSummary) -> Result<CleanedDataset> {
        if !input.is_file() {
            return Err(ProcessingError::MissingInput(input.to_path_buf()));
        }

        let file = CsvWriter::new().read_rows(input)?;
        if file.stats.malformed_lines > 0 {
            info!(
                "Skipped {} malformed lines in {}",
                file.stats.malformed_lines,
                input.display()
            );
        }
        summary.files_read = 1;
        summary.parse = file.stats;

        let (unified, unify_report) = Unifier::new().unify_rows(file.rows);
        summary.unify = unify_report;

        let (dataset, filter_report) = self.filter(unified);
        summary.filter = filter_report;
        summary.dataset = DatasetSummary::of(&dataset);

        Ok(dataset)
    }

    async fn aggregate(&self, dataset: CleanedDataset) -> Result<AggregateResults> {
        ensure_not_empty(&dataset)?;

        let spinner = ProgressReporter::new_spinner("Computing aggregations...", self.quiet);
        let aggregator = Aggregator::from_config(&self.config);
        let results = aggregator.aggregate(Arc::new(dataset)).await?;
        spinner.finish_with_message("Aggregations complete");

        debug!("{}", aggregator.generate_summary(&results));
        Ok(results)
    }

    fn finish(
        &self,
        results: &AggregateResults,
        summary: &mut RunSummary,
        started: Instant,
    ) -> Result<()> {
        let tables = CsvWriter::new().write_results(results, &self.config.output_dir)?;
        info!(
            "Wrote {} result tables to {}",
            tables.len(),
            self.config.output_dir.display()
        );
        summary.outputs.extend(tables);
        summary.correlation = Some(results.trend.correlation.clone());

        let summary_path = self.config.output_path(SUMMARY_JSON);
        summary.outputs.push(summary_path.clone());
        summary.elapsed_seconds = started.elapsed().as_secs_f64();
        write_json(&*summary, &summary_path)?;

        Ok(())
    }

    /// Draw the configured sample from a cleaned CSV. The rows are unified
    /// and filtered first, so only a valid cleaned dataset is sampled.
    pub fn sample_file(&self, input: &Path, output: &Path) -> Result<usize> {
        let sampler = Sampler::from_config(&self.config)?;
        let mut summary = RunSummary::new(vec![input.to_path_buf()]);

        let dataset = self.read_cleaned(input, &mut summary)?;
        ensure_not_empty(&dataset)?;

        let sample = sampler.sample(&dataset);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        CsvWriter::new().write_rows(&sample, output)?;

        info!(
            "Sampled {} of {} cleaned rows ({} read) into {}",
            sample.len(),
            dataset.len(),
            summary.parse.rows_emitted,
            output.display()
        );
        Ok(sample.len())
    }

    fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        Ok(())
    }

    pub fn generate_summary(&self, summary: &RunSummary) -> String {
        let mut text = String::new();

        text.push_str("=== Run Summary ===\n");
        text.push_str(&format!(
            "Files Read: {} ({} failed)\n",
            summary.files_read,
            summary.failed_files.len()
        ));
        text.push_str(&format!(
            "Lines Read: {} ({} malformed)\n",
            summary.parse.lines_read, summary.parse.malformed_lines
        ));
        text.push_str(&format!(
            "Rows Emitted: {} ({} missing values, {} non-canonical skipped)\n",
            summary.parse.rows_emitted, summary.parse.missing_values, summary.parse.skipped_elements
        ));
        text.push('\n');
        text.push_str(&Unifier::new().generate_summary(&summary.unify));
        text.push('\n');
        text.push_str(&QualityFilter::from_config(&self.config).generate_summary(&summary.filter));

        text.push_str(&format!(
            "\nCleaned Dataset: {} rows from {} stations",
            summary.dataset.rows, summary.dataset.stations
        ));
        if let (Some(first), Some(last)) = (summary.dataset.first_date, summary.dataset.last_date) {
            text.push_str(&format!(", {} to {}", first, last));
        }
        text.push('\n');

        if let Some(correlation) = &summary.correlation {
            match (correlation.coefficient.value(), correlation.strength) {
                (Some(r), Some(strength)) => text.push_str(&format!(
                    "Temperature/Precipitation Correlation: {:.3} ({:?})\n",
                    r, strength
                )),
                _ => text.push_str("Temperature/Precipitation Correlation: insufficient data\n"),
            }
        }

        text
    }
}

fn ensure_not_empty(dataset: &CleanedDataset) -> Result<()> {
    if dataset.is_empty() {
        return Err(ProcessingError::EmptyDataset {
            stage: "quality filtering".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::quality_filter::DropReason;
    use crate::utils::constants::MONTHLY_MEAN_TEMP_CSV;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn config(input: &Path, output: &Path) -> PipelineConfig {
        PipelineConfig {
            input_dirs: vec![input.to_path_buf()],
            output_dir: output.to_path_buf(),
            max_workers: 2,
            min_trend_years: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_prepare_counts_every_stage() -> Result<()> {
        let input = TempDir::new()?;
        let output = TempDir::new()?;
        fs::write(
            input.path().join("s1.csv"),
            "STATION,DATE,PRCP,TMAX,TMIN\n\
             S1,2020-01-01,10,100,-9999\n\
             S1,2020-01-02,-5,900,20\n\
             bad row\n",
        )?;

        let runner = PipelineRunner::new(config(input.path(), output.path())).with_quiet(true);
        let prepared = runner.prepare().await?;

        assert_eq!(prepared.summary.files_read, 1);
        assert_eq!(prepared.summary.parse.malformed_lines, 1);
        assert_eq!(prepared.unified.len(), 6);
        assert_eq!(prepared.dataset.len(), 3);
        assert_eq!(prepared.summary.filter.dropped_rows, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_everything_filtered_is_fatal() -> Result<()> {
        let input = TempDir::new()?;
        let output = TempDir::new()?;
        fs::write(input.path().join("s1.csv"), "STATION,DATE,TMAX\nS1,2020-01-01,\n")?;

        let runner = PipelineRunner::new(config(input.path(), output.path())).with_quiet(true);
        let result = runner.run().await;

        assert!(matches!(result, Err(ProcessingError::EmptyDataset { .. })));

        let validated = runner.validate().await;
        assert!(matches!(validated, Err(ProcessingError::EmptyDataset { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_returns_prepared_data() -> Result<()> {
        let input = TempDir::new()?;
        let output = TempDir::new()?;
        fs::write(input.path().join("s1.csv"), "STATION,DATE,TMAX\nS1,2020-01-01,100\n")?;

        let runner = PipelineRunner::new(config(input.path(), output.path())).with_quiet(true);
        let prepared = runner.validate().await?;

        assert_eq!(prepared.dataset.len(), 1);
        assert!(!output.path().join(CLEANED_CSV).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_skips_bad_cleaned_rows() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("cleaned.csv");
        fs::write(
            &input,
            "station_id,date,element,value\n\
             S1,2020-02-28,TMAX,10\n\
             S1,2020-02-30,TMAX,99\n\
             S1,2020-03-01,TMAX,NaN\n\
             S1,2020-03-02,TMAX,inf\n\
             S1,2020-03-03,TMAX,20\n",
        )?;

        let runner = PipelineRunner::new(config(dir.path(), &dir.path().join("out"))).with_quiet(true);
        let summary = runner.run_from_cleaned(&input).await?;

        assert_eq!(summary.parse.malformed_lines, 1);
        assert_eq!(summary.filter.count(DropReason::NonFiniteValue), 2);
        assert_eq!(summary.dataset.rows, 2);

        let monthly = fs::read_to_string(dir.path().join("out").join(MONTHLY_MEAN_TEMP_CSV))?;
        assert!(!monthly.contains("NaN"));
        assert!(monthly.contains("S1,2020,2,10.0000,"));
        assert!(monthly.contains("S1,2020,3,20.0000,"));

        Ok(())
    }

    #[test]
    fn test_sample_file() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("cleaned.csv");
        let output = dir.path().join("nested").join("sample.csv");

        let mut content = String::from("station_id,date,element,value\n");
        for day in 1..=20 {
            content.push_str(&format!("S1,2020-01-{:02},TMAX,{}\n", day, day));
        }
        fs::write(&input, content)?;

        let runner = PipelineRunner::new(PipelineConfig {
            sample_fraction: 0.25,
            ..Default::default()
        });

        assert_eq!(runner.sample_file(&input, &output)?, 5);
        let first = fs::read_to_string(&output)?;
        runner.sample_file(&input, &output)?;
        assert_eq!(fs::read_to_string(&output)?, first);

        Ok(())
    }

    #[test]
    fn test_sample_file_only_draws_cleaned_rows() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("unified.csv");
        let output = dir.path().join("sample.csv");

        // Absent values, an implausible reading and a duplicated key
        fs::write(
            &input,
            "station_id,date,element,value\n\
             S1,2020-01-01,TMAX,\n\
             S1,2020-01-02,TMAX,75\n\
             S1,2020-01-03,TMAX,5\n\
             S1,2020-01-03,TMAX,6\n\
             S1,2020-01-04,PRCP,\n",
        )?;

        let runner = PipelineRunner::new(PipelineConfig {
            sample_fraction: 1.0,
            ..Default::default()
        });

        assert_eq!(runner.sample_file(&input, &output)?, 1);
        assert_eq!(
            fs::read_to_string(&output)?,
            "station_id,date,element,value\nS1,2020-01-03,TMAX,6\n"
        );

        fs::write(&input, "station_id,date,element,value\nS1,2020-01-01,TMAX,\n")?;
        assert!(matches!(
            runner.sample_file(&input, &output),
            Err(ProcessingError::EmptyDataset { .. })
        ));

        Ok(())
    }
}
