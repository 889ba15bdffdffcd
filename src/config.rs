use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_MIN_PRECIP_DAYS, DEFAULT_MIN_TREND_YEARS, DEFAULT_SAMPLE_FRACTION,
    DEFAULT_SAMPLE_SEED, DEFAULT_VALID_FROM, MAX_VALID_PRECIP, MAX_VALID_TEMP, MIN_VALID_TEMP,
};

/// Environment variable prefix, e.g. `GHCN_MIN_TREND_YEARS=15`.
pub const ENV_PREFIX: &str = "GHCN";

/// Every tunable of a pipeline run. Passed explicitly into each stage.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_ranges"))]
pub struct PipelineConfig {
    /// Station file directories, lowest precedence first.
    #[validate(length(min = 1))]
    pub input_dirs: Vec<PathBuf>,

    pub output_dir: PathBuf,

    /// Inclusive start of the historical window.
    pub valid_from: NaiveDate,

    /// Inclusive end of the historical window; today when unset.
    pub valid_to: Option<NaiveDate>,

    pub min_temperature_c: f64,
    pub max_temperature_c: f64,

    #[validate(range(min = 0.0))]
    pub max_precipitation_mm: f64,

    pub reject_quality_flagged: bool,

    #[validate(range(min = 1, max = 366))]
    pub min_precip_days_per_year: usize,

    #[validate(range(min = 2))]
    pub min_trend_years: usize,

    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub sample_fraction: f64,

    pub sample_seed: u64,

    #[validate(range(min = 1))]
    pub max_workers: usize,

    pub use_mmap: bool,
    pub write_parquet: bool,

    /// snappy, gzip, lz4, zstd or none
    pub parquet_compression: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dirs: vec![PathBuf::from("data")],
            output_dir: PathBuf::from("output"),
            valid_from: NaiveDate::parse_from_str(DEFAULT_VALID_FROM, "%Y-%m-%d")
                .unwrap_or(NaiveDate::MIN),
            valid_to: None,
            min_temperature_c: MIN_VALID_TEMP,
            max_temperature_c: MAX_VALID_TEMP,
            max_precipitation_mm: MAX_VALID_PRECIP,
            reject_quality_flagged: false,
            min_precip_days_per_year: DEFAULT_MIN_PRECIP_DAYS,
            min_trend_years: DEFAULT_MIN_TREND_YEARS,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            sample_seed: DEFAULT_SAMPLE_SEED,
            max_workers: num_cpus::get(),
            use_mmap: false,
            write_parquet: false,
            parquet_compression: COMPRESSION_SNAPPY.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Layer built-in defaults, an optional TOML file and `GHCN_*`
    /// environment variables, then validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.validated()
    }

    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn effective_valid_to(&self) -> NaiveDate {
        self.valid_to.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

fn validate_ranges(config: &PipelineConfig) -> std::result::Result<(), ValidationError> {
    if config.min_temperature_c >= config.max_temperature_c {
        let mut err = ValidationError::new("temperature_range");
        err.message = Some("min_temperature_c must be below max_temperature_c".into());
        return Err(err);
    }

    if config.valid_from > config.effective_valid_to() {
        let mut err = ValidationError::new("date_window");
        err.message = Some("valid_from must not be after valid_to".into());
        return Err(err);
    }

    let codecs = [
        COMPRESSION_SNAPPY,
        COMPRESSION_GZIP,
        COMPRESSION_LZ4,
        COMPRESSION_ZSTD,
        COMPRESSION_NONE,
    ];
    if !codecs.contains(&config.parquet_compression.to_lowercase().as_str()) {
        let mut err = ValidationError::new("parquet_compression");
        err.message = Some(format!("unsupported compression {}", config.parquet_compression).into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_trend_years, DEFAULT_MIN_TREND_YEARS);
        assert_eq!(config.sample_seed, 42);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let config = PipelineConfig {
            min_temperature_c: 10.0,
            max_temperature_c: -10.0,
            ..Default::default()
        };
        assert!(config.validated().is_err());

        let config = PipelineConfig {
            sample_fraction: 0.0,
            ..Default::default()
        };
        assert!(config.validated().is_err());

        let config = PipelineConfig {
            min_trend_years: 1,
            ..Default::default()
        };
        assert!(config.validated().is_err());

        let config = PipelineConfig {
            input_dirs: vec![],
            ..Default::default()
        };
        assert!(config.validated().is_err());

        let config = PipelineConfig {
            parquet_compression: "brotli".to_string(),
            ..Default::default()
        };
        assert!(config.validated().is_err());

        let config = PipelineConfig {
            parquet_compression: "ZSTD".to_string(),
            ..Default::default()
        };
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_inverted_date_window_rejected() {
        let config = PipelineConfig {
            valid_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            valid_to: NaiveDate::from_ymd_opt(2010, 1, 1),
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_load_from_toml_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "input_dirs = [\"raw/pass1\", \"raw/pass2\"]")?;
        writeln!(file, "valid_from = \"1950-01-01\"")?;
        writeln!(file, "valid_to = \"2020-12-31\"")?;
        writeln!(file, "min_trend_years = 5")?;
        writeln!(file, "sample_fraction = 0.1")?;

        let config = PipelineConfig::load(Some(file.path()))?;

        assert_eq!(config.input_dirs.len(), 2);
        assert_eq!(config.valid_from, NaiveDate::from_ymd_opt(1950, 1, 1).unwrap());
        assert_eq!(config.effective_valid_to(), NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
        assert_eq!(config.min_trend_years, 5);
        assert_eq!(config.sample_fraction, 0.1);
        // untouched keys keep their defaults
        assert_eq!(config.max_temperature_c, MAX_VALID_TEMP);

        Ok(())
    }
}
