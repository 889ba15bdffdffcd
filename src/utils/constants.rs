/// GHCN missing-value sentinel (raw tenths)
pub const MISSING_VALUE: i32 = -9999;

/// Station file extensions
pub const DLY_EXTENSION: &str = "dly";
pub const CSV_EXTENSION: &str = "csv";

/// GHCN-Daily fixed-width layout (0-based byte offsets)
pub const DLY_ID_END: usize = 11;
pub const DLY_YEAR_END: usize = 15;
pub const DLY_MONTH_END: usize = 17;
pub const DLY_ELEMENT_END: usize = 21;
pub const DLY_DAYS: usize = 31;
pub const DLY_DAY_WIDTH: usize = 8;
pub const DLY_VALUE_WIDTH: usize = 5;
pub const DLY_LINE_LENGTH: usize = DLY_ELEMENT_END + DLY_DAYS * DLY_DAY_WIDTH;

/// NOAA per-station CSV columns
pub const CSV_STATION_COLUMN: &str = "STATION";
pub const CSV_DATE_COLUMN: &str = "DATE";
pub const CSV_ATTRIBUTES_SUFFIX: &str = "_ATTRIBUTES";
pub const CSV_DATE_FORMAT: &str = "%Y-%m-%d";

/// Physical plausibility defaults
pub const MIN_VALID_TEMP: f64 = -90.0;
pub const MAX_VALID_TEMP: f64 = 60.0;
pub const MAX_VALID_PRECIP: f64 = 2000.0;

/// Historical window default start
pub const DEFAULT_VALID_FROM: &str = "1800-01-01";

/// Aggregation defaults
pub const DEFAULT_MIN_PRECIP_DAYS: usize = 300;
pub const DEFAULT_MIN_TREND_YEARS: usize = 10;

/// Sampling defaults
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.05;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Output file names
pub const UNIFIED_CSV: &str = "unified.csv";
pub const CLEANED_CSV: &str = "cleaned.csv";
pub const CLEANED_PARQUET: &str = "cleaned.parquet";
pub const SUMMARY_JSON: &str = "summary.json";
pub const MONTHLY_MEAN_TEMP_CSV: &str = "monthly_mean_temp.csv";
pub const MONTHLY_CLIMATOLOGY_CSV: &str = "monthly_climatology.csv";
pub const ANNUAL_PRECIP_CSV: &str = "annual_precip.csv";
pub const PRECIP_VARIABILITY_CSV: &str = "precip_variability.csv";
pub const EXTREMES_CSV: &str = "extremes.csv";
pub const SEASONAL_CSV: &str = "seasonal.csv";
pub const SEASONAL_DELTAS_CSV: &str = "seasonal_deltas.csv";
pub const TREND_CSV: &str = "trend.csv";
pub const ANNUAL_SERIES_CSV: &str = "annual_series.csv";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
