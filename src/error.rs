use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Input directory not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("No station files found in {0}")]
    NoStationFiles(String),

    #[error("Dataset is empty after {stage}; nothing to aggregate")]
    EmptyDataset { stage: String },

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
