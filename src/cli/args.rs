use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghcn-processor")]
#[command(about = "Cleaning and aggregation pipeline for NOAA GHCN-Daily station records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, conflicts_with = "verbose", help = "Only log warnings and hide progress")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read, unify, clean and aggregate station files
    Process {
        #[arg(
            short,
            long = "input-dir",
            help = "Station file directory, lowest precedence first (repeatable)"
        )]
        input_dirs: Vec<PathBuf>,

        #[arg(short, long, help = "Output directory for CSV, JSON and Parquet files")]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long, help = "Also export cleaned.parquet")]
        parquet: bool,

        #[arg(long, help = "Memory-map station files")]
        mmap: bool,
    },

    /// Read, unify and filter without writing anything
    Validate {
        #[arg(short, long = "input-dir")]
        input_dirs: Vec<PathBuf>,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Aggregate a previously written cleaned CSV
    Aggregate {
        #[arg(short, long, help = "Cleaned CSV (station_id,date,element,value)")]
        input: PathBuf,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Draw a deterministic random sample from a cleaned CSV
    Sample {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Sample CSV path [default: <output_dir>/ghcn-sample-{YYMMDD}.csv]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Fraction of rows to keep, in (0, 1]")]
        fraction: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Display information about a cleaned Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}
