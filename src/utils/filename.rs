use chrono::{Datelike, Local, NaiveDate};
use std::path::{Path, PathBuf};

/// Sample file name with format: ghcn-sample-{YYMMDD}.csv
pub fn sample_filename_for(date: NaiveDate) -> String {
    format!(
        "ghcn-sample-{:02}{:02}{:02}.csv",
        date.year() % 100,
        date.month(),
        date.day()
    )
}

/// Default sample output path under `output_dir`, dated today.
pub fn generate_default_sample_filename(output_dir: &Path) -> PathBuf {
    output_dir.join(sample_filename_for(Local::now().date_naive()))
}
