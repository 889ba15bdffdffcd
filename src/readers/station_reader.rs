use crate::error::{ProcessingError, Result};
use crate::models::CanonicalRow;
use crate::processors::normalizer::{NormalizedFile, Normalizer};
use crate::readers::dly_reader::parse_dly_line;
use crate::readers::noaa_csv_reader::NoaaCsvLayout;
use crate::utils::constants::{CSV_EXTENSION, DEFAULT_BUFFER_SIZE, DLY_EXTENSION};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Station file formats understood by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationFileFormat {
    /// GHCN-Daily fixed-width, one element-month per line
    Dly,
    /// NOAA per-station CSV, one day per row
    Csv,
}

impl StationFileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            DLY_EXTENSION => Some(StationFileFormat::Dly),
            CSV_EXTENSION => Some(StationFileFormat::Csv),
            _ => None,
        }
    }
}

/// Reads one station file into canonical rows. Malformed lines are counted
/// and skipped; only I/O failures and unusable headers fail the whole file.
pub struct StationReader {
    use_mmap: bool,
}

impl StationReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    pub fn read_station_file(&self, path: &Path) -> Result<NormalizedFile> {
        let format = StationFileFormat::from_path(path).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("Unsupported station file: {}", path.display()))
        })?;

        let file = File::open(path)?;
        let mut normalizer = Normalizer::new();

        let rows = if self.use_mmap {
            // Safety: the file is opened read-only and not modified while mapped
            let mmap = unsafe { Mmap::map(&file)? };
            match format {
                StationFileFormat::Dly => {
                    let content = std::str::from_utf8(&mmap).map_err(|e| {
                        ProcessingError::InvalidFormat(format!("Invalid UTF-8: {}", e))
                    })?;
                    read_dly(content.lines().map(|l| Ok(l.to_string())), &mut normalizer)?
                }
                StationFileFormat::Csv => read_csv(&mmap[..], &mut normalizer)?,
            }
        } else {
            let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
            match format {
                StationFileFormat::Dly => read_dly(reader.lines(), &mut normalizer)?,
                StationFileFormat::Csv => read_csv(reader, &mut normalizer)?,
            }
        };

        let stats = normalizer.into_stats();
        debug!(
            "Read {}: {} rows, {} malformed lines",
            path.display(),
            rows.len(),
            stats.malformed_lines
        );

        Ok(NormalizedFile {
            path: path.to_path_buf(),
            rows,
            stats,
        })
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_dly<I>(lines: I, normalizer: &mut Normalizer) -> Result<Vec<CanonicalRow>>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let mut rows = Vec::new();

    for line in lines {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        match parse_dly_line(&line) {
            Ok(records) => normalizer.normalize_line(records, &mut rows),
            Err(_) => normalizer.record_malformed(),
        }
    }

    Ok(rows)
}

fn read_csv<R: Read>(source: R, normalizer: &mut Normalizer) -> Result<Vec<CanonicalRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(source);

    let layout = NoaaCsvLayout::from_headers(reader.headers()?)?;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(_) => {
                normalizer.record_malformed();
                continue;
            }
        };

        match layout.parse_record(&record) {
            Ok(records) => normalizer.normalize_line(records, &mut rows),
            Err(_) => normalizer.record_malformed(),
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Element;
    use std::io::Write;

    fn dly_line(id: &str, year: i32, month: u32, element: &str, values: &[i32]) -> String {
        let mut line = format!("{:<11}{:04}{:02}{:<4}", id, year, month, element);
        for day in 0..31 {
            let value = values.get(day).copied().unwrap_or(-9999);
            line.push_str(&format!("{:>5}   ", value));
        }
        line
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            StationFileFormat::from_path(Path::new("USW00094728.dly")),
            Some(StationFileFormat::Dly)
        );
        assert_eq!(
            StationFileFormat::from_path(Path::new("USW00094728.CSV")),
            Some(StationFileFormat::Csv)
        );
        assert_eq!(StationFileFormat::from_path(Path::new("readme.txt")), None);
    }

    #[test]
    fn test_read_dly_file_skips_malformed() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".dly").tempfile()?;
        writeln!(file, "{}", dly_line("S1", 2020, 1, "TMAX", &[100, 120, 140]))?;
        writeln!(file, "garbage line")?;
        writeln!(file)?;
        writeln!(file, "{}", dly_line("S1", 2020, 1, "SNWD", &[10]))?;

        for use_mmap in [false, true] {
            let reader = StationReader::with_mmap(use_mmap);
            let normalized = reader.read_station_file(file.path())?;

            assert_eq!(normalized.rows.len(), 31);
            assert_eq!(normalized.rows[0].value, Some(10.0));
            assert_eq!(normalized.rows[2].value, Some(14.0));
            assert_eq!(normalized.rows[3].value, None);
            assert_eq!(normalized.stats.lines_read, 3);
            assert_eq!(normalized.stats.malformed_lines, 1);
            assert_eq!(normalized.stats.skipped_elements, 31);
        }

        Ok(())
    }

    #[test]
    fn test_read_csv_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        writeln!(file, "\"STATION\",\"DATE\",\"PRCP\",\"PRCP_ATTRIBUTES\",\"TMAX\",\"TMIN\"")?;
        writeln!(file, "\"S1\",\"2020-01-01\",\"25\",\",,W,\",\"100\",\"-20\"")?;
        writeln!(file, "\"S1\",\"2020-01-02\",\"\",\"\",\"110\"")?;
        writeln!(file, "\"S1\",\"not-a-date\",\"0\",\"\",\"110\",\"0\"")?;

        let reader = StationReader::new();
        let normalized = reader.read_station_file(file.path())?;

        assert_eq!(normalized.rows.len(), 3);
        assert_eq!(normalized.rows[0].element, Element::Precipitation);
        assert_eq!(normalized.rows[0].value, Some(2.5));
        assert_eq!(normalized.rows[2].value, Some(-2.0));
        assert_eq!(normalized.stats.malformed_lines, 2);

        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let reader = StationReader::new();
        assert!(reader
            .read_station_file(Path::new("/nonexistent/S1.dly"))
            .is_err());
    }
}
