use serde::Serialize;
use std::path::PathBuf;

use crate::models::{CanonicalRow, Element, RawRecord};

/// Per-file (or merged) counters from parsing and normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines_read: usize,
    pub malformed_lines: usize,
    pub skipped_elements: usize,
    pub missing_values: usize,
    pub rows_emitted: usize,
}

impl ParseStats {
    pub fn merge(&mut self, other: &ParseStats) {
        self.lines_read += other.lines_read;
        self.malformed_lines += other.malformed_lines;
        self.skipped_elements += other.skipped_elements;
        self.missing_values += other.missing_values;
        self.rows_emitted += other.rows_emitted;
    }
}

/// Canonical rows read from one station file.
#[derive(Debug, Clone)]
pub struct NormalizedFile {
    pub path: PathBuf,
    pub rows: Vec<CanonicalRow>,
    pub stats: ParseStats,
}

/// Converts raw station records into canonical rows in physical units.
#[derive(Debug, Default, Clone)]
pub struct Normalizer {
    stats: ParseStats,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw record. Returns `None` for elements outside the
    /// canonical set. Sentinels become an absent value.
    pub fn normalize(&mut self, raw: RawRecord) -> Option<CanonicalRow> {
        let Some(element) = Element::from_code(&raw.element_code) else {
            self.stats.skipped_elements += 1;
            return None;
        };

        let value = if raw.is_missing() {
            self.stats.missing_values += 1;
            None
        } else {
            Some(element.to_physical(raw.raw_value))
        };

        self.stats.rows_emitted += 1;

        Some(CanonicalRow {
            station_id: raw.station_id,
            date: raw.date,
            element,
            value,
            quality_flag: raw.quality_flag,
        })
    }

    /// Normalize the records of one parsed line.
    pub fn normalize_line(&mut self, raw: Vec<RawRecord>, out: &mut Vec<CanonicalRow>) {
        self.stats.lines_read += 1;
        out.extend(raw.into_iter().filter_map(|r| self.normalize(r)));
    }

    pub fn record_malformed(&mut self) {
        self.stats.lines_read += 1;
        self.stats.malformed_lines += 1;
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    pub fn into_stats(self) -> ParseStats {
        self.stats
    }
}
