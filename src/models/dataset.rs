use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::models::CanonicalRow;

/// Deduplicated, filtered and sorted observations.
///
/// Only the quality filter constructs this type, so every row has a value,
/// passes the configured range checks, and keys are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanedDataset {
    rows: Vec<CanonicalRow>,
}

impl CleanedDataset {
    pub(crate) fn from_filtered(rows: Vec<CanonicalRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CanonicalRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalRow> {
        self.rows.iter()
    }

    pub fn stations(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.station_id.as_str()).collect()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.date).min()?;
        let max = self.rows.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    pub fn summary(&self) -> String {
        match self.date_range() {
            Some((start, end)) => format!(
                "{} observations from {} stations, {} to {}",
                self.len(),
                self.stations().len(),
                start,
                end
            ),
            None => "Empty dataset".to_string(),
        }
    }
}
