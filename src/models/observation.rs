use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Element;
use crate::utils::constants::MISSING_VALUE;

/// One observation as it appears in a station file, before unit conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub station_id: String,
    pub date: NaiveDate,
    pub element_code: String,
    pub raw_value: i32,
    pub measurement_flag: Option<char>,
    pub quality_flag: Option<char>,
    pub source_flag: Option<char>,
}

impl RawRecord {
    pub fn new(station_id: String, date: NaiveDate, element_code: String, raw_value: i32) -> Self {
        Self {
            station_id,
            date,
            element_code,
            raw_value,
            measurement_flag: None,
            quality_flag: None,
            source_flag: None,
        }
    }

    pub fn with_flags(
        mut self,
        measurement_flag: Option<char>,
        quality_flag: Option<char>,
        source_flag: Option<char>,
    ) -> Self {
        self.measurement_flag = measurement_flag;
        self.quality_flag = quality_flag;
        self.source_flag = source_flag;
        self
    }

    pub fn is_missing(&self) -> bool {
        self.raw_value == MISSING_VALUE
    }
}

/// Normalized observation in physical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub station_id: String,
    pub date: NaiveDate,
    pub element: Element,
    /// `None` when the source carried the missing-value sentinel.
    pub value: Option<f64>,
    /// NOAA QFLAG; `None` means the observation passed NOAA's checks.
    pub quality_flag: Option<char>,
}

/// Identity of an observation: at most one row per key survives unification.
pub type RowKey = (String, NaiveDate, Element);

impl CanonicalRow {
    pub fn new(station_id: impl Into<String>, date: NaiveDate, element: Element, value: Option<f64>) -> Self {
        Self {
            station_id: station_id.into(),
            date,
            element,
            value,
            quality_flag: None,
        }
    }

    pub fn key(&self) -> RowKey {
        (self.station_id.clone(), self.date, self.element)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn is_flagged(&self) -> bool {
        self.quality_flag.is_some()
    }

    /// Ordering used for every sorted dataset: station, date, element.
    pub fn sort_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.station_id
            .cmp(&other.station_id)
            .then_with(|| self.date.cmp(&other.date))
            .then_with(|| self.element.cmp(&other.element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_missing() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let record = RawRecord::new("S1".to_string(), date, "TMAX".to_string(), MISSING_VALUE);
        assert!(record.is_missing());

        let record = record.with_flags(None, Some('I'), Some('7'));
        assert_eq!(record.quality_flag, Some('I'));
    }

    #[test]
    fn test_canonical_row_ordering() {
        let d1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();

        let a = CanonicalRow::new("S1", d2, Element::Precipitation, Some(1.0));
        let b = CanonicalRow::new("S1", d1, Element::MinTemperature, Some(1.0));
        let c = CanonicalRow::new("S0", d2, Element::MaxTemperature, Some(1.0));

        let mut rows = vec![a.clone(), b.clone(), c.clone()];
        rows.sort_by(|x, y| x.sort_cmp(y));
        assert_eq!(rows, vec![c, b, a]);
    }

    #[test]
    fn test_date_accessors() {
        let row = CanonicalRow::new(
            "S1",
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
            Element::MaxTemperature,
            Some(3.5),
        );
        assert_eq!((row.year(), row.month(), row.day()), (2019, 12, 31));
        assert!(!row.is_flagged());
    }
}
