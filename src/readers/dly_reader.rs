//! GHCN-Daily fixed-width `.dly` records.
//!
//! Each line holds one station/month/element with 31 day slots:
//!
//! ```text
//! ID          YEAR MO ELEM  VALUE1 M1 Q1 S1  VALUE2 ...
//! 0..11       11..15 15..17 17..21  21..26 26 27 28
//! ```

use chrono::NaiveDate;

use crate::error::{ProcessingError, Result};
use crate::models::RawRecord;
use crate::utils::constants::{
    DLY_DAYS, DLY_DAY_WIDTH, DLY_ELEMENT_END, DLY_ID_END, DLY_LINE_LENGTH, DLY_MONTH_END,
    DLY_VALUE_WIDTH, DLY_YEAR_END, MISSING_VALUE,
};

/// Parse one `.dly` line into raw records, one per day slot that exists in
/// the month. Sentinel values are kept as sentinels; unit conversion happens
/// in the normalizer.
pub fn parse_dly_line(line: &str) -> Result<Vec<RawRecord>> {
    let line = line.trim_end_matches(['\r', '\n']);

    if !line.is_ascii() {
        return Err(ProcessingError::MalformedRecord(
            "non-ASCII characters in fixed-width line".to_string(),
        ));
    }

    if line.len() < DLY_LINE_LENGTH {
        return Err(ProcessingError::MalformedRecord(format!(
            "line has {} characters, expected {}",
            line.len(),
            DLY_LINE_LENGTH
        )));
    }

    let station_id = line[..DLY_ID_END].trim();
    if station_id.is_empty() {
        return Err(ProcessingError::MalformedRecord("empty station id".to_string()));
    }

    let year: i32 = parse_field(&line[DLY_ID_END..DLY_YEAR_END], "year")?;
    let month: u32 = parse_field(&line[DLY_YEAR_END..DLY_MONTH_END], "month")?;
    let element = line[DLY_MONTH_END..DLY_ELEMENT_END].trim();

    if !(1..=12).contains(&month) {
        return Err(ProcessingError::MalformedRecord(format!("invalid month {}", month)));
    }

    let mut records = Vec::with_capacity(DLY_DAYS);

    for day in 1..=DLY_DAYS {
        let start = DLY_ELEMENT_END + (day - 1) * DLY_DAY_WIDTH;
        let slot = &line[start..start + DLY_DAY_WIDTH];

        let raw_value: i32 = parse_field(&slot[..DLY_VALUE_WIDTH], "value")?;

        let date = match NaiveDate::from_ymd_opt(year, month, day as u32) {
            Some(date) => date,
            // Slots past the end of the month are padded with the sentinel
            None if raw_value == MISSING_VALUE => continue,
            None => {
                return Err(ProcessingError::MalformedRecord(format!(
                    "value {} on non-existent date {}-{:02}-{:02}",
                    raw_value, year, month, day
                )))
            }
        };

        let flags: Vec<Option<char>> = slot[DLY_VALUE_WIDTH..].chars().map(flag).collect();

        records.push(
            RawRecord::new(station_id.to_string(), date, element.to_string(), raw_value)
                .with_flags(flags[0], flags[1], flags[2]),
        );
    }

    Ok(records)
}

fn parse_field<T: std::str::FromStr>(field: &str, name: &str) -> Result<T> {
    field.trim().parse::<T>().map_err(|_| {
        ProcessingError::MalformedRecord(format!("invalid {}: '{}'", name, field.trim()))
    })
}

/// Blank flag columns mean "no flag".
pub(crate) fn flag(c: char) -> Option<char> {
    if c.is_whitespace() {
        None
    } else {
        Some(c)
    }
}
