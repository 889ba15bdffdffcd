use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::{ProcessingError, Result};
use crate::models::{Element, RawRecord};
use crate::readers::dly_reader::flag;
use crate::utils::constants::{
    CSV_ATTRIBUTES_SUFFIX, CSV_DATE_COLUMN, CSV_DATE_FORMAT, CSV_STATION_COLUMN, MISSING_VALUE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementColumn {
    code: &'static str,
    value: usize,
    attributes: Option<usize>,
}

/// Column positions of a NOAA per-station CSV file, resolved from its header.
///
/// Expected columns: `STATION`, `DATE` and any of `PRCP`, `TMAX`, `TMIN`, each
/// optionally followed by `<ELEMENT>_ATTRIBUTES` holding `mflag,qflag,sflag[,time]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoaaCsvLayout {
    width: usize,
    station: usize,
    date: usize,
    elements: Vec<ElementColumn>,
}

impl NoaaCsvLayout {
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

        let station = position(CSV_STATION_COLUMN).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("missing {} column", CSV_STATION_COLUMN))
        })?;
        let date = position(CSV_DATE_COLUMN).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("missing {} column", CSV_DATE_COLUMN))
        })?;

        let elements: Vec<ElementColumn> = Element::ALL
            .iter()
            .filter_map(|element| {
                let code = element.code();
                position(code).map(|value| ElementColumn {
                    code,
                    value,
                    attributes: position(&format!("{}{}", code, CSV_ATTRIBUTES_SUFFIX)),
                })
            })
            .collect();

        if elements.is_empty() {
            return Err(ProcessingError::InvalidFormat(
                "no PRCP, TMAX or TMIN column".to_string(),
            ));
        }

        Ok(Self {
            width: headers.len(),
            station,
            date,
            elements,
        })
    }

    /// Parse one CSV row into raw records, one per element column present.
    pub fn parse_record(&self, record: &StringRecord) -> Result<Vec<RawRecord>> {
        if record.len() != self.width {
            return Err(ProcessingError::MalformedRecord(format!(
                "row has {} fields, header has {}",
                record.len(),
                self.width
            )));
        }

        let station_id = record[self.station].trim();
        if station_id.is_empty() {
            return Err(ProcessingError::MalformedRecord("empty station id".to_string()));
        }

        let date_str = record[self.date].trim();
        let date = NaiveDate::parse_from_str(date_str, CSV_DATE_FORMAT).map_err(|_| {
            ProcessingError::MalformedRecord(format!("invalid date: '{}'", date_str))
        })?;

        let mut records = Vec::with_capacity(self.elements.len());

        for column in &self.elements {
            let cell = record[column.value].trim();
            let raw_value = if cell.is_empty() {
                MISSING_VALUE
            } else {
                cell.parse::<i32>().map_err(|_| {
                    ProcessingError::MalformedRecord(format!(
                        "invalid {} value: '{}'",
                        column.code, cell
                    ))
                })?
            };

            let (mflag, qflag, sflag) = column
                .attributes
                .map(|idx| parse_attributes(&record[idx]))
                .unwrap_or((None, None, None));

            records.push(
                RawRecord::new(station_id.to_string(), date, column.code.to_string(), raw_value)
                    .with_flags(mflag, qflag, sflag),
            );
        }

        Ok(records)
    }
}

/// Split `mflag,qflag,sflag[,time]` into its three flag characters.
fn parse_attributes(attributes: &str) -> (Option<char>, Option<char>, Option<char>) {
    let mut parts = attributes.split(',').map(|p| p.chars().next().and_then(flag));
    (
        parts.next().flatten(),
        parts.next().flatten(),
        parts.next().flatten(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> StringRecord {
        StringRecord::from(vec![
            "STATION",
            "DATE",
            "LATITUDE",
            "PRCP",
            "PRCP_ATTRIBUTES",
            "TMAX",
            "TMAX_ATTRIBUTES",
            "TMIN",
            "TMIN_ATTRIBUTES",
        ])
    }

    #[test]
    fn test_layout_from_headers() {
        let layout = NoaaCsvLayout::from_headers(&headers()).unwrap();
        assert_eq!(layout.station, 0);
        assert_eq!(layout.date, 1);
        assert_eq!(layout.elements.len(), 3);
        assert_eq!(layout.elements[0].attributes, Some(4));

        let no_elements = StringRecord::from(vec!["STATION", "DATE", "SNOW"]);
        assert!(NoaaCsvLayout::from_headers(&no_elements).is_err());
    }

    #[test]
    fn test_parse_record_with_attributes() {
        let layout = NoaaCsvLayout::from_headers(&headers()).unwrap();
        let row = StringRecord::from(vec![
            "USW00094728",
            "2020-01-15",
            "40.77",
            "53",
            "T,,W,2400",
            "128",
            ",I,W,",
            "",
            "",
        ]);

        let records = layout.parse_record(&row).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].element_code, "PRCP");
        assert_eq!(records[0].raw_value, 53);
        assert_eq!(records[0].measurement_flag, Some('T'));
        assert_eq!(records[0].quality_flag, None);
        assert_eq!(records[0].source_flag, Some('W'));

        assert_eq!(records[1].raw_value, 128);
        assert_eq!(records[1].quality_flag, Some('I'));

        // Empty cell is the missing sentinel
        assert!(records[2].is_missing());
    }

    #[test]
    fn test_malformed_rows() {
        let layout = NoaaCsvLayout::from_headers(&headers()).unwrap();

        let short = StringRecord::from(vec!["USW00094728", "2020-01-15"]);
        assert!(layout.parse_record(&short).is_err());

        let bad_date = StringRecord::from(vec!["S1", "2020-02-30", "", "1", "", "2", "", "3", ""]);
        assert!(layout.parse_record(&bad_date).is_err());

        let decimal = StringRecord::from(vec!["S1", "2020-02-01", "", "1.5", "", "2", "", "3", ""]);
        assert!(layout.parse_record(&decimal).is_err());
    }
}
