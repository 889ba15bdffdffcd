use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProcessingError, Result};

/// Climate variables carried through the pipeline.
///
/// Ordering follows the GHCN element codes alphabetically so that sorted
/// datasets list `PRCP`, `TMAX`, `TMIN` for each station/date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    #[serde(rename = "PRCP")]
    Precipitation,
    #[serde(rename = "TMAX")]
    MaxTemperature,
    #[serde(rename = "TMIN")]
    MinTemperature,
}

impl Element {
    pub const ALL: [Element; 3] = [
        Element::Precipitation,
        Element::MaxTemperature,
        Element::MinTemperature,
    ];

    /// Map a GHCN element code to a canonical element. Codes outside the
    /// canonical set (SNOW, SNWD, TOBS, ...) yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "PRCP" => Some(Element::Precipitation),
            "TMAX" => Some(Element::MaxTemperature),
            "TMIN" => Some(Element::MinTemperature),
            _ => None,
        }
    }

    pub fn parse(code: &str) -> Result<Self> {
        Self::from_code(code)
            .ok_or_else(|| ProcessingError::InvalidFormat(format!("Unknown element: '{}'", code)))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Element::Precipitation => "PRCP",
            Element::MaxTemperature => "TMAX",
            Element::MinTemperature => "TMIN",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            Element::Precipitation => "mm",
            Element::MaxTemperature | Element::MinTemperature => "°C",
        }
    }

    pub fn is_temperature(&self) -> bool {
        matches!(self, Element::MaxTemperature | Element::MinTemperature)
    }

    /// Convert a raw GHCN value (tenths of °C or tenths of mm) to physical units.
    pub fn to_physical(&self, raw_tenths: i32) -> f64 {
        raw_tenths as f64 / 10.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_codes() {
        for element in Element::ALL {
            assert_eq!(Element::from_code(element.code()), Some(element));
        }
        assert_eq!(Element::from_code("SNWD"), None);
        assert!(Element::parse("TOBS").is_err());
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(Element::MaxTemperature.to_physical(125), 12.5);
        assert_eq!(Element::MinTemperature.to_physical(-34), -3.4);
        assert_eq!(Element::Precipitation.to_physical(50), 5.0);
    }

    #[test]
    fn test_sort_order_matches_codes() {
        let mut elements = vec![
            Element::MinTemperature,
            Element::Precipitation,
            Element::MaxTemperature,
        ];
        elements.sort();
        let codes: Vec<&str> = elements.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["PRCP", "TMAX", "TMIN"]);
    }
}
