use serde::{Deserialize, Serialize};
use std::fmt;

/// Meteorological seasons (Northern Hemisphere naming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter, // Dec-Feb
    Spring, // Mar-May
    Summer, // Jun-Aug
    Autumn, // Sep-Nov
}

impl Season {
    /// Seasons in cycle order, starting from winter.
    pub const CYCLE: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Season::Winter => Season::Spring,
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_buckets() {
        let seasons: Vec<Season> = (1..=12).map(Season::from_month).collect();
        assert_eq!(
            seasons,
            vec![
                Season::Winter,
                Season::Winter,
                Season::Spring,
                Season::Spring,
                Season::Spring,
                Season::Summer,
                Season::Summer,
                Season::Summer,
                Season::Autumn,
                Season::Autumn,
                Season::Autumn,
                Season::Winter,
            ]
        );
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(Season::Autumn.next(), Season::Winter);
        for season in Season::CYCLE {
            assert_ne!(season.next(), season);
        }
    }
}
