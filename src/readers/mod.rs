pub mod concurrent_reader;
pub mod dly_reader;
pub mod noaa_csv_reader;
pub mod station_reader;

pub use concurrent_reader::{ConcurrentReader, FailedFile, ReadOutcome};
pub use dly_reader::parse_dly_line;
pub use noaa_csv_reader::NoaaCsvLayout;
pub use station_reader::{StationFileFormat, StationReader};
