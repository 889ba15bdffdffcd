pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::{write_json, CsvWriter, TableRow};
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
