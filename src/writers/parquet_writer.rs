use crate::error::{ProcessingError, Result};
use crate::models::{CanonicalRow, Element};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_CHUNK_SIZE, DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// `NaiveDate::num_days_from_ce` of 1970-01-01; Arrow `Date32` counts from there.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parquet export of canonical rows.
pub struct ParquetWriter {
    compression: Compression,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    /// Write rows in record batches of `DEFAULT_CHUNK_SIZE`.
    pub fn write_rows(&self, rows: &[CanonicalRow], path: &Path) -> Result<()> {
        self.write_rows_batched(rows, path, DEFAULT_CHUNK_SIZE)
    }

    pub fn write_rows_batched(
        &self,
        rows: &[CanonicalRow],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        let schema = Self::schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(DEFAULT_ROW_GROUP_SIZE)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in rows.chunks(batch_size.max(1)) {
            let batch = Self::rows_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("station_id", DataType::Utf8, false),
            Field::new("date", DataType::Date32, false),
            Field::new("element", DataType::Utf8, false),
            Field::new("value", DataType::Float64, true),
            Field::new("quality_flag", DataType::Utf8, true),
        ]))
    }

    fn rows_to_batch(rows: &[CanonicalRow], schema: Arc<Schema>) -> Result<RecordBatch> {
        let station_ids: Vec<&str> = rows.iter().map(|r| r.station_id.as_str()).collect();
        let dates: Vec<i32> = rows
            .iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();
        let elements: Vec<&str> = rows.iter().map(|r| r.element.code()).collect();
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.value).collect();
        let flags: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.quality_flag.map(|c| c.to_string()))
            .collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(station_ids)),
                Arc::new(Date32Array::from(dates)),
                Arc::new(StringArray::from(elements)),
                Arc::new(Float64Array::from(values)),
                Arc::new(StringArray::from(flags)),
            ],
        )?;

        Ok(batch)
    }

    /// Read up to `limit` rows back (0 reads everything).
    pub fn read_rows(&self, path: &Path, limit: usize) -> Result<Vec<CanonicalRow>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(DEFAULT_CHUNK_SIZE)
            .build()?;

        let limit = if limit == 0 { usize::MAX } else { limit };
        let mut rows = Vec::new();

        for batch in reader {
            let batch = batch?;

            let station_ids = column::<StringArray>(&batch, 0, "station_id")?;
            let dates = column::<Date32Array>(&batch, 1, "date")?;
            let elements = column::<StringArray>(&batch, 2, "element")?;
            let values = column::<Float64Array>(&batch, 3, "value")?;
            let flags = column::<StringArray>(&batch, 4, "quality_flag")?;

            for i in 0..batch.num_rows() {
                if rows.len() >= limit {
                    return Ok(rows);
                }

                let date = NaiveDate::from_num_days_from_ce_opt(dates.value(i) + UNIX_EPOCH_DAYS_FROM_CE)
                    .ok_or_else(|| {
                        ProcessingError::InvalidFormat("Invalid date in Parquet file".to_string())
                    })?;

                rows.push(CanonicalRow {
                    station_id: station_ids.value(i).to_string(),
                    date,
                    element: Element::parse(elements.value(i))?,
                    value: (!values.is_null(i)).then(|| values.value(i)),
                    quality_flag: if flags.is_null(i) {
                        None
                    } else {
                        flags.value(i).chars().next()
                    },
                });
            }
        }

        Ok(rows)
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes: Vec<i64> = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        let compression = metadata
            .row_groups()
            .first()
            .and_then(|rg| rg.columns().first())
            .map(|c| c.compression())
            .unwrap_or(self.compression);

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression,
        })
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, index: usize, name: &str) -> Result<&'a T> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: usize,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups == 0 {
            0.0
        } else {
            self.total_rows as f64 / self.row_groups as f64
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}
