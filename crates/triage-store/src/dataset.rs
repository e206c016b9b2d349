//! Parquet export of the synthetic training population.

use std::fs::{self, File};
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tracing::info;

use crate::StoreError;

/// Write batches sharing one schema to a single Parquet file.
pub fn write_parquet(path: &Path, batches: &[RecordBatch]) -> Result<usize, StoreError> {
    let first = batches
        .first()
        .ok_or_else(|| StoreError::Other("no batches to write".into()))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), None)?;
    let mut rows = 0usize;
    for batch in batches {
        writer.write(batch)?;
        rows += batch.num_rows();
    }
    writer.close()?;

    info!(rows, path = %path.display(), "wrote parquet dataset");
    Ok(rows)
}
