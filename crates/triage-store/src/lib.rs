//! Storage layer: JSON model artifacts, narrative report export, Parquet dataset export.

mod artifacts;
mod error;
mod report;
pub use artifacts::{ArtifactStore, DEPT_MODEL_FILE, RISK_MODEL_FILE};
pub use error::StoreError;
pub use report::{export_report, report_file_name};

#[cfg(feature = "parquet")]
mod dataset;
#[cfg(feature = "parquet")]
pub use dataset::write_parquet;
