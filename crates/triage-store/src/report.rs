//! Flat text export of a composed narrative.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::StoreError;

/// `triage-report-<UTC timestamp>.txt`
pub fn report_file_name(generated_at: DateTime<Utc>) -> String {
    let stamp = generated_at.format("%Y%m%dT%H%M%SZ");
    format!("triage-report-{stamp}.txt")
}

/// Write `narrative` verbatim to a timestamped `.txt` file under `dir`.
pub fn export_report(
    dir: &Path,
    narrative: &str,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(generated_at));
    fs::write(&path, narrative)?;
    info!(path = %path.display(), "exported report");
    Ok(path)
}
