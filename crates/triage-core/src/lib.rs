//! Core triage types, the named Arrow feature schema, feature assembly and narrative composition.

mod error;
pub mod facilities;
pub mod features;
pub mod schema;
pub mod summary;
pub mod triage;
pub mod vitals;

pub use error::{ShapeError, UnknownDepartment};
pub use facilities::{Facility, facilities_for};
pub use features::{FeatureVector, assemble, assemble_named};
pub use schema::{FEATURE_COUNT, Feature};
pub use summary::compose;
pub use triage::{Department, HistoryFindings, MAX_HISTORY_SCORE, RiskTier, TriageResult};
pub use vitals::VitalsRecord;

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// rustfmt's default `max_width`.
    const MAX_WIDTH: usize = 100;

    fn rust_sources(dir: &Path, out: &mut Vec<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                rust_sources(&path, out);
            } else if path.extension().is_some_and(|e| e == "rs") {
                out.push(path);
            }
        }
    }

    #[test]
    fn workspace_sources_fit_max_width() {
        let crates = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let mut files = Vec::new();
        rust_sources(&crates, &mut files);
        assert!(files.len() > 10, "found only {files:?}");

        let mut wide = Vec::new();
        for file in &files {
            let text = fs::read_to_string(file).unwrap();
            for (n, line) in text.lines().enumerate() {
                if line.chars().count() > MAX_WIDTH {
                    wide.push(format!("{}:{}", file.display(), n + 1));
                }
            }
        }
        assert!(wide.is_empty(), "lines over {MAX_WIDTH} columns: {wide:?}");
    }
}
