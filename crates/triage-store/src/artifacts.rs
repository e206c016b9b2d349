//! On-disk store for serialized classifier artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::StoreError;

/// File name of the risk-tier head.
pub const RISK_MODEL_FILE: &str = "risk_model.json";

/// File name of the department head.
pub const DEPT_MODEL_FILE: &str = "dept_model.json";

/// Directory holding the two model artifacts produced by offline training.
///
/// The store only moves JSON documents; validating that an artifact matches
/// the serving feature schema is the classifier's job.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at `root`, which need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Check whether both model artifacts are present.
    pub fn has_models(&self) -> bool {
        self.path_of(RISK_MODEL_FILE).is_file() && self.path_of(DEPT_MODEL_FILE).is_file()
    }

    /// Serialize `value` as pretty JSON to `file_name`, creating the root if needed.
    ///
    /// Writes to a sibling temp file first and renames, so a reader never
    /// sees a half-written artifact.
    pub fn write_json<T: Serialize>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_of(file_name);
        let tmp = self.root.join(format!(".{file_name}.tmp"));
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
        Ok(path)
    }

    /// Read and deserialize `file_name`.
    pub fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<T, StoreError> {
        let path = self.path_of(file_name);
        if !path.is_file() {
            return Err(StoreError::ArtifactNotFound(path));
        }
        let bytes = fs::read(&path)?;
        let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "loaded artifact");
        Ok(value)
    }
}
