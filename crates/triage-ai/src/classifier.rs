//! Dual-head tabular classification for triage.
//!
//! One artifact predicts the risk tier, the other the receiving department.
//! Both consume the same assembled [`FeatureVector`]. Artifacts are loaded
//! once, validated against the serving schema, and then only read, so a
//! single classifier can be shared across threads without locking.

use tracing::{debug, info};
use triage_core::{Department, FeatureVector, RiskTier};
use triage_store::{ArtifactStore, StoreError};

use crate::artifact::{Head, ModelArtifact};
use crate::error::PredictionError;

/// Anything that can turn a feature vector into a risk tier and department.
///
/// The request pipeline is generic over this so tests can inject doubles.
pub trait Predict: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<(RiskTier, Department), PredictionError>;
}

/// Risk and department heads loaded from the artifact store.
///
/// A head left unloaded makes every prediction fail with
/// [`PredictionError::ModelUnavailable`]; there is no default answer.
#[derive(Debug, Clone, Default)]
pub struct DualHeadClassifier {
    risk: Option<ModelArtifact>,
    department: Option<ModelArtifact>,
}

/// Provenance of one loaded head, for logs and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadSummary {
    pub head: Head,
    pub family: &'static str,
    pub trained_rows: usize,
    pub training_accuracy: f64,
    pub seed: u64,
}

impl DualHeadClassifier {
    /// A classifier with neither head loaded.
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Build from two in-memory artifacts, validating each against the
    /// serving schema.
    pub fn from_artifacts(
        risk: ModelArtifact,
        department: ModelArtifact,
    ) -> Result<Self, PredictionError> {
        risk.validate(Head::Risk)?;
        department.validate(Head::Department)?;
        Ok(Self {
            risk: Some(risk),
            department: Some(department),
        })
    }

    /// Load both heads from `store`.
    ///
    /// A missing or unreadable file maps to [`PredictionError::ModelUnavailable`];
    /// a readable artifact for the wrong schema maps to
    /// [`PredictionError::SchemaMismatch`].
    pub fn load(store: &ArtifactStore) -> Result<Self, PredictionError> {
        let risk = load_head(store, Head::Risk)?;
        let department = load_head(store, Head::Department)?;
        let classifier = Self::from_artifacts(risk, department)?;
        for s in classifier.summary() {
            info!(
                head = %s.head,
                family = s.family,
                trained_rows = s.trained_rows,
                training_accuracy = s.training_accuracy,
                "loaded classifier head"
            );
        }
        Ok(classifier)
    }

    pub fn is_ready(&self) -> bool {
        self.risk.is_some() && self.department.is_some()
    }

    /// Summaries of the loaded heads, risk first.
    pub fn summary(&self) -> Vec<HeadSummary> {
        [&self.risk, &self.department]
            .into_iter()
            .flatten()
            .map(|a| HeadSummary {
                head: a.head,
                family: a.model.family(),
                trained_rows: a.trained_rows,
                training_accuracy: a.training_accuracy,
                seed: a.seed,
            })
            .collect()
    }

    fn head(&self, head: Head) -> Result<&ModelArtifact, PredictionError> {
        let slot = match head {
            Head::Risk => &self.risk,
            Head::Department => &self.department,
        };
        slot.as_ref().ok_or_else(|| PredictionError::ModelUnavailable {
            head,
            reason: "no artifact loaded".into(),
        })
    }
}

impl Predict for DualHeadClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<(RiskTier, Department), PredictionError> {
        let risk_model = self.head(Head::Risk)?;
        let dept_model = self.head(Head::Department)?;

        let risk_index = risk_model.predict_index(features);
        let risk = RiskTier::from_index(risk_index).ok_or(PredictionError::UnknownClass {
            head: Head::Risk,
            index: risk_index,
        })?;

        let dept_index = dept_model.predict_index(features);
        let department =
            Department::from_index(dept_index).ok_or(PredictionError::UnknownClass {
                head: Head::Department,
                index: dept_index,
            })?;

        debug!(%risk, %department, "classified");
        Ok((risk, department))
    }
}

fn load_head(store: &ArtifactStore, head: Head) -> Result<ModelArtifact, PredictionError> {
    store
        .read_json::<ModelArtifact>(head.file_name())
        .map_err(|e| PredictionError::ModelUnavailable {
            head,
            reason: match e {
                StoreError::ArtifactNotFound(path) => format!("{} not found", path.display()),
                other => other.to_string(),
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::PopulationConfig;
    use crate::train::{TrainConfig, train};
    use triage_core::{VitalsRecord, assemble};

    fn small_config() -> TrainConfig {
        let mut config = TrainConfig::default();
        config.population = PopulationConfig { rows: 400, seed: 5 };
        config.department.n_trees = 5;
        config
    }

    fn unavailable_head(err: PredictionError) -> Head {
        match err {
            PredictionError::ModelUnavailable { head, .. } => head,
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
    }

    fn vitals() -> VitalsRecord {
        VitalsRecord {
            age: 30,
            systolic_bp: 118,
            diastolic_bp: 76,
            heart_rate: 70,
            temperature: 98.4,
            oxygen_sat: 99,
            chest_pain: false,
            shortness_of_breath: false,
            dizziness: false,
            vomiting: false,
        }
    }

    #[test]
    fn unloaded_classifier_is_unavailable() {
        let clf = DualHeadClassifier::unloaded();
        assert!(!clf.is_ready());
        let fv = assemble(&vitals(), 0).unwrap();
        let err = clf.predict(&fv).unwrap_err();
        assert_eq!(unavailable_head(err), Head::Risk);
    }

    #[test]
    fn missing_department_head_is_unavailable() {
        let trained = train(&small_config()).unwrap();
        let clf = DualHeadClassifier {
            risk: Some(trained.risk),
            department: None,
        };
        let fv = assemble(&vitals(), 0).unwrap();
        let err = clf.predict(&fv).unwrap_err();
        assert_eq!(unavailable_head(err), Head::Department);
    }

    #[test]
    fn swapped_artifacts_are_rejected() {
        let trained = train(&small_config()).unwrap();
        let swapped = DualHeadClassifier::from_artifacts(trained.department, trained.risk);
        let Err(PredictionError::SchemaMismatch { head, .. }) = swapped else {
            panic!("expected SchemaMismatch");
        };
        assert_eq!(head, Head::Risk);
    }

    #[test]
    fn load_from_empty_store_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        match DualHeadClassifier::load(&store).unwrap_err() {
            PredictionError::ModelUnavailable { head, reason } => {
                assert_eq!(head, Head::Risk);
                assert!(reason.contains("risk_model.json"), "{reason}");
            }
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn load_corrupt_artifact_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        train(&small_config()).unwrap().save(&store).unwrap();
        let department = store.path_of(Head::Department.file_name());
        std::fs::write(department, b"{\"head\":").unwrap();

        let err = DualHeadClassifier::load(&store).unwrap_err();
        assert_eq!(unavailable_head(err), Head::Department);
    }

    #[test]
    fn saved_models_load_and_predict() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        train(&small_config()).unwrap().save(&store).unwrap();

        let clf = DualHeadClassifier::load(&store).unwrap();
        assert!(clf.is_ready());
        let summary = clf.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].family, "tree");
        assert_eq!(summary[1].family, "forest");
        assert_eq!(summary[0].trained_rows, 400);

        let fv = assemble(&vitals(), 0).unwrap();
        assert_eq!(
            clf.predict(&fv).unwrap(),
            (RiskTier::Low, Department::GeneralMedicine)
        );
    }

    #[test]
    fn classifier_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DualHeadClassifier>();
    }
}
