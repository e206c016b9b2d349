//! Serialized classifier artifacts and their schema header.
//!
//! An artifact records the ordered feature names and class labels it was
//! trained against. Loading compares both to the serving schema, so a model
//! trained without `History_Score` (or with columns in another order) is
//! refused instead of silently scoring shifted inputs.

use std::fmt;

use serde::{Deserialize, Serialize};
use triage_core::schema::feature_names;
use triage_core::{Department, FeatureVector, RiskTier};
use triage_store::{DEPT_MODEL_FILE, RISK_MODEL_FILE};

use crate::error::PredictionError;
use crate::forest::Forest;
use crate::tree::DecisionTree;

/// Bumped whenever the on-disk layout changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Which of the two classifier outputs an artifact produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Head {
    Risk,
    Department,
}

impl Head {
    /// Class labels in ordinal order.
    pub fn class_labels(self) -> Vec<&'static str> {
        match self {
            Self::Risk => RiskTier::ALL.iter().map(|r| r.as_str()).collect(),
            Self::Department => Department::ALL.iter().map(|d| d.as_str()).collect(),
        }
    }

    pub fn n_classes(self) -> usize {
        match self {
            Self::Risk => RiskTier::ALL.len(),
            Self::Department => Department::ALL.len(),
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Risk => RISK_MODEL_FILE,
            Self::Department => DEPT_MODEL_FILE,
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Risk => "risk",
            Self::Department => "department",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Model {
    Tree(DecisionTree),
    Forest(Forest),
}

impl Model {
    fn predict(&self, row: &[f64; triage_core::FEATURE_COUNT]) -> u8 {
        match self {
            Self::Tree(t) => t.predict(row),
            Self::Forest(f) => f.predict(row),
        }
    }

    fn check(&self, n_classes: usize) -> Result<(), String> {
        match self {
            Self::Tree(t) => t.check(n_classes),
            Self::Forest(f) => f.check(n_classes),
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            Self::Tree(_) => "tree",
            Self::Forest(_) => "forest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub head: Head,
    pub features: Vec<String>,
    pub classes: Vec<String>,
    pub seed: u64,
    pub trained_rows: usize,
    pub training_accuracy: f64,
    pub model: Model,
}

impl ModelArtifact {
    /// Wrap a freshly fitted model with the current schema header.
    pub fn new(
        head: Head,
        model: Model,
        seed: u64,
        trained_rows: usize,
        training_accuracy: f64,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            head,
            features: feature_names().iter().map(|s| s.to_string()).collect(),
            classes: head.class_labels().iter().map(|s| s.to_string()).collect(),
            seed,
            trained_rows,
            training_accuracy,
            model,
        }
    }

    /// Confirm this artifact can serve `expected` against the current schema.
    pub fn validate(&self, expected: Head) -> Result<(), PredictionError> {
        let mismatch = |detail: String| PredictionError::SchemaMismatch {
            head: expected,
            detail,
        };

        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PredictionError::ModelUnavailable {
                head: expected,
                reason: format!(
                    "artifact format v{} is not supported (expected v{ARTIFACT_FORMAT_VERSION})",
                    self.format_version
                ),
            });
        }
        if self.head != expected {
            let detail = format!("artifact was trained for the {} head", self.head);
            return Err(mismatch(detail));
        }

        let serving = feature_names();
        if self.features.len() != serving.len() {
            return Err(mismatch(format!(
                "artifact has {} features, serving schema has {}",
                self.features.len(),
                serving.len()
            )));
        }
        if let Some((i, (got, want))) = self
            .features
            .iter()
            .zip(serving)
            .enumerate()
            .find(|(_, (got, want))| got.as_str() != *want)
        {
            return Err(mismatch(format!(
                "feature {i} is '{got}', serving schema expects '{want}'"
            )));
        }

        let labels = expected.class_labels();
        let stored = self.classes.iter().map(String::as_str);
        if stored.ne(labels.iter().copied()) {
            return Err(mismatch(format!(
                "classes {:?} do not match {:?}",
                self.classes, labels
            )));
        }

        self.model.check(expected.n_classes()).map_err(mismatch)
    }

    /// Raw class index for an assembled feature vector.
    pub fn predict_index(&self, features: &FeatureVector) -> u8 {
        self.model.predict(features.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeParams;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use triage_core::FEATURE_COUNT;

    fn tiny_tree(n_classes: usize) -> DecisionTree {
        let rows: Vec<[f64; FEATURE_COUNT]> = (0..n_classes)
            .map(|c| {
                let mut r = [0.0; FEATURE_COUNT];
                r[0] = c as f64;
                r
            })
            .collect();
        let labels: Vec<u8> = (0..n_classes as u8).collect();
        let mut sample: Vec<usize> = (0..rows.len()).collect();
        let mut rng = StdRng::seed_from_u64(0);
        DecisionTree::fit(
            &rows,
            &labels,
            &mut sample,
            n_classes,
            &TreeParams::default(),
            &mut rng,
        )
    }

    fn artifact(head: Head) -> ModelArtifact {
        ModelArtifact::new(head, Model::Tree(tiny_tree(head.n_classes())), 42, 3, 1.0)
    }

    #[test]
    fn fresh_artifact_validates() {
        assert!(artifact(Head::Risk).validate(Head::Risk).is_ok());
        let department = artifact(Head::Department);
        assert!(department.validate(Head::Department).is_ok());
    }

    #[test]
    fn header_records_schema() {
        let a = artifact(Head::Department);
        assert_eq!(a.features.len(), FEATURE_COUNT);
        assert_eq!(a.features[10], "History_Score");
        assert_eq!(
            a.classes,
            ["General Medicine", "Cardiology", "Neurology", "Emergency"]
        );
    }

    #[test]
    fn wrong_head_is_a_mismatch() {
        let err = artifact(Head::Risk).validate(Head::Department).unwrap_err();
        let PredictionError::SchemaMismatch { head, .. } = err else {
            panic!("unexpected {err:?}");
        };
        assert_eq!(head, Head::Department);
    }

    #[test]
    fn missing_history_score_is_a_mismatch() {
        let mut a = artifact(Head::Risk);
        a.features.pop();
        let err = a.validate(Head::Risk).unwrap_err();
        assert!(err.to_string().contains("10 features"), "{err}");
    }

    #[test]
    fn reordered_features_are_a_mismatch() {
        let mut a = artifact(Head::Risk);
        a.features.swap(1, 2);
        let err = a.validate(Head::Risk).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("feature 1 is 'Diastolic_BP'"), "{message}");
    }

    #[test]
    fn unsupported_version_is_unavailable() {
        let mut a = artifact(Head::Risk);
        a.format_version = 99;
        let err = a.validate(Head::Risk).unwrap_err();
        assert!(matches!(err, PredictionError::ModelUnavailable { .. }));
    }

    #[test]
    fn json_round_trip_keeps_model_family() {
        let a = artifact(Head::Risk);
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"family\":\"tree\""));
        let back: ModelArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.model.family(), "tree");
    }
}
