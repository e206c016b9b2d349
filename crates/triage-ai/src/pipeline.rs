//! Per-request triage evaluation.
//!
//! Vitals are checked first, then the optional document is scored, the
//! feature vector assembled, both heads consulted and the narrative composed.
//! The first failure ends the request; document problems never count as one.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use triage_core::{HistoryFindings, ShapeError, TriageResult, VitalsRecord, assemble, compose};

use crate::classifier::{DualHeadClassifier, Predict};
use crate::document::score_document;
use crate::error::PredictionError;

/// Why a single request produced no result.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("invalid vitals: {0}")]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl TriageError {
    /// Short machine-readable tag for JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Shape(_) => "shape",
            Self::Prediction(_) => "prediction",
        }
    }
}

/// Everything one request produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub findings: HistoryFindings,
    #[serde(flatten)]
    pub result: TriageResult,
}

/// The serving path, generic over the predictor so tests can inject doubles.
///
/// Holds no mutable state: share one instance behind an `Arc` across workers.
pub struct TriagePipeline<P = DualHeadClassifier> {
    predictor: P,
}

impl<P: Predict> TriagePipeline<P> {
    pub fn new(predictor: P) -> Self {
        Self { predictor }
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Evaluate typed vitals and optional PDF bytes.
    pub fn evaluate(
        &self,
        vitals: &VitalsRecord,
        document: Option<&[u8]>,
    ) -> Result<Assessment, TriageError> {
        let findings = document.map(score_document).unwrap_or_default();
        let features = assemble(vitals, findings.score)?;
        let (risk, department) = self.predictor.predict(&features)?;
        let narrative = compose(risk, department, vitals, &findings.matched_conditions);
        debug!(%risk, %department, history_score = findings.score, "triage evaluated");

        Ok(Assessment {
            findings,
            result: TriageResult {
                risk,
                department,
                narrative,
            },
        })
    }

    /// Evaluate vitals given as a name-keyed JSON object.
    pub fn evaluate_named(
        &self,
        fields: &Map<String, Value>,
        document: Option<&[u8]>,
    ) -> Result<Assessment, TriageError> {
        let vitals = VitalsRecord::from_named(fields)?;
        self.evaluate(&vitals, document)
    }
}
