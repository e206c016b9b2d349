//! Concurrent evaluation of JSON-lines triage requests.
//!
//! Each non-blank input line is one request:
//! `{"id": .., "vitals": {"Age": 45, ...}, "document": "path/to.pdf"}`.
//! Requests run on blocking worker tasks sharing one pipeline; results come
//! back in input order, one JSON object per request.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use triage_ai::{Predict, TriagePipeline};
use triage_core::{Department, HistoryFindings, RiskTier};

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub id: Value,
    pub vitals: Map<String, Value>,
    #[serde(default)]
    pub document: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Ok {
        id: Value,
        risk: RiskTier,
        department: Department,
        findings: HistoryFindings,
        narrative: String,
    },
    Error {
        id: Value,
        kind: &'static str,
        message: String,
    },
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Evaluate every request in `input` with at most `workers` running at once.
///
/// A line that is not a valid request yields a `shape` error outcome with the
/// line number in the message; it does not stop the batch.
pub async fn run_batch<P>(
    pipeline: Arc<TriagePipeline<P>>,
    input: &str,
    workers: usize,
) -> anyhow::Result<Vec<BatchOutcome>>
where
    P: Predict + 'static,
{
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    let mut outcomes: Vec<Option<BatchOutcome>> = Vec::new();

    for (line_no, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let slot = outcomes.len();
        outcomes.push(None);

        let request: BatchRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                outcomes[slot] = Some(BatchOutcome::Error {
                    id: Value::Null,
                    kind: "shape",
                    message: format!("line {}: {e}", line_no + 1),
                });
                continue;
            }
        };

        let permit = Arc::clone(&permits).acquire_owned().await?;
        let pipeline = Arc::clone(&pipeline);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            (slot, evaluate_one(&pipeline, request))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (slot, outcome) = joined?;
        outcomes[slot] = Some(outcome);
    }

    let outcomes: Vec<BatchOutcome> = outcomes.into_iter().flatten().collect();
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(requests = outcomes.len(), failed, "batch complete");
    Ok(outcomes)
}

fn evaluate_one<P: Predict>(pipeline: &TriagePipeline<P>, request: BatchRequest) -> BatchOutcome {
    let document = match &request.document {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "document unreadable, ignoring history");
                None
            }
        },
        None => None,
    };

    match pipeline.evaluate_named(&request.vitals, document.as_deref()) {
        Ok(assessment) => {
            debug!(id = %request.id, risk = %assessment.result.risk, "request evaluated");
            BatchOutcome::Ok {
                id: request.id,
                risk: assessment.result.risk,
                department: assessment.result.department,
                findings: assessment.findings,
                narrative: assessment.result.narrative,
            }
        }
        Err(e) => BatchOutcome::Error {
            id: request.id,
            kind: e.kind(),
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_ai::{DualHeadClassifier, PredictionError};
    use triage_core::FeatureVector;

    /// Cardiology whenever chest pain is set, otherwise general medicine.
    struct ChestPainRule;

    impl Predict for ChestPainRule {
        fn predict(&self, fv: &FeatureVector) -> Result<(RiskTier, Department), PredictionError> {
            if fv.flag(triage_core::Feature::ChestPain) {
                Ok((RiskTier::High, Department::Cardiology))
            } else {
                Ok((RiskTier::Low, Department::GeneralMedicine))
            }
        }
    }

    fn line(id: u32, chest_pain: u8) -> String {
        serde_json::json!({
            "id": id,
            "vitals": {
                "Age": 45, "Systolic_BP": 120, "Diastolic_BP": 80, "Heart_Rate": 75,
                "Temperature": 98.6, "Oxygen_Sat": 98, "Chest_Pain": chest_pain,
                "Shortness_of_Breath": 0, "Dizziness": 0, "Vomiting": 0,
            },
        })
        .to_string()
    }

    #[tokio::test]
    async fn results_keep_input_order() {
        let input: Vec<String> = (0..20).map(|i| line(i, (i % 2) as u8)).collect();
        let pipeline = Arc::new(TriagePipeline::new(ChestPainRule));
        let out = run_batch(pipeline, &input.join("\n"), 3).await.unwrap();

        assert_eq!(out.len(), 20);
        for (i, outcome) in out.iter().enumerate() {
            match outcome {
                BatchOutcome::Ok { id, department, .. } => {
                    assert_eq!(id, &Value::from(i));
                    let expected = if i % 2 == 1 {
                        Department::Cardiology
                    } else {
                        Department::GeneralMedicine
                    };
                    assert_eq!(*department, expected);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn bad_lines_do_not_stop_the_batch() {
        let input = format!(
            "{}\n\nnot json\n{}\n{}",
            line(1, 0),
            r#"{"id": "x", "vitals": {"Age": 45}}"#,
            line(2, 1)
        );
        let pipeline = Arc::new(TriagePipeline::new(ChestPainRule));
        let out = run_batch(pipeline, &input, 2).await.unwrap();

        assert_eq!(out.len(), 4);
        assert!(out[0].is_ok());
        match &out[1] {
            BatchOutcome::Error { kind, message, .. } => {
                assert_eq!(*kind, "shape");
                assert!(message.starts_with("line 3:"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
        match &out[2] {
            BatchOutcome::Error { id, kind, message } => {
                assert_eq!(id, "x");
                assert_eq!(*kind, "shape");
                assert!(message.contains("Systolic_BP"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(out[3].is_ok());
    }

    #[tokio::test]
    async fn out_of_range_vitals_are_shape_errors() {
        let mut request: Value = serde_json::from_str(&line(9, 0)).unwrap();
        request["vitals"]["Oxygen_Sat"] = Value::from(250);
        let pipeline = Arc::new(TriagePipeline::new(ChestPainRule));
        let out = run_batch(pipeline, &request.to_string(), 1).await.unwrap();

        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "shape");
        assert!(json["message"].as_str().unwrap().contains("Oxygen_Sat"));
    }

    #[tokio::test]
    async fn unloaded_models_report_prediction_errors() {
        let pipeline = Arc::new(TriagePipeline::new(DualHeadClassifier::unloaded()));
        let out = run_batch(pipeline, &line(7, 1), 1).await.unwrap();
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "prediction");
        assert_eq!(json["id"], 7);
        assert!(json.get("risk").is_none());
    }

    #[tokio::test]
    async fn missing_document_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.pdf");
        let request = serde_json::json!({
            "id": "doc",
            "vitals": serde_json::from_str::<Value>(&line(0, 0)).unwrap()["vitals"],
            "document": missing,
        });
        let pipeline = Arc::new(TriagePipeline::new(ChestPainRule));
        let out = run_batch(pipeline, &request.to_string(), 1).await.unwrap();

        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["risk"], "LOW");
        assert_eq!(json["findings"]["score"], 0);
    }

    #[tokio::test]
    async fn empty_input() {
        let pipeline = Arc::new(TriagePipeline::new(ChestPainRule));
        assert!(run_batch(pipeline, "\n\n", 4).await.unwrap().is_empty());
    }
}
