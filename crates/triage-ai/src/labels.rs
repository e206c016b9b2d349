//! Ground-truth labelling rules and the synthetic training population.
//!
//! Labels are assigned by fixed clinical threshold rules over named features.
//! The population is drawn from fixed distributions with a seeded RNG and
//! pushed through [`assemble`] so training rows take exactly the path that
//! serving rows take. Batches use the training schema from
//! [`triage_core::schema::training_schema`].

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, UInt8Array};
use arrow::record_batch::RecordBatch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use triage_core::features::feature_columns;
use triage_core::schema::{DEPT_LABEL, RISK_LABEL, training_schema};
use triage_core::{
    Department, FEATURE_COUNT, Feature, FeatureVector, RiskTier, VitalsRecord, assemble,
};

/// Risk tier by points: +3 for hypertensive crisis or low SpO2, +2 for chest
/// pain, +2 for a history score of 2 or more. 5+ is HIGH, 3+ is MEDIUM.
pub fn risk_label(fv: &FeatureVector) -> RiskTier {
    let mut points = 0;
    if fv.get(Feature::SystolicBp) > 160.0 || fv.get(Feature::OxygenSat) < 92.0 {
        points += 3;
    }
    if fv.flag(Feature::ChestPain) {
        points += 2;
    }
    if fv.get(Feature::HistoryScore) >= 2.0 {
        points += 2;
    }

    match points {
        p if p >= 5 => RiskTier::High,
        p if p >= 3 => RiskTier::Medium,
        _ => RiskTier::Low,
    }
}

/// Department by first matching rule: cardiac signs, then dizziness, then
/// severe hypoxia, else general medicine.
pub fn dept_label(fv: &FeatureVector) -> Department {
    if fv.flag(Feature::ChestPain) || fv.get(Feature::HistoryScore) >= 3.0 {
        Department::Cardiology
    } else if fv.flag(Feature::Dizziness) {
        Department::Neurology
    } else if fv.get(Feature::OxygenSat) < 90.0 {
        Department::Emergency
    } else {
        Department::GeneralMedicine
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationConfig {
    pub rows: usize,
    pub seed: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            rows: 1500,
            seed: 42,
        }
    }
}

/// Draw one synthetic patient: vitals plus a history score in 0..=4.
pub fn sample_patient<R: Rng>(rng: &mut R) -> (VitalsRecord, u8) {
    let vitals = VitalsRecord {
        age: rng.gen_range(10..90),
        systolic_bp: rng.gen_range(90..200),
        diastolic_bp: rng.gen_range(60..120),
        heart_rate: rng.gen_range(50..130),
        temperature: rng.gen_range(97.0..104.0),
        oxygen_sat: rng.gen_range(85..100),
        chest_pain: rng.gen_bool(0.2),
        shortness_of_breath: rng.gen_bool(0.3),
        dizziness: rng.gen_bool(0.2),
        vomiting: rng.gen_bool(0.1),
    };
    let history_score = rng.gen_range(0..5);
    (vitals, history_score)
}

/// Generate the labelled training population as one Arrow batch.
pub fn synthesize(config: &PopulationConfig) -> anyhow::Result<RecordBatch> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut vectors = Vec::with_capacity(config.rows);
    for _ in 0..config.rows {
        let (vitals, history_score) = sample_patient(&mut rng);
        vectors.push(assemble(&vitals, history_score)?);
    }

    let risk: UInt8Array = vectors
        .iter()
        .map(|v| Some(risk_label(v).index()))
        .collect();
    let dept: UInt8Array = vectors
        .iter()
        .map(|v| Some(dept_label(v).index()))
        .collect();

    let mut columns = feature_columns(&vectors);
    columns.push(Arc::new(risk) as ArrayRef);
    columns.push(Arc::new(dept) as ArrayRef);

    let batch = RecordBatch::try_new(Arc::new(training_schema()), columns)?;
    info!(
        rows = config.rows,
        seed = config.seed,
        "synthesized training population"
    );
    Ok(batch)
}

/// Feature rows and both label columns pulled out of training batches.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub rows: Vec<[f64; FEATURE_COUNT]>,
    pub risk: Vec<u8>,
    pub department: Vec<u8>,
}

/// Label distribution of a training set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    pub rows: usize,
    pub risk_counts: [usize; 3],
    pub dept_counts: [usize; 4],
}

impl TrainingSet {
    /// Collect rows from batches, reading every feature column by name.
    ///
    /// Column position in the batch is irrelevant; a missing or non-Float64
    /// feature column, or a label outside its class range, is an error.
    pub fn from_batches(batches: &[RecordBatch]) -> anyhow::Result<Self> {
        let mut set = Self::default();

        for batch in batches {
            let mut columns = Vec::with_capacity(FEATURE_COUNT);
            for feature in Feature::ALL {
                let name = feature.name();
                let col = batch
                    .column_by_name(name)
                    .ok_or_else(|| anyhow::anyhow!("missing '{name}' column"))?;
                let values = col
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| anyhow::anyhow!("'{name}' column is not Float64"))?;
                columns.push(values);
            }
            let risk = label_column(batch, RISK_LABEL, RiskTier::ALL.len())?;
            let dept = label_column(batch, DEPT_LABEL, Department::ALL.len())?;

            for row in 0..batch.num_rows() {
                let mut values = [0.0; FEATURE_COUNT];
                for (slot, col) in values.iter_mut().zip(&columns) {
                    if col.is_null(row) {
                        anyhow::bail!("null feature value at row {row}");
                    }
                    *slot = col.value(row);
                }
                set.rows.push(values);
                set.risk.push(risk.value(row));
                set.department.push(dept.value(row));
            }
        }

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> LabelSummary {
        let mut risk_counts = [0usize; 3];
        let mut dept_counts = [0usize; 4];
        for &r in &self.risk {
            risk_counts[usize::from(r)] += 1;
        }
        for &d in &self.department {
            dept_counts[usize::from(d)] += 1;
        }
        LabelSummary {
            rows: self.len(),
            risk_counts,
            dept_counts,
        }
    }
}

fn label_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    n_classes: usize,
) -> anyhow::Result<&'a UInt8Array> {
    let labels = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("missing '{name}' column"))?
        .as_any()
        .downcast_ref::<UInt8Array>()
        .ok_or_else(|| anyhow::anyhow!("'{name}' column is not UInt8"))?;
    if labels.null_count() > 0 {
        anyhow::bail!("'{name}' column has nulls");
    }
    let out_of_range = labels.values().iter().find(|&&v| usize::from(v) >= n_classes);
    if let Some(bad) = out_of_range {
        anyhow::bail!("'{name}' has class {bad}, expected < {n_classes}");
    }
    Ok(labels)
}
