//! Offline training of both classifier heads.
//!
//! Runs before serving: synthesize (or read) a labelled population, fit a
//! single tree for risk and a bagged forest for department, and persist both
//! artifacts through the store. Training never happens on the request path.

use std::path::PathBuf;

use arrow::record_batch::RecordBatch;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use triage_core::FEATURE_COUNT;
use triage_store::ArtifactStore;

use crate::artifact::{Head, Model, ModelArtifact};
use crate::classifier::DualHeadClassifier;
use crate::forest::{Forest, ForestParams};
use crate::labels::{LabelSummary, PopulationConfig, TrainingSet, synthesize};
use crate::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Default)]
pub struct TrainConfig {
    pub population: PopulationConfig,
    pub risk: TreeParams,
    pub department: ForestParams,
}

/// Both fitted heads plus the label distribution they were trained on.
#[derive(Debug, Clone)]
pub struct TrainedModels {
    pub risk: ModelArtifact,
    pub department: ModelArtifact,
    pub summary: LabelSummary,
}

impl TrainedModels {
    /// Write both artifacts. Returns the written paths, risk first.
    pub fn save(&self, store: &ArtifactStore) -> anyhow::Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(2);
        for artifact in [&self.risk, &self.department] {
            let path = store.write_json(artifact.head.file_name(), artifact)?;
            info!(head = %artifact.head, path = %path.display(), "saved model artifact");
            paths.push(path);
        }
        Ok(paths)
    }

    /// A ready classifier over the in-memory artifacts.
    pub fn classifier(&self) -> anyhow::Result<DualHeadClassifier> {
        Ok(DualHeadClassifier::from_artifacts(
            self.risk.clone(),
            self.department.clone(),
        )?)
    }
}

/// Synthesize the population described by `config` and train on it.
pub fn train(config: &TrainConfig) -> anyhow::Result<TrainedModels> {
    let batch = synthesize(&config.population)?;
    train_from_batches(&[batch], config)
}

/// Train on pre-built batches carrying the training schema.
pub fn train_from_batches(
    batches: &[RecordBatch],
    config: &TrainConfig,
) -> anyhow::Result<TrainedModels> {
    let set = TrainingSet::from_batches(batches)?;
    if set.is_empty() {
        anyhow::bail!("training set is empty");
    }
    let summary = set.summary();
    let seed = config.population.seed;
    info!(
        rows = summary.rows,
        risk = ?summary.risk_counts,
        department = ?summary.dept_counts,
        "training set loaded"
    );

    let mut sample: Vec<usize> = (0..set.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let tree = DecisionTree::fit(
        &set.rows,
        &set.risk,
        &mut sample,
        Head::Risk.n_classes(),
        &config.risk,
        &mut rng,
    );
    let risk_acc = accuracy(&set.rows, &set.risk, |r| tree.predict(r));
    info!(
        nodes = tree.node_count(),
        depth = tree.depth(),
        accuracy = risk_acc,
        "risk tree trained"
    );

    let forest = Forest::fit(
        &set.rows,
        &set.department,
        Head::Department.n_classes(),
        &config.department,
        seed,
    );
    let dept_acc = accuracy(&set.rows, &set.department, |r| forest.predict(r));
    info!(
        trees = forest.tree_count(),
        accuracy = dept_acc,
        "department forest trained"
    );

    let rows = set.len();
    Ok(TrainedModels {
        risk: ModelArtifact::new(Head::Risk, Model::Tree(tree), seed, rows, risk_acc),
        department: ModelArtifact::new(
            Head::Department,
            Model::Forest(forest),
            seed,
            rows,
            dept_acc,
        ),
        summary,
    })
}

fn accuracy(
    rows: &[[f64; FEATURE_COUNT]],
    labels: &[u8],
    predict: impl Fn(&[f64; FEATURE_COUNT]) -> u8,
) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let correct = rows
        .iter()
        .zip(labels)
        .filter(|(r, l)| predict(*r) == **l)
        .count();
    correct as f64 / rows.len() as f64
}
