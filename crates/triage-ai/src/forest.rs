//! Bagged ensemble of CART trees with majority voting.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use triage_core::FEATURE_COUNT;

use crate::tree::{DecisionTree, TreeParams, majority};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            tree: TreeParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl Forest {
    /// Fit `params.n_trees` trees, each on a bootstrap draw of all rows.
    pub fn fit(
        rows: &[[f64; FEATURE_COUNT]],
        labels: &[u8],
        n_classes: usize,
        params: &ForestParams,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rows.len();
        let trees = (0..params.n_trees.max(1))
            .map(|_| {
                let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(rows, labels, &mut sample, n_classes, &params.tree, &mut rng)
            })
            .collect();
        Self { n_classes, trees }
    }

    /// Majority vote across trees; ties go to the lower class index.
    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> u8 {
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            if let Some(v) = votes.get_mut(usize::from(tree.predict(row))) {
                *v += 1;
            }
        }
        majority(&votes)
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn check(&self, n_classes: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        if self.n_classes != n_classes {
            return Err(format!(
                "forest declares {} classes, expected {n_classes}",
                self.n_classes
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(n_classes).map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}
