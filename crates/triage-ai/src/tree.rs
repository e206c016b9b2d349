//! CART decision tree over the triage feature schema.
//!
//! Splits minimise weighted Gini impurity on `value <= threshold`, with the
//! threshold placed midway between adjacent distinct training values. Trees
//! are grown until every leaf is pure unless limited by [`TreeParams`].
//! Nodes live in a flat vector (root at index 0, children always after their
//! parent) so an artifact can be validated and walked without recursion.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use triage_core::FEATURE_COUNT;

/// How many candidate features to examine at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    /// `floor(sqrt(n_features))`, at least one. The search keeps going past
    /// this budget until a split that reduces impurity turns up.
    Sqrt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        class: u8,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    n_classes: usize,
    nodes: Vec<Node>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct Grower<'a, R> {
    rows: &'a [[f64; FEATURE_COUNT]],
    labels: &'a [u8],
    n_classes: usize,
    params: &'a TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Fit a tree on the rows selected by `sample` (indices may repeat, as in
    /// a bootstrap draw). `sample` is reordered in place.
    pub fn fit<R: Rng>(
        rows: &[[f64; FEATURE_COUNT]],
        labels: &[u8],
        sample: &mut [usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut grower = Grower {
            rows,
            labels,
            n_classes,
            params,
            rng,
            nodes: Vec::new(),
        };
        grower.grow(sample, 0);
        Self {
            n_classes,
            nodes: grower.nodes,
        }
    }

    /// Class index for one row.
    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> u8 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { class, .. } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        let mut depth = vec![0usize; self.nodes.len()];
        let mut max = 0;
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                depth[*left] = depth[id] + 1;
                depth[*right] = depth[id] + 1;
                max = max.max(depth[id] + 1);
            }
        }
        max
    }

    /// Structural checks for a deserialized tree: every child index points
    /// forward and in range, every feature and class index is in range.
    pub fn check(&self, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        if self.n_classes != n_classes {
            return Err(format!(
                "tree declares {} classes, expected {n_classes}",
                self.n_classes
            ));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { class, .. } => {
                    if usize::from(*class) >= n_classes {
                        return Err(format!("leaf {id} has class {class} out of range"));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {id} splits on feature {feature}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {id} has non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= id || *child >= self.nodes.len() {
                            return Err(format!("node {id} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl<R: Rng> Grower<'_, R> {
    fn grow(&mut self, sample: &mut [usize], depth: usize) -> usize {
        let counts = self.class_counts(sample);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            class: majority(&counts),
            samples: sample.len(),
        });

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_small = sample.len() < self.params.min_samples_split;
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || too_small || too_deep {
            return id;
        }

        let Some(split) = self.best_split(sample) else {
            return id;
        };

        let mid = partition(sample, |i| self.rows[i][split.feature] <= split.threshold);
        let (left_sample, right_sample) = sample.split_at_mut(mid);
        let left = self.grow(left_sample, depth + 1);
        let right = self.grow(right_sample, depth + 1);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn class_counts(&self, sample: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in sample {
            counts[usize::from(self.labels[i])] += 1;
        }
        counts
    }

    fn best_split(&mut self, sample: &[usize]) -> Option<Candidate> {
        let mut order: Vec<usize> = (0..FEATURE_COUNT).collect();
        let budget = match self.params.max_features {
            MaxFeatures::All => FEATURE_COUNT,
            MaxFeatures::Sqrt => {
                order.shuffle(&mut *self.rng);
                ((FEATURE_COUNT as f64).sqrt() as usize).max(1)
            }
        };

        let parent_score = purity_score(&self.class_counts(sample), sample.len());
        let mut best: Option<Candidate> = None;

        for (examined, &feature) in order.iter().enumerate() {
            if examined >= budget && best.as_ref().is_some_and(|b| b.score > parent_score) {
                break;
            }
            if let Some(c) = self.best_threshold(sample, feature)
                && best.as_ref().is_none_or(|b| c.score > b.score)
            {
                best = Some(c);
            }
        }
        best
    }

    /// Best threshold on one feature, or `None` when the feature is constant
    /// across the sample.
    fn best_threshold(&self, sample: &[usize], feature: usize) -> Option<Candidate> {
        let mut sorted: Vec<(f64, u8)> = sample
            .iter()
            .map(|&i| (self.rows[i][feature], self.labels[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let mut left = vec![0usize; self.n_classes];
        let mut right = vec![0usize; self.n_classes];
        for &(_, label) in &sorted {
            right[usize::from(label)] += 1;
        }

        let mut best: Option<Candidate> = None;
        for k in 0..n - 1 {
            let label = usize::from(sorted[k].1);
            left[label] += 1;
            right[label] -= 1;

            let (lo, hi) = (sorted[k].0, sorted[k + 1].0);
            if lo == hi {
                continue;
            }
            let score = purity_score(&left, k + 1) + purity_score(&right, n - k - 1);
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Candidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    score,
                });
            }
        }
        best
    }
}

/// `sum(c^2) / n`. Maximising the sum of this over both children is the same
/// as minimising their sample-weighted Gini impurity.
fn purity_score(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let sq: usize = counts.iter().map(|c| c * c).sum();
    sq as f64 / n as f64
}

/// Most frequent class, ties to the lower index.
pub(crate) fn majority(counts: &[usize]) -> u8 {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best as u8
}

/// Move indices satisfying `goes_left` to the front; returns the split point.
fn partition(sample: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for k in 0..sample.len() {
        if goes_left(sample[k]) {
            sample.swap(k, mid);
            mid += 1;
        }
    }
    mid
}
