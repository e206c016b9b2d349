//! Triage inference: document history scoring, the dual-head classifier and its offline training.

pub mod artifact;
pub mod classifier;
pub mod document;
mod error;
pub mod forest;
pub mod labels;
pub mod pipeline;
pub mod train;
pub mod tree;

pub use artifact::{Head, ModelArtifact};
pub use classifier::{DualHeadClassifier, HeadSummary, Predict};
pub use document::{score_document, score_text};
pub use error::PredictionError;
pub use labels::{LabelSummary, PopulationConfig, dept_label, risk_label, synthesize};
pub use pipeline::{Assessment, TriageError, TriagePipeline};
pub use train::{TrainConfig, TrainedModels, train, train_from_batches};
