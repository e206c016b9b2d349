use thiserror::Error;

use crate::artifact::Head;

/// Why a classifier head could not produce a prediction.
///
/// No variant carries a fallback class: callers must show an explicit
/// "assessment unavailable" state rather than a guessed risk tier.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("{head} model unavailable: {reason}")]
    ModelUnavailable { head: Head, reason: String },

    #[error("{head} model does not match the serving schema: {detail}")]
    SchemaMismatch { head: Head, detail: String },

    #[error("{head} model produced class index {index}, which has no label")]
    UnknownClass { head: Head, index: u8 },
}
