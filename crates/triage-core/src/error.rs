use thiserror::Error;

/// Raised when operator input cannot be turned into a complete feature vector.
///
/// Assembly never pads a missing field or guesses a value, so every variant
/// means no model was consulted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("history score {0} is outside 0..=5")]
    HistoryScoreOutOfRange(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown department '{0}'")]
pub struct UnknownDepartment(pub String);
