use thiserror::Error;

#[derive(Debug, Error)]
pub enum DealCalcError {
    /// A mandatory figure is zero or missing, so there is nothing to compute yet.
    #[error("Insufficient input: {field} ({reason})")]
    InsufficientInput { field: String, reason: String },

    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DealCalcError {
    /// Build the error an adapter reports when an engine call returns `None`.
    pub fn insufficient(field: &str, reason: &str) -> Self {
        DealCalcError::InsufficientInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DealCalcError {
    fn from(e: serde_json::Error) -> Self {
        DealCalcError::SerializationError(e.to_string())
    }
}
