use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionVarError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Domain error in {context}: {reason}")]
    DomainError { context: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl OptionVarError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        OptionVarError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn domain(context: &str, reason: impl Into<String>) -> Self {
        OptionVarError::DomainError {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for OptionVarError {
    fn from(e: serde_json::Error) -> Self {
        OptionVarError::SerializationError(e.to_string())
    }
}
