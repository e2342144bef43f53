use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("capability unavailable: {capability}: {message}")]
    CapabilityUnavailable {
        capability: String,
        message: String,
        retryable: bool,
    },

    #[error("input contract violation: {0}")]
    ContractViolation(String),

    #[error("clarification conflict: {0}")]
    ClarificationConflict(String),

    #[error("no open clarification: {0}")]
    ClarificationMissing(String),

    #[error("determinism violation: {0}")]
    DeterminismViolation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl CoreError {
    pub fn capability(capability: &str, message: impl Into<String>, retryable: bool) -> Self {
        CoreError::CapabilityUnavailable {
            capability: capability.to_string(),
            message: message.into(),
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::CapabilityUnavailable {
                retryable: true,
                ..
            }
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
