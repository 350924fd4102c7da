use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("completion provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("completion provider returned a malformed response: {0}")]
    ProviderMalformedResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl RelayError {
    /// Stable code exposed to callers. Diagnostic detail stays in `Display`.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::ProviderUnavailable(_) | RelayError::ProviderMalformedResponse(_) => {
                "provider_unavailable"
            }
            RelayError::Config(_) | RelayError::Io(_) | RelayError::Serde(_) => "internal_error",
        }
    }

    /// Sanitized text safe to return across the HTTP boundary.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::InvalidInput(reason) => reason.clone(),
            RelayError::ProviderUnavailable(_) | RelayError::ProviderMalformedResponse(_) => {
                "The assistant is unavailable, try again later".to_string()
            }
            _ => "Unexpected server error".to_string(),
        }
    }

    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            RelayError::ProviderUnavailable(_) | RelayError::ProviderMalformedResponse(_)
        )
    }
}
