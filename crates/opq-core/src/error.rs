use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion provider is not configured")]
    ProviderUnavailable,

    #[error("Unknown operation kind: {0}")]
    UnknownKind(String),

    #[error("Invalid operation: {0}")]
    InvalidInput(String),

    #[error("Operation not found: {0}")]
    NotFound(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn unknown_kind(message: impl Into<String>) -> Self {
        Self::UnknownKind(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Failures of the completion call itself. These are recovered into a
    /// terminal `failed` progress event rather than propagated to callers.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::Api { .. } | Error::Network(_) | Error::Timeout(_)
        )
    }

    /// Errors surfaced synchronously at enqueue time.
    pub fn is_enqueue_rejection(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnavailable | Error::UnknownKind(_) | Error::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
