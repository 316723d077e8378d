//! エラー型定義
//!
//! 統一エラー型（thiserror使用）

use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration source error (file or environment)
    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Common layer result type
pub type CommonResult<T> = Result<T, CommonError>;

/// coordinator error type
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Endpoint not found
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    /// No endpoint is currently eligible for traffic
    #[error("No available endpoints")]
    NoEndpointsAvailable,

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl CoordinatorError {
    /// Returns a safe error message for external clients.
    ///
    /// Internal details such as backend URLs stay in the `Display` output,
    /// which is only written to server logs.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::Common(CommonError::Validation(_)) => "Invalid request",
            Self::Common(_) => "Request error",
            Self::EndpointNotFound(_) => "Endpoint not found",
            Self::NoEndpointsAvailable => "No available endpoints",
            Self::Http(_) => "Backend service unavailable",
        }
    }
}

/// coordinator result type
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
