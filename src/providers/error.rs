//! Error types for the provider clients.

use thiserror::Error;

/// Errors that can occur while talking to a travel data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Provider answered with a non-success status.
    #[error("{provider} returned status: {status}")]
    HttpStatus {
        /// Provider display name.
        provider: &'static str,
        /// Status code returned.
        status: reqwest::StatusCode,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Provider payload did not have the expected shape.
    #[error("Unexpected response from {provider}: {detail}")]
    UnexpectedResponse {
        /// Provider display name.
        provider: &'static str,
        /// What was wrong with the payload.
        detail: String,
    },

    /// API key required but not configured.
    #[error("API key required for {0}")]
    ApiKeyRequired(&'static str),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
