use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A server-side configuration error (missing upstream credential).
    #[error("Server configuration error: {0}")]
    Configuration(String),

    /// The request origin is not on the allow-list.
    #[error("Origin not allowed")]
    Unauthorized,

    /// A rate limit exceeded error.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The upstream model API returned an error.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// A network failure talking to the upstream or the proxy.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Model output could not be parsed into the expected structure.
    #[error("Malformed upstream content: {0}")]
    MalformedContent(String),

    /// The session credential is missing or expired (development mode).
    #[error("API key expired or not set")]
    CredentialExpired,

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Configuration(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Server configuration error: {}", msg),
                    None,
                )
            }

            AppError::Unauthorized => {
                tracing::warn!("Blocked request from unauthorized origin");
                (
                    StatusCode::FORBIDDEN,
                    "Forbidden".to_string(),
                    Some("This API is only accessible from the Crisper application".to_string()),
                )
            }

            AppError::RateLimitExceeded(ref msg) => {
                tracing::warn!("Rate limit exceeded: {}", msg);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too Many Requests".to_string(),
                    Some(msg.clone()),
                )
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone(), None)
            }

            AppError::Upstream { status, ref message } => {
                tracing::warn!("Upstream error ({}): {}", status, message);
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    message.clone(),
                    None,
                )
            }

            AppError::Network(ref e) => {
                tracing::error!("Network error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream request failed".to_string(),
                    None,
                )
            }

            AppError::MalformedContent(ref msg) => {
                tracing::warn!("Malformed upstream content: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to parse recipe data. Please try again.".to_string(),
                    None,
                )
            }

            AppError::CredentialExpired => {
                tracing::debug!("Session credential missing or expired");
                (
                    StatusCode::UNAUTHORIZED,
                    "API key expired or not set. Please enter your Gemini API key.".to_string(),
                    None,
                )
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Encryption error".to_string(),
                    None,
                )
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match message {
            Some(msg) => sonic_rs::to_string(&sonic_rs::json!({
                "error": error,
                "message": msg
            })),
            None => sonic_rs::to_string(&sonic_rs::json!({
                "error": error
            })),
        }
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
