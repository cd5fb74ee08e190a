use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success response from the backend. `message` is the body's
    /// `error` or `message` field when one was present.
    #[error("Backend error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Backend { status: u16, message: Option<String> },

    #[error("Session expired")]
    SessionExpired,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text to show the user: the backend's own message when it sent one,
    /// otherwise the call site's fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Backend { message: Some(message), .. } => message.clone(),
            AppError::ValidationError(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AppError::SessionExpired
                | AppError::Auth(_)
                | AppError::Backend { status: 401, .. }
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::SessionExpired | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
