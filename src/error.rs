use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unknown session: {0}")]
    SessionNotFound(String),

    #[error("Missing x-session-id header")]
    MissingSession,

    #[error("Login required")]
    LoginRequired,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Locked(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("{0}")]
    Validation(String),

    #[error("Upstream service failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingSession | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LoginRequired | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Locked(_) => StatusCode::FORBIDDEN,
            AppError::DuplicateUsername(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
