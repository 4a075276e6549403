use crate::discovery::DiscoveryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage unavailable")]
    StorageUnavailable(anyhow::Error),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn invalid_request(message: &str) -> Self {
        ApiError::InvalidRequest(message.to_owned())
    }

    pub fn not_found(message: &str) -> Self {
        ApiError::NotFound(message.to_owned())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::StorageUnavailable(err)
    }
}

impl From<DiscoveryError> for ApiError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::StorageUnavailable { cause } => ApiError::StorageUnavailable(cause),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::StorageUnavailable(cause) = &self {
            error!("Storage failure: {:#}", cause);
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
