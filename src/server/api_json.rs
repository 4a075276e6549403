use super::error::ApiError;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// A JSON request body whose rejections are reported as `{"error": ...}` 400s.
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection);
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected a request with Content-Type: application/json".to_owned()
            }
            other => other.body_text(),
        };
        ApiError::InvalidRequest(message)
    }
}

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}
