use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::usecase::ports::repo::StoreError;

/// Wraps a [`StoreError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_not_found() => StatusCode::NOT_FOUND,
            StoreError::Busy | StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            StoreError::Internal(err) => format!("{err:#}"),
            other => other.to_string(),
        };
        if status.is_server_error() {
            log::error!("request failed: {detail}");
        } else {
            log::debug!("request rejected ({status}): {detail}");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
