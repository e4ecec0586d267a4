use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use homesim_api::restful::ErrorResponse;

use crate::simulate::HomeError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    HomeError(#[from] HomeError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::HomeError(HomeError::DeviceNotFound) => StatusCode::NOT_FOUND,
            ApiError::HomeError(HomeError::InvalidHome(_) | HomeError::RejectedDevice(..)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::HomeError(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Internal error: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
