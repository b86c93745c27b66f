use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use common::{Error, ErrorKind};

/// HTTP face of `common::Error`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::InsufficientData
            | ErrorKind::IndicatorUnavailable
            | ErrorKind::InvalidPrice => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::DataSourceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = json!({ "error": self.0.kind(), "message": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
