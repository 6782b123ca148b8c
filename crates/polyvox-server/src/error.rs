//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use polyvox_core::{error_status, Error, StatusReport};

/// An error returned to the client as `{"status": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Failed generation, keeping the status line front-ends display.
    pub fn from_report(err: &Error, report: StatusReport) -> Self {
        Self::generation_failed(err, report.status)
    }

    fn generation_failed(err: &Error, message: String) -> Self {
        if !err.is_user_input() {
            warn!("Speech generation failed: {}", err);
        }
        Self {
            status: status_for(err),
            message,
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidInput(_) | Error::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
        Error::Backend { .. } | Error::Connection(_) | Error::InferenceError(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Io(_) | Error::Wav(_) | Error::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::generation_failed(&err, error_status(&err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "status": self.message }))).into_response()
    }
}
