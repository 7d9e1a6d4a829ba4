//! Response envelopes and error mapping.
//!
//! Every failure reaches the client as
//! `{"success": false, "error": <message>, "code": <CODE>}`.

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use oneul_core::Error;

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
    /// Error code.
    pub code: &'static str,
}

/// Handler error carrying a core `Error`.
#[derive(Debug)]
pub struct ApiError(pub Error);

/// HTTP status for an error.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        Error::UpstreamFormat(_) | Error::Upstream(_) | Error::Storage(_) | Error::Detection(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Config(_) | Error::Serialization(_) | Error::Internal(_) | Error::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// Map a request body failure, keeping oversized bodies distinct.
pub fn body_error(status: StatusCode, message: String) -> Error {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        Error::payload_too_large(message)
    } else {
        Error::invalid_request(message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(body_error(rejection.status(), rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self(body_error(rejection.status(), rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self.0, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.0.to_string(),
                code: self.0.code(),
            }),
        )
            .into_response()
    }
}
