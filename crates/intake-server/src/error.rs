//! HTTP error mapping
//!
//! Handlers reject with [`ApiError`]; [`handle_rejection`] turns every
//! rejection into a `{ "error": message }` body with a matching status.

use crate::intake::IntakeError;
use intake_records::RecordError;
use intake_storage::StorageError;
use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Error carried through warp rejections
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    /// Response status
    pub status: StatusCode,
    /// Message sent as `error`
    pub message: String,
}

impl warp::reject::Reject for ApiError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    /// Create error with status
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 with `message`
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 for a missing or wrong token
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    /// 404 with `message`
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 500 with `message`
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Reply for this error
    #[must_use]
    pub fn into_response(self) -> warp::reply::Response {
        warp::reply::with_status(
            warp::reply::json(&ErrorBody {
                error: &self.message,
            }),
            self.status,
        )
        .into_response()
    }
}

impl From<RecordError> for ApiError {
    fn from(error: RecordError) -> Self {
        let status = match &error {
            RecordError::Validation(_) => StatusCode::BAD_REQUEST,
            RecordError::NotFound(_) => StatusCode::NOT_FOUND,
            RecordError::Conflict(_) => StatusCode::CONFLICT,
            RecordError::Io { .. } | RecordError::Serde(_) => {
                tracing::error!(error = %error, "student register failure");
                return Self::internal("Student register unavailable");
            }
        };
        Self::new(status, error.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        if error.is_not_found() {
            return Self::not_found(error.to_string());
        }
        tracing::error!(error = %error, "storage failure");
        Self::internal(format!("Storage failed: {error}"))
    }
}

impl From<IntakeError> for ApiError {
    fn from(error: IntakeError) -> Self {
        match error {
            IntakeError::Rejected(message) => Self::bad_request(message),
            IntakeError::NoStudentId => Self::bad_request(IntakeError::NoStudentId.to_string()),
            IntakeError::Record(e) => e.into(),
            IntakeError::Storage(e) => e.into(),
        }
    }
}

/// Convert any rejection into a JSON error reply
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let error = if rejection.is_not_found() {
        ApiError::not_found("Not found")
    } else if let Some(error) = rejection.find::<ApiError>() {
        error.clone()
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "File too large")
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::bad_request(format!("Invalid request body: {e}"))
    } else if let Some(e) = rejection.find::<warp::reject::InvalidQuery>() {
        ApiError::bad_request(e.to_string())
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        ApiError::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content type")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        tracing::error!(?rejection, "unhandled rejection");
        ApiError::internal("Internal server error")
    };

    Ok(error.into_response())
}
