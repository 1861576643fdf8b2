//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{ApplicationError, AudioStorageError};
use crate::domain::project::ProjectError;
use crate::infrastructure::worker::ProcessError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Conflict(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = self.message();

        match &self {
            ApiError::NotFound(_) => tracing::warn!(errno, error = %msg, "Resource not found"),
            ApiError::BadRequest(_) => tracing::warn!(errno, error = %msg, "Bad request"),
            ApiError::Conflict(_) => tracing::warn!(errno, error = %msg, "Resource conflict"),
            ApiError::Internal(_) => {
                tracing::error!(errno, error = %msg, "Internal server error")
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::error!(errno, error = %msg, "Service unavailable")
            }
        }

        // 业务错误统一 HTTP 200，由 errno 区分
        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("{} not found: {}", resource_type, id))
            }
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::InvalidState(msg) => ApiError::BadRequest(msg),
            ApplicationError::Conflict(msg) => ApiError::Conflict(msg),
            ApplicationError::RepositoryError(msg) => ApiError::Internal(msg),
            ApplicationError::ExternalServiceError(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::StorageError(msg) => ApiError::Internal(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ProcessError> for ApiError {
    fn from(e: ProcessError) -> Self {
        ApplicationError::from(e).into()
    }
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        ApplicationError::from(e).into()
    }
}

impl From<AudioStorageError> for ApiError {
    fn from(e: AudioStorageError) -> Self {
        match e {
            AudioStorageError::FileNotFound(path) => {
                ApiError::NotFound(format!("Audio not found: {}", path))
            }
            AudioStorageError::InvalidPath(path) => {
                ApiError::BadRequest(format!("Invalid audio path: {}", path))
            }
            AudioStorageError::IoError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_error_mapping() {
        let conflict: ApiError = ApplicationError::conflict("busy").into();
        assert_eq!(conflict.errno(), errno::CONFLICT);

        let invalid: ApiError = ApplicationError::validation("bad").into();
        assert_eq!(invalid.errno(), errno::BAD_REQUEST);

        let upstream: ApiError = ApplicationError::ExternalServiceError("down".into()).into();
        assert_eq!(upstream.errno(), errno::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_process_error_mapping() {
        let running: ApiError = ProcessError::AlreadyRunning("p".into()).into();
        assert_eq!(running.errno(), errno::CONFLICT);

        let empty: ApiError = ProcessError::NothingToCompile.into();
        assert_eq!(empty.errno(), errno::BAD_REQUEST);

        let missing: ApiError = ProcessError::NotFound("p".into()).into();
        assert_eq!(missing.errno(), errno::NOT_FOUND);
    }

    #[test]
    fn test_storage_error_mapping() {
        let traversal: ApiError = AudioStorageError::InvalidPath("../x".into()).into();
        assert_eq!(traversal.errno(), errno::BAD_REQUEST);
    }
}
