//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{AudioStorageError, RepositoryError, SynthesisError};
use crate::domain::project::ProjectError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 资源冲突（如项目已在运行）
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建冲突错误
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound {
                resource_type: "Project",
                id,
            },
            other => Self::RepositoryError(other.to_string()),
        }
    }
}

impl From<SynthesisError> for ApplicationError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Unauthorized => Self::ValidationError("Invalid API key".to_string()),
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<AudioStorageError> for ApplicationError {
    fn from(err: AudioStorageError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<ProjectError> for ApplicationError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::InvalidId(_) | ProjectError::InvalidTitle(_) => {
                Self::ValidationError(err.to_string())
            }
            ProjectError::ChapterNotFound(_) => Self::InternalError(err.to_string()),
            ProjectError::InvalidTransition { .. } => Self::InvalidState(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_validation() {
        let err: ApplicationError = SynthesisError::Unauthorized.into();
        assert!(matches!(err, ApplicationError::ValidationError(_)));

        let err: ApplicationError = SynthesisError::Timeout.into();
        assert!(matches!(err, ApplicationError::ExternalServiceError(_)));
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let err: ApplicationError = RepositoryError::NotFound("abc".to_string()).into();
        assert_eq!(err.to_string(), "Project not found: abc");
    }
}
