//! Project Context - Errors

use thiserror::Error;

use super::ProjectStatus;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("无效的项目 ID: {0}")]
    InvalidId(String),

    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("章节不存在: {0}")]
    ChapterNotFound(usize),

    #[error("非法状态迁移: {from} -> {to}")]
    InvalidTransition {
        from: ProjectStatus,
        to: ProjectStatus,
    },
}
