//! Project Repository Port - 出站端口
//!
//! 项目聚合的持久化抽象。内存中读写，`persist` 时整体落盘。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::project::{Project, ProjectId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Project Repository Port
///
/// `list` / `get` / `set` / `update` 只作用于内存；`persist` 将全部项目写入持久化存储。
#[async_trait]
pub trait ProjectRepositoryPort: Send + Sync {
    /// 列出所有项目
    fn list(&self) -> Vec<Project>;

    /// 获取项目快照
    fn get(&self, id: &ProjectId) -> Option<Project>;

    /// 插入或替换项目
    fn set(&self, project: Project);

    /// 原地修改项目（持有该项目的写锁）
    fn update(
        &self,
        id: &ProjectId,
        f: &mut dyn FnMut(&mut Project),
    ) -> Result<(), RepositoryError>;

    /// 整体写入持久化存储
    async fn persist(&self) -> Result<(), RepositoryError>;
}

impl dyn ProjectRepositoryPort {
    /// `update` 的泛型封装，返回闭包结果
    pub fn modify<R>(
        &self,
        id: &ProjectId,
        f: impl FnOnce(&mut Project) -> R,
    ) -> Result<R, RepositoryError> {
        let mut f = Some(f);
        let mut out = None;
        self.update(id, &mut |project| {
            if let Some(f) = f.take() {
                out = Some(f(project));
            }
        })?;
        out.ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}
