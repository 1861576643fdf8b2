//! Audio Storage Port - 出站端口
//!
//! 输出目录布局（chunks/ chapters/ book/）、存在性检查、原子替换、公开 URL 映射

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 音频存储错误
#[derive(Debug, Error)]
pub enum AudioStorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 音频文件类别，对应输出根目录下的子目录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioKind {
    Chunk,
    Chapter,
    Book,
}

impl AudioKind {
    pub const ALL: [AudioKind; 3] = [AudioKind::Chunk, AudioKind::Chapter, AudioKind::Book];

    pub fn dir_name(&self) -> &'static str {
        match self {
            AudioKind::Chunk => "chunks",
            AudioKind::Chapter => "chapters",
            AudioKind::Book => "book",
        }
    }
}

/// Audio Storage Port
#[async_trait]
pub trait AudioStoragePort: Send + Sync {
    /// 输出根目录
    fn root(&self) -> &Path;

    /// 文件的确定性路径
    fn path_for(&self, kind: AudioKind, file_name: &str) -> PathBuf {
        self.root().join(kind.dir_name()).join(file_name)
    }

    /// 文件的公开 URL（`/audio/<dir>/<name>`）
    fn url_for(&self, kind: AudioKind, file_name: &str) -> String {
        format!("/audio/{}/{}", kind.dir_name(), file_name)
    }

    /// 归一化等中间产物使用的同目录临时路径
    fn scratch_path(&self, target: &Path) -> PathBuf;

    /// 文件是否存在
    async fn exists(&self, path: &Path) -> bool;

    /// 写入音频数据
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), AudioStorageError>;

    /// 用 `source` 替换 `target`（删除旧文件后重命名）
    async fn replace(&self, source: &Path, target: &Path) -> Result<(), AudioStorageError>;

    /// 将 URL 中的相对路径解析为根目录下的真实文件，拒绝越界路径
    async fn resolve(&self, relative: &str) -> Result<PathBuf, AudioStorageError>;
}
