//! Audio Renderer Port - 音频拼接与归一化抽象

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No input files to merge")]
    NoInputs,

    #[error("Render tool not available: {0}")]
    ToolUnavailable(String),

    #[error("Render tool failed ({status}): {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("IO error: {0}")]
    IoError(String),
}

/// Audio Renderer Port
#[async_trait]
pub trait AudioRendererPort: Send + Sync {
    /// 按顺序无重编码拼接，写入 `output`
    async fn merge_sequential(&self, inputs: &[PathBuf], output: &Path)
        -> Result<(), RenderError>;

    /// 响度归一化，写入 `output`
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), RenderError>;
}
