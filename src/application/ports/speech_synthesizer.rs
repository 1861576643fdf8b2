//! Speech Synthesizer Port - 语音合成抽象
//!
//! 定义文本转语音的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::project::VoiceSettings;

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 单次合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本（单个分块）
    pub text: String,
    pub voice_id: String,
    /// 项目凭据
    pub api_key: String,
    /// 已合并的音色参数
    pub settings: VoiceSettings,
}

/// 可用音色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Speech Synthesizer Port
///
/// 外部语音合成服务的抽象接口。返回的音频字节不被核心逻辑解析。
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// 合成一段文本，返回编码后的音频
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, SynthesisError>;

    /// 列出凭据可用的音色（同时用于校验凭据）
    async fn list_voices(&self, api_key: &str) -> Result<Vec<Voice>, SynthesisError>;
}
