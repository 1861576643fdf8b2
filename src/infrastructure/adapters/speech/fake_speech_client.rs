//! Fake Speech Client - 离线合成客户端
//!
//! 不调用外部服务，按文本长度生成静音 MPEG 音频帧，输出可被 ffmpeg 正常拼接

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{SpeechSynthesizerPort, SynthesisError, SynthesisRequest, Voice};

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo, 无填充
const SILENT_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
const FRAME_LEN: usize = 417;

/// Fake Speech Client 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechClientConfig {
    /// 每帧对应的字符数
    pub chars_per_frame: usize,
    /// 模拟合成延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeSpeechClientConfig {
    fn default() -> Self {
        Self {
            chars_per_frame: 10,
            latency_ms: 0,
        }
    }
}

/// Fake Speech Client
pub struct FakeSpeechClient {
    config: FakeSpeechClientConfig,
}

impl FakeSpeechClient {
    pub fn new(config: FakeSpeechClientConfig) -> Self {
        tracing::info!(
            chars_per_frame = config.chars_per_frame,
            latency_ms = config.latency_ms,
            "FakeSpeechClient initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechClientConfig::default())
    }

    fn silent_audio(&self, text: &str) -> Vec<u8> {
        let frames = (text.chars().count() / self.config.chars_per_frame.max(1)).max(1);
        let mut audio = Vec::with_capacity(frames * FRAME_LEN);
        for _ in 0..frames {
            audio.extend_from_slice(&SILENT_FRAME_HEADER);
            audio.resize(audio.len() + FRAME_LEN - SILENT_FRAME_HEADER.len(), 0);
        }
        audio
    }
}

#[async_trait]
impl SpeechSynthesizerPort for FakeSpeechClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        if request.api_key.trim().is_empty() {
            return Err(SynthesisError::Unauthorized);
        }
        if request.text.trim().is_empty() {
            return Err(SynthesisError::InvalidInput("Empty text".to_string()));
        }

        tracing::debug!(
            voice_id = %request.voice_id,
            text_len = request.text.chars().count(),
            "FakeSpeechClient: returning silent audio"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        Ok(self.silent_audio(&request.text))
    }

    async fn list_voices(&self, api_key: &str) -> Result<Vec<Voice>, SynthesisError> {
        if api_key.trim().is_empty() {
            return Err(SynthesisError::Unauthorized);
        }
        Ok(vec![
            Voice {
                voice_id: "fake-narrator".to_string(),
                name: "Narrator".to_string(),
                category: Some("fake".to_string()),
                preview_url: None,
            },
            Voice {
                voice_id: "fake-guest".to_string(),
                name: "Guest".to_string(),
                category: Some("fake".to_string()),
                preview_url: None,
            },
        ])
    }
}
