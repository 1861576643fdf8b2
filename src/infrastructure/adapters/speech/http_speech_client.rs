//! HTTP Speech Client - 调用 ElevenLabs 兼容的语音合成服务
//!
//! 外部 API:
//! POST {base}/v1/text-to-speech/{voice_id}?output_format=mp3_44100_128
//!   Header: xi-api-key
//!   Request: {"text": "...", "model_id": "...", "voice_settings": {...}}
//!   Response: audio/mpeg binary
//! GET {base}/v2/voices
//!   Header: xi-api-key
//!   Response: {"voices": [{"voice_id": "...", "name": "...", ...}]}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{SpeechSynthesizerPort, SynthesisError, SynthesisRequest, Voice};
use crate::domain::project::VoiceSettings;

const API_KEY_HEADER: &str = "xi-api-key";

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SynthesisHttpRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettingsBody,
}

/// 缺省字段补默认值后的音色参数
#[derive(Debug, Serialize, PartialEq)]
struct VoiceSettingsBody {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    speed: f32,
    use_speaker_boost: bool,
}

impl From<&VoiceSettings> for VoiceSettingsBody {
    fn from(settings: &VoiceSettings) -> Self {
        Self {
            stability: settings.stability.unwrap_or(0.5),
            similarity_boost: settings.similarity_boost.unwrap_or(0.75),
            style: settings.style.unwrap_or(0.0),
            speed: settings.speed.unwrap_or(1.0),
            use_speaker_boost: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VoicesHttpResponse {
    #[serde(default)]
    voices: Vec<VoiceHttpItem>,
}

#[derive(Debug, Deserialize)]
struct VoiceHttpItem {
    voice_id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
}

impl From<VoiceHttpItem> for Voice {
    fn from(item: VoiceHttpItem) -> Self {
        Self {
            voice_id: item.voice_id,
            name: item.name,
            category: item.category,
            preview_url: item.preview_url,
        }
    }
}

/// HTTP 合成客户端配置
#[derive(Debug, Clone)]
pub struct HttpSpeechClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    pub model_id: String,
    pub output_format: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpSpeechClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_output_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = output_format.into();
        self
    }
}

/// HTTP 合成客户端
pub struct HttpSpeechClient {
    client: Client,
    config: HttpSpeechClientConfig,
}

impl HttpSpeechClient {
    pub fn new(config: HttpSpeechClientConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn synthesis_url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{}", self.base(), voice_id)
    }

    fn voices_url(&self) -> String {
        format!("{}/v2/voices", self.base())
    }
}

fn map_send_error(e: reqwest::Error) -> SynthesisError {
    if e.is_timeout() {
        SynthesisError::Timeout
    } else if e.is_connect() {
        SynthesisError::NetworkError(format!("Cannot connect to synthesis service: {}", e))
    } else {
        SynthesisError::NetworkError(e.to_string())
    }
}

/// 按状态码归类服务端错误
fn map_status(status: StatusCode, body: String) -> SynthesisError {
    let quota = body.contains("quota");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if quota => {
            SynthesisError::QuotaExceeded(body)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SynthesisError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
            SynthesisError::QuotaExceeded(body)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::NOT_FOUND => {
            SynthesisError::InvalidInput(format!("HTTP {}: {}", status, body))
        }
        _ => SynthesisError::ServiceError(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl SpeechSynthesizerPort for HttpSpeechClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        let body = SynthesisHttpRequest {
            text: &request.text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettingsBody::from(&request.settings),
        };

        tracing::debug!(
            voice_id = %request.voice_id,
            text_len = request.text.chars().count(),
            "Sending synthesis request"
        );

        let response = self
            .client
            .post(self.synthesis_url(&request.voice_id))
            .query(&[("output_format", self.config.output_format.as_str())])
            .header(API_KEY_HEADER, &request.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status(status, error_text));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio.is_empty() {
            return Err(SynthesisError::InvalidResponse("Empty audio body".to_string()));
        }

        tracing::debug!(
            voice_id = %request.voice_id,
            audio_size = audio.len(),
            "Synthesis completed"
        );

        Ok(audio)
    }

    async fn list_voices(&self, api_key: &str) -> Result<Vec<Voice>, SynthesisError> {
        let response = self
            .client
            .get(self.voices_url())
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status(status, error_text));
        }

        let body: VoicesHttpResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(e.to_string()))?;

        Ok(body.voices.into_iter().map(Voice::from).collect())
    }
}
