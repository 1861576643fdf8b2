//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::manuscript::{DEFAULT_MAX_CHUNK_CHARS, DEFAULT_VOICE_SWITCH_TOKEN};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 音频渲染配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 处理流水线配置
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 语音合成后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    /// ElevenLabs 兼容的 HTTP 服务
    #[default]
    Http,
    /// 离线假实现（开发 / 演示用）
    Fake,
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub provider: SynthesisProvider,

    /// 合成服务基础 URL
    #[serde(default = "default_synthesis_url")]
    pub url: String,

    /// 模型 ID
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// 输出格式（作为查询参数透传）
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,
}

fn default_synthesis_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_synthesis_timeout() -> u64 {
    120
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::default(),
            url: default_synthesis_url(),
            model_id: default_model_id(),
            output_format: default_output_format(),
            timeout_secs: default_synthesis_timeout(),
        }
    }
}

/// 音频渲染配置（ffmpeg）
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// ffmpeg 可执行文件
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// 响度归一化滤镜参数
    #[serde(default = "default_loudnorm_filter")]
    pub loudnorm_filter: String,

    /// 归一化输出采样率（Hz）
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_loudnorm_filter() -> String {
    "loudnorm=I=-16:TP=-1.5:LRA=11".to_string()
}

fn default_sample_rate() -> u32 {
    44100
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            loudnorm_filter: default_loudnorm_filter(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 音频输出根目录（含 chunks/ chapters/ book/）
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 项目文档（JSON）路径
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/projects.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            data_file: default_data_file(),
        }
    }
}

/// 处理流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// 单次合成最大字符数
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// 默认音色切换标记
    #[serde(default = "default_voice_switch_token")]
    pub voice_switch_token: String,
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_voice_switch_token() -> String {
    DEFAULT_VOICE_SWITCH_TOKEN.to_string()
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            voice_switch_token: default_voice_switch_token(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.synthesis.provider, SynthesisProvider::Http);
        assert_eq!(config.synthesis.model_id, "eleven_multilingual_v2");
        assert_eq!(config.processing.max_chunk_chars, 4500);
        assert_eq!(config.processing.voice_switch_token, "***");
        assert_eq!(config.audio.sample_rate, 44100);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.public_base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_provider_deserialize() {
        let provider: SynthesisProvider = serde_json::from_str("\"fake\"").unwrap();
        assert_eq!(provider, SynthesisProvider::Fake);
    }
}
