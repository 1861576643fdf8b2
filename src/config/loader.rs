//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, SynthesisProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `BOOKCAST_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `BOOKCAST_SERVER__PORT=8080`
/// - `BOOKCAST_SYNTHESIS__PROVIDER=fake`
/// - `BOOKCAST_STORAGE__OUTPUT_DIR=/data/output`
/// - `BOOKCAST_AUDIO__FFMPEG_PATH=/usr/local/bin/ffmpeg`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("synthesis.provider", "http")?
        .set_default("synthesis.url", "https://api.elevenlabs.io")?
        .set_default("synthesis.model_id", "eleven_multilingual_v2")?
        .set_default("synthesis.output_format", "mp3_44100_128")?
        .set_default("synthesis.timeout_secs", 120)?
        .set_default("audio.ffmpeg_path", "ffmpeg")?
        .set_default("audio.loudnorm_filter", "loudnorm=I=-16:TP=-1.5:LRA=11")?
        .set_default("audio.sample_rate", 44100)?
        .set_default("storage.output_dir", "data/output")?
        .set_default("storage.data_file", "data/projects.json")?
        .set_default("processing.max_chunk_chars", 4500)?
        .set_default("processing.voice_switch_token", "***")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: BOOKCAST_SYNTHESIS__URL=http://localhost:9000
    builder = builder.add_source(
        Environment::with_prefix("BOOKCAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.synthesis.provider == SynthesisProvider::Http && config.synthesis.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Synthesis URL cannot be empty".to_string(),
        ));
    }

    if config.processing.max_chunk_chars == 0 {
        return Err(ConfigError::ValidationError(
            "max_chunk_chars must be positive".to_string(),
        ));
    }

    if config.processing.voice_switch_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "voice_switch_token cannot be blank".to_string(),
        ));
    }

    if config.storage.data_file.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Data file path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Synthesis Provider: {:?}", config.synthesis.provider);
    tracing::info!("Synthesis URL: {}", config.synthesis.url);
    tracing::info!("Synthesis Timeout: {}s", config.synthesis.timeout_secs);
    tracing::info!("FFmpeg: {:?}", config.audio.ffmpeg_path);
    tracing::info!("Output Directory: {:?}", config.storage.output_dir);
    tracing::info!("Data File: {:?}", config.storage.data_file);
    tracing::info!("Max Chunk Chars: {}", config.processing.max_chunk_chars);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
