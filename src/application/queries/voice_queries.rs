//! Voice Queries

/// 列出合成服务可用音色
#[derive(Debug, Clone)]
pub struct ListVoices {
    pub api_key: String,
}
