//! Project Commands

use crate::domain::project::{DemoLimits, VoiceMode, VoiceSettings};

/// 创建有声书项目命令
#[derive(Debug, Clone, Default)]
pub struct CreateProject {
    pub title: String,
    pub author: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    /// 原始输入，须为正整数
    pub series_number: Option<i64>,
    pub mode: VoiceMode,
    pub voices: Vec<String>,
    pub api_key: String,
    pub settings: VoiceSettings,
    pub voice_settings: Vec<VoiceSettings>,
    /// 原始输入，须为正整数
    pub chapter_limit: Option<i64>,
    pub demo_mode: bool,
    pub demo_limits: Option<DemoLimits>,
    /// 为空时使用配置的默认标记
    pub voice_switch_token: Option<String>,
    /// 首章编号，原始输入，须为正整数
    pub chapter_start_number: Option<i64>,
    /// 缺省为 true
    pub auto_detect_chapter_numbers: Option<bool>,
    /// 手稿全文
    pub manuscript: String,
}
