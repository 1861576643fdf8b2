//! Project Context - Entities

use serde::{Deserialize, Serialize};

use crate::domain::manuscript::{ChapterDraft, SegmentDraft};

/// 章节状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Paused,
    Error,
    Skipped,
}

/// 双音色片段状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Skipped,
}

/// 双音色片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub content: String,
    /// 0 或 1，对应项目音色列表下标
    pub voice_index: usize,
    #[serde(default)]
    pub status: SegmentStatus,
    /// 该片段最后一个分块的文件名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl From<SegmentDraft> for Segment {
    fn from(draft: SegmentDraft) -> Self {
        Self {
            content: draft.content,
            voice_index: draft.voice_index,
            status: SegmentStatus::Pending,
            file: None,
        }
    }
}

/// 章节
///
/// 单音色模式 segments 为空，分块由 content 派生；
/// 双音色模式按 segments 顺序派生。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    /// 对外展示的章节编号，创建时分配
    #[serde(default)]
    pub sequence_number: u32,
    pub content: String,
    #[serde(default)]
    pub status: ChapterStatus,
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// 章节音频文件名（chapters/ 下）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 是否以演示模式生成
    #[serde(default)]
    pub demo: bool,
    #[serde(default)]
    pub completed_chunks: usize,
    #[serde(default)]
    pub total_chunks: usize,
}

impl From<ChapterDraft> for Chapter {
    fn from(draft: ChapterDraft) -> Self {
        Self {
            title: draft.title,
            sequence_number: 0,
            content: draft.content,
            status: ChapterStatus::Pending,
            segments: draft.segments.into_iter().map(Segment::from).collect(),
            file: None,
            url: None,
            error: None,
            demo: false,
            completed_chunks: 0,
            total_chunks: 0,
        }
    }
}

impl Chapter {
    pub fn label(&self) -> String {
        format!("Chapter {}", self.sequence_number)
    }

    pub fn is_completed(&self) -> bool {
        self.status == ChapterStatus::Completed
    }

    /// 开始处理（清空上次的错误）
    pub fn begin(&mut self, total_chunks: usize) {
        self.status = ChapterStatus::Processing;
        self.error = None;
        self.total_chunks = total_chunks;
        self.completed_chunks = 0;
    }

    /// 跳过章节，子片段一并跳过
    pub fn skip(&mut self) {
        self.status = ChapterStatus::Skipped;
        for segment in &mut self.segments {
            segment.status = SegmentStatus::Skipped;
        }
    }

    pub fn pause(&mut self) {
        self.status = ChapterStatus::Paused;
    }

    pub fn complete(&mut self, file: String, url: String, demo: bool) {
        self.status = ChapterStatus::Completed;
        self.file = Some(file);
        self.url = Some(url);
        self.demo = demo;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ChapterStatus::Error;
        self.error = Some(message.into());
    }
}
