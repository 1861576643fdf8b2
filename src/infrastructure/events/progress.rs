//! Progress Events
//!
//! SSE / WebSocket 推送的进度帧，`type` 字段区分类型

use serde::{Deserialize, Serialize};

/// 进度事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    /// 订阅建立后的第一帧
    Connected,
    ChapterStart {
        chapter_index: usize,
        title: String,
    },
    /// segment_index 为章节内分块序号
    SegmentStart {
        chapter_index: usize,
        segment_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
        /// 双音色模式下的音色下标
        #[serde(default, skip_serializing_if = "Option::is_none")]
        voice: Option<usize>,
    },
    SegmentComplete {
        chapter_index: usize,
        segment_index: usize,
        /// 命中已有文件，未调用合成
        cached: bool,
    },
    ChapterMerging {
        chapter_index: usize,
    },
    ChapterComplete {
        chapter_index: usize,
        url: String,
    },
    ChapterSkipped {
        chapter_index: usize,
    },
    ChapterSkippedDemo {
        chapter_index: usize,
    },
    ChapterError {
        chapter_index: usize,
        error: String,
    },
    BookMerging {
        manual: bool,
        chapters: usize,
    },
    ProjectComplete {
        #[serde(default)]
        book_url: Option<String>,
    },
    ProjectError {
        error: String,
    },
}

impl ProgressEvent {
    /// 事件类型名（日志用）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::ChapterStart { .. } => "chapter_start",
            Self::SegmentStart { .. } => "segment_start",
            Self::SegmentComplete { .. } => "segment_complete",
            Self::ChapterMerging { .. } => "chapter_merging",
            Self::ChapterComplete { .. } => "chapter_complete",
            Self::ChapterSkipped { .. } => "chapter_skipped",
            Self::ChapterSkippedDemo { .. } => "chapter_skipped_demo",
            Self::ChapterError { .. } => "chapter_error",
            Self::BookMerging { .. } => "book_merging",
            Self::ProjectComplete { .. } => "project_complete",
            Self::ProjectError { .. } => "project_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let event = ProgressEvent::SegmentStart {
            chapter_index: 2,
            segment_index: 0,
            total: Some(4),
            voice: None,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "segment_start", "chapterIndex": 2, "segmentIndex": 0, "total": 4})
        );

        assert_eq!(
            serde_json::to_value(ProgressEvent::Connected).unwrap(),
            json!({"type": "connected"})
        );

        let complete = ProgressEvent::ProjectComplete {
            book_url: Some("/audio/book/x.mp3".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&complete).unwrap(),
            json!({"type": "project_complete", "bookUrl": "/audio/book/x.mp3"})
        );
    }

    #[test]
    fn test_kind_matches_tag() {
        let event = ProgressEvent::ChapterSkippedDemo { chapter_index: 1 };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.kind());
    }
}
