//! Project Context - Chunk Plan
//!
//! 每次运行由章节内容重新派生的分块序列。文件名确定，作为幂等缓存键。

use super::{Project, ProjectError, ProjectId, VoiceMode};
use crate::domain::manuscript::{chunk, truncate_chars};

/// 音频文件扩展名
pub const AUDIO_EXTENSION: &str = "mp3";

/// 章节音频文件名：`{projectId}_ch{chapterIndex}.mp3`
pub fn chapter_file_name(project_id: &ProjectId, chapter_index: usize) -> String {
    format!("{}_ch{}.{}", project_id, chapter_index, AUDIO_EXTENSION)
}

/// 整书音频文件名：`{projectId}_audiobook.mp3`
pub fn book_file_name(project_id: &ProjectId) -> String {
    format!("{}_audiobook.{}", project_id, AUDIO_EXTENSION)
}

/// 分块的确定性标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub project_id: ProjectId,
    pub chapter_index: usize,
    /// 章节内的连续序号（双音色模式跨片段连续）
    pub ordinal: usize,
}

impl ChunkKey {
    pub fn new(project_id: ProjectId, chapter_index: usize, ordinal: usize) -> Self {
        Self {
            project_id,
            chapter_index,
            ordinal,
        }
    }

    /// `{projectId}_ch{chapterIndex}_{ordinal}`
    pub fn file_stem(&self) -> String {
        format!(
            "{}_ch{}_{}",
            self.project_id, self.chapter_index, self.ordinal
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem(), AUDIO_EXTENSION)
    }
}

/// 计划中的单个分块
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChunk {
    pub key: ChunkKey,
    /// 双音色模式下所属片段
    pub segment_index: Option<usize>,
    pub voice_index: usize,
    /// 已去除首尾空白，可直接合成
    pub text: String,
}

/// 单章分块计划
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterPlan {
    pub chunks: Vec<PlannedChunk>,
    /// 演示模式下超出上限而跳过的片段
    pub skipped_segments: Vec<usize>,
}

/// 构建章节分块计划
///
/// 演示模式: 内容截断到 char_limit，每片段最多 chunks_per_segment 块，
/// 每章最多 segments_per_chapter 个片段。空白块被丢弃。
pub fn plan_chapter(
    project: &Project,
    chapter_index: usize,
    max_chars: usize,
) -> Result<ChapterPlan, ProjectError> {
    let chapter = project
        .chapter(chapter_index)
        .ok_or(ProjectError::ChapterNotFound(chapter_index))?;

    let demo = project.demo_mode().then(|| *project.demo_limits());
    let mut chunks = Vec::new();
    let mut skipped_segments = Vec::new();
    let mut ordinal = 0;

    let mut push_chunks = |text: &str, segment_index: Option<usize>, voice_index: usize| {
        let source = match demo {
            Some(limits) => truncate_chars(text, limits.char_limit),
            None => text,
        };
        let cap = demo.map_or(usize::MAX, |limits| limits.chunks_per_segment);

        for piece in chunk(source, max_chars)
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .take(cap)
        {
            let text = match demo {
                Some(limits) => truncate_chars(piece, limits.char_limit),
                None => piece,
            };
            chunks.push(PlannedChunk {
                key: ChunkKey::new(project.id().clone(), chapter_index, ordinal),
                segment_index,
                voice_index,
                text: text.to_string(),
            });
            ordinal += 1;
        }
    };

    match project.mode() {
        VoiceMode::Single => push_chunks(&chapter.content, None, 0),
        VoiceMode::Dual => {
            let cap = demo.map_or(usize::MAX, |limits| limits.segments_per_chapter);
            for (segment_index, segment) in chapter.segments.iter().enumerate() {
                if segment_index >= cap {
                    skipped_segments.push(segment_index);
                    continue;
                }
                push_chunks(&segment.content, Some(segment_index), segment.voice_index);
            }
        }
    }

    Ok(ChapterPlan {
        chunks,
        skipped_segments,
    })
}

#[cfg(test)]
mod tests {
    use super::super::aggregate::tests::new_project;
    use super::*;

    #[test]
    fn test_single_mode_plan() {
        let project = Project::new(new_project(
            "# Chapter 1\nOne. Two. Three.",
            VoiceMode::Single,
        ));
        let plan = plan_chapter(&project, 0, 12).unwrap();

        let ordinals: Vec<usize> = plan.chunks.iter().map(|c| c.key.ordinal).collect();
        assert_eq!(ordinals, (0..plan.chunks.len()).collect::<Vec<_>>());
        assert!(plan.chunks.iter().all(|c| c.voice_index == 0));
        assert!(plan.chunks.iter().all(|c| c.segment_index.is_none()));
        assert_eq!(plan.chunks[0].text, "# Chapter 1\nOne.");
    }

    #[test]
    fn test_dual_mode_running_ordinal() {
        let text = "# Chapter 1\nFirst. Second.***Reply one. Reply two.";
        let project = Project::new(new_project(text, VoiceMode::Dual));
        let plan = plan_chapter(&project, 0, 12).unwrap();

        let keys: Vec<(usize, Option<usize>, usize)> = plan
            .chunks
            .iter()
            .map(|c| (c.key.ordinal, c.segment_index, c.voice_index))
            .collect();
        let last_first_segment = keys.iter().filter(|k| k.1 == Some(0)).count();

        assert_eq!(keys[0], (0, Some(0), 0));
        assert_eq!(keys[last_first_segment], (last_first_segment, Some(1), 1));
        assert!(plan.skipped_segments.is_empty());
    }

    #[test]
    fn test_demo_truncation_and_caps() {
        let body = "Sentence number one. ".repeat(100);
        let text = format!("# Chapter 1\n{body}***{body}***{body}");
        let mut input = new_project(&text, VoiceMode::Dual);
        input.demo_mode = true;
        input.demo_limits.char_limit = 50;
        let project = Project::new(input);

        let plan = plan_chapter(&project, 0, 20).unwrap();

        assert_eq!(plan.chunks.len(), 2);
        assert_eq!(plan.skipped_segments, vec![2]);
        assert!(plan.chunks.iter().all(|c| c.text.chars().count() <= 50));
        assert_eq!(plan.chunks[1].key.ordinal, 1);
    }

    #[test]
    fn test_chunk_key_file_stem() {
        let project = Project::new(new_project("Text.", VoiceMode::Single));
        let key = ChunkKey::new(project.id().clone(), 3, 7);
        assert_eq!(key.file_stem(), format!("{}_ch3_7", project.id()));
        assert_eq!(key.file_name(), format!("{}_ch3_7.mp3", project.id()));
        assert_eq!(
            chapter_file_name(project.id(), 3),
            format!("{}_ch3.mp3", project.id())
        );
        assert_eq!(
            book_file_name(project.id()),
            format!("{}_audiobook.mp3", project.id())
        );
    }

    #[test]
    fn test_missing_chapter() {
        let project = Project::new(new_project("Text.", VoiceMode::Single));
        assert!(matches!(
            plan_chapter(&project, 4, 100),
            Err(ProjectError::ChapterNotFound(4))
        ));
    }
}
