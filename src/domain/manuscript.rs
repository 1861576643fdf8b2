//! Manuscript Segmenter
//!
//! 章节识别、双音色片段切分、按句子的长度受限分块。纯函数，无副作用。

use super::project::VoiceMode;

/// 单次合成请求的默认最大字符数
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4500;

/// 默认音色切换标记
pub const DEFAULT_VOICE_SWITCH_TOKEN: &str = "***";

/// 无章节标题时使用的章节名
pub const FULL_TEXT_TITLE: &str = "Full Text";

/// 分段选项
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// 双音色模式下的切换标记
    pub voice_switch_token: String,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            voice_switch_token: DEFAULT_VOICE_SWITCH_TOKEN.to_string(),
        }
    }
}

/// 分段产出的章节草稿（尚未进入 Project 聚合）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDraft {
    pub title: String,
    pub content: String,
    /// 仅双音色模式非空
    pub segments: Vec<SegmentDraft>,
}

/// 双音色片段草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDraft {
    pub content: String,
    pub voice_index: usize,
}

/// 检查是否为句末标点
#[inline]
fn is_sentence_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '。' | '！' | '？')
}

/// 将手稿切分为章节
///
/// 章节从标题行开始，到下一个标题行或文本结束为止；
/// 没有任何标题行时整篇作为一个 "Full Text" 章节。
pub fn segment(text: &str, mode: VoiceMode, options: &SegmentOptions) -> Vec<ChapterDraft> {
    let headings = find_headings(text);

    let mut chapters: Vec<(String, String)> = Vec::new();
    if headings.is_empty() {
        chapters.push((FULL_TEXT_TITLE.to_string(), text.trim().to_string()));
    } else {
        for (i, (start, title)) in headings.iter().enumerate() {
            let end = headings.get(i + 1).map_or(text.len(), |(next, _)| *next);
            let title = if title.is_empty() {
                format!("Chapter {}", i + 1)
            } else {
                title.clone()
            };
            chapters.push((title, text[*start..end].trim().to_string()));
        }
    }

    chapters
        .into_iter()
        .map(|(title, content)| {
            let segments = match mode {
                VoiceMode::Single => Vec::new(),
                VoiceMode::Dual => split_voice_segments(&content, &options.voice_switch_token),
            };
            ChapterDraft {
                title,
                content,
                segments,
            }
        })
        .collect()
}

/// 扫描标题行，返回 (字节偏移, 标题) 列表
fn find_headings(text: &str) -> Vec<(usize, String)> {
    let mut headings = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if let Some(title) = parse_heading(trimmed) {
            headings.push((offset, title));
        }
        offset += line.len();
    }

    headings
}

/// 标题行：1-3 个 `#`，空白，然后是 "Chapter N" 或首字母大写的标题
fn parse_heading(line: &str) -> Option<String> {
    let markers = line.chars().take_while(|c| *c == '#').count();
    if !(1..=3).contains(&markers) {
        return None;
    }

    let rest = &line[markers..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let title = rest.trim();
    if is_numbered_chapter(title) || is_capitalized_title(title) {
        Some(title.to_string())
    } else {
        None
    }
}

fn is_numbered_chapter(title: &str) -> bool {
    let Some(prefix) = title.get(..7) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case("chapter") {
        return false;
    }
    let rest = &title[7..];
    let digits = rest.trim_start();
    digits.len() < rest.len() && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_capitalized_title(title: &str) -> bool {
    title.chars().next().is_some_and(char::is_uppercase) && !title.contains('#')
}

/// 按音色切换标记切分双音色片段
///
/// voice_index 按片段位置交替（i % 2），空片段被丢弃但仍占位。
pub fn split_voice_segments(text: &str, token: &str) -> Vec<SegmentDraft> {
    let token = match token.trim() {
        "" => DEFAULT_VOICE_SWITCH_TOKEN,
        t => t,
    };

    text.split(token)
        .enumerate()
        .filter_map(|(i, part)| {
            let content = part.trim();
            (!content.is_empty()).then(|| SegmentDraft {
                content: content.to_string(),
                voice_index: i % 2,
            })
        })
        .collect()
}

/// 按句末标点切分句子，保留原文（句间空白归属下一句）
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut after_terminal = false;

    for (idx, ch) in text.char_indices() {
        if is_sentence_terminal(ch) {
            after_terminal = true;
        } else if after_terminal {
            sentences.push(&text[start..idx]);
            start = idx;
            after_terminal = false;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// 长度受限分块
///
/// 贪心累积句子直到下一句会超过 `max_chars`。块是原文的连续切片，
/// 拼接后等于原文；单句超长时整句保留，不截断。
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();
        if current_chars + sentence_chars > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(sentence);
        current_chars += sentence_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// 按字符数截断（保证 UTF-8 边界）
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_headings_yields_full_text() {
        let text = "just some prose.\nno headings here.";
        let chapters = segment(text, VoiceMode::Single, &SegmentOptions::default());

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, FULL_TEXT_TITLE);
        assert_eq!(chapters[0].content, text);
        assert!(chapters[0].segments.is_empty());
    }

    #[test]
    fn test_headings_split_chapters() {
        let text = "Preface text.\n# Chapter 1\nFirst body.\n## The Storm\nSecond body.\n";
        let chapters = segment(text, VoiceMode::Single, &SegmentOptions::default());

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[0].content, "# Chapter 1\nFirst body.");
        assert_eq!(chapters[1].title, "The Storm");
        assert_eq!(chapters[1].content, "## The Storm\nSecond body.");
    }

    #[test]
    fn test_heading_rules() {
        assert_eq!(parse_heading("# Chapter 12"), Some("Chapter 12".to_string()));
        assert_eq!(parse_heading("### chapter 3"), Some("chapter 3".to_string()));
        assert_eq!(parse_heading("## Epilogue"), Some("Epilogue".to_string()));
        assert_eq!(parse_heading("#### Too Deep"), None);
        assert_eq!(parse_heading("#NoSpace"), None);
        assert_eq!(parse_heading("# lowercase title"), None);
        assert_eq!(parse_heading("# Title # with marker"), None);
        assert_eq!(parse_heading("Chapter 1"), None);
    }

    #[test]
    fn test_crlf_headings() {
        let text = "# One\r\nBody one.\r\n# Two\r\nBody two.";
        let chapters = segment(text, VoiceMode::Single, &SegmentOptions::default());
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "One");
        assert_eq!(chapters[1].content, "# Two\r\nBody two.");
    }

    #[test]
    fn test_dual_voice_alternation() {
        let segments = split_voice_segments("A***B***C", DEFAULT_VOICE_SWITCH_TOKEN);
        let voices: Vec<usize> = segments.iter().map(|s| s.voice_index).collect();
        let contents: Vec<&str> = segments.iter().map(|s| s.content.as_str()).collect();

        assert_eq!(voices, vec![0, 1, 0]);
        assert_eq!(contents, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dual_voice_drops_empty_fragments() {
        let segments = split_voice_segments("***  ***B***C", "***");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].content, "B");
        assert_eq!(segments[0].voice_index, 0);
        assert_eq!(segments[1].voice_index, 1);
    }

    #[test]
    fn test_dual_voice_custom_and_blank_token() {
        let custom = split_voice_segments("narrator || guest", "||");
        assert_eq!(custom.len(), 2);
        assert_eq!(custom[1].content, "guest");

        let fallback = split_voice_segments("A***B", "   ");
        assert_eq!(fallback.len(), 2);
    }

    #[test]
    fn test_dual_mode_segments_each_chapter() {
        let text = "# Chapter 1\nHello***World\n# Chapter 2\nOnly one voice";
        let chapters = segment(text, VoiceMode::Dual, &SegmentOptions::default());

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].segments.len(), 2);
        assert_eq!(chapters[0].segments[0].content, "# Chapter 1\nHello");
        assert_eq!(chapters[1].segments.len(), 1);
    }

    #[test]
    fn test_chunk_bounding_reproduces_text() {
        let sentence = "The quick brown fox jumps over the lazy dog here. ";
        let text = sentence.repeat(200);
        assert_eq!(text.chars().count(), 10_000);

        let chunks = chunk(&text, DEFAULT_MAX_CHUNK_CHARS);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= DEFAULT_MAX_CHUNK_CHARS));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunk_keeps_oversized_sentence_whole() {
        let long = format!("{}.", "a".repeat(60));
        let text = format!("Short one. {} Tail", long);
        let chunks = chunk(&text, 20);

        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().any(|c| c.chars().count() > 20));
    }

    #[test]
    fn test_chunk_trailing_text_without_terminator() {
        let chunks = chunk("First. Second without end", 4500);
        assert_eq!(chunks, vec!["First. Second without end".to_string()]);
        assert!(chunk("", 4500).is_empty());
    }

    #[test]
    fn test_split_sentences_handles_runs_and_cjk() {
        let sentences = split_sentences("Wait?! Yes。好的！ok");
        assert_eq!(sentences, vec!["Wait?!", " Yes。", "好的！", "ok"]);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
