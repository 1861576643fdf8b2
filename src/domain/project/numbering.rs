//! Project Context - Chapter Numbering

use super::{Chapter, ChapterNumbering};

/// 标题中第一个数字串，须为正数
pub fn detect_chapter_number(title: &str) -> Option<u32> {
    let start = title.find(|c: char| c.is_ascii_digit())?;
    let digits: String = title[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

/// 按章节顺序分配编号，编号单调递增
///
/// 识别出的编号只有不小于起始编号且不回退时才采用，
/// 否则沿用当前的连续编号。
pub fn assign_sequence_numbers(chapters: &mut [Chapter], numbering: ChapterNumbering) {
    let baseline = numbering.start_number.max(1);
    let mut running = baseline;

    for chapter in chapters.iter_mut() {
        let detected = if numbering.auto_detect {
            detect_chapter_number(&chapter.title).filter(|n| *n >= baseline && *n >= running)
        } else {
            None
        };
        let number = detected.unwrap_or(running);
        chapter.sequence_number = number;
        running = number.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manuscript::ChapterDraft;

    fn chapters(titles: &[&str]) -> Vec<Chapter> {
        titles
            .iter()
            .map(|t| {
                Chapter::from(ChapterDraft {
                    title: t.to_string(),
                    content: "Body.".to_string(),
                    segments: Vec::new(),
                })
            })
            .collect()
    }

    fn numbers(chapters: &[Chapter]) -> Vec<u32> {
        chapters.iter().map(|c| c.sequence_number).collect()
    }

    #[test]
    fn test_detect_chapter_number() {
        assert_eq!(detect_chapter_number("Chapter 12"), Some(12));
        assert_eq!(detect_chapter_number("Part 3: The 2nd Coming"), Some(3));
        assert_eq!(detect_chapter_number("Prologue"), None);
        assert_eq!(detect_chapter_number("Chapter 0"), None);
    }

    #[test]
    fn test_detected_numbers_are_used() {
        let mut list = chapters(&["Chapter 5", "Chapter 6", "Epilogue"]);
        assign_sequence_numbers(&mut list, ChapterNumbering::default());
        assert_eq!(numbers(&list), vec![5, 6, 7]);
    }

    #[test]
    fn test_numbers_never_go_backwards() {
        let mut list = chapters(&["Chapter 3", "Chapter 1", "Chapter 9"]);
        assign_sequence_numbers(&mut list, ChapterNumbering::default());
        assert_eq!(numbers(&list), vec![3, 4, 9]);
    }

    #[test]
    fn test_start_number_without_detection() {
        let mut list = chapters(&["Chapter 1", "Chapter 2"]);
        assign_sequence_numbers(
            &mut list,
            ChapterNumbering {
                start_number: 10,
                auto_detect: false,
            },
        );
        assert_eq!(numbers(&list), vec![10, 11]);
    }

    #[test]
    fn test_detection_below_start_is_ignored() {
        let mut list = chapters(&["Chapter 2", "Chapter 8"]);
        assign_sequence_numbers(
            &mut list,
            ChapterNumbering {
                start_number: 5,
                auto_detect: true,
            },
        );
        assert_eq!(numbers(&list), vec![5, 8]);
    }
}
