//! Reading time estimation

use super::post::ContentBlock;
use super::rich_text;

/// Count whitespace-separated words in every heading and body element
pub fn count_words(blocks: &[ContentBlock]) -> usize {
    blocks
        .iter()
        .map(|block| {
            let heading = block.heading.split_whitespace().count();
            let body = rich_text::as_text(&block.body).split_whitespace().count();
            heading + body
        })
        .sum()
}

/// Estimated reading time in whole minutes, rounded up.
///
/// Content without any words reads in 0 minutes; there is no one-minute
/// floor, and templates hide the estimate in that case.
pub fn estimate_reading_time(blocks: &[ContentBlock], words_per_minute: u32) -> u32 {
    let words_per_minute = words_per_minute.max(1) as usize;
    let minutes = count_words(blocks).div_ceil(words_per_minute);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{RichTextElement, TextElement};

    fn block(heading: &str, body: &[&str]) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            body: body.iter().map(|t| RichTextElement::paragraph(*t)).collect(),
        }
    }

    #[test]
    fn test_single_block_example() {
        let blocks = vec![block("Intro", &["hello world foo bar"])];
        assert_eq!(count_words(&blocks), 5);
        assert_eq!(estimate_reading_time(&blocks, 200), 1);
    }

    #[test]
    fn test_empty_content_is_zero_minutes() {
        assert_eq!(estimate_reading_time(&[], 200), 0);
        let blank = vec![block("   ", &["", "\n"])];
        assert_eq!(count_words(&blank), 0);
        assert_eq!(estimate_reading_time(&blank, 200), 0);
    }

    #[test]
    fn test_rounds_up() {
        let words = vec!["word"; 200].join(" ");
        let exact = vec![block("", &[words.as_str()])];
        assert_eq!(estimate_reading_time(&exact, 200), 1);

        let one_more = vec![block("extra", &[words.as_str()])];
        assert_eq!(estimate_reading_time(&one_more, 200), 2);
    }

    #[test]
    fn test_counts_all_text_elements() {
        let blocks = vec![ContentBlock {
            heading: "Two words".to_string(),
            body: vec![
                RichTextElement::paragraph("one  two\tthree"),
                RichTextElement::ListItem(TextElement::plain("four")),
                RichTextElement::Unsupported,
            ],
        }];
        assert_eq!(count_words(&blocks), 6);
    }

    #[test]
    fn test_doubling_words_never_decreases_estimate() {
        for n in [0usize, 1, 150, 199, 200, 201, 999] {
            let text = vec!["w"; n].join(" ");
            let doubled = vec!["w"; n * 2].join(" ");
            let single = estimate_reading_time(&[block("", &[text.as_str()])], 200);
            let double = estimate_reading_time(&[block("", &[doubled.as_str()])], 200);
            assert!(double >= single, "n = {}", n);
        }
    }

    #[test]
    fn test_deterministic() {
        let blocks = vec![block("Intro", &["a b c"]), block("Intro", &["d e"])];
        assert_eq!(
            estimate_reading_time(&blocks, 200),
            estimate_reading_time(&blocks.clone(), 200)
        );
    }
}
