//! Content module - post models, rich text and reading time

mod post;
mod reading;
pub mod rich_text;

pub use post::{Banner, ContentBlock, PostDetail, PostDetailData, PostSummary, PostSummaryData};
pub use post::{RawDocument, RawPostData};
pub use reading::{count_words, estimate_reading_time};
pub use rich_text::{InlineSpan, RichTextElement, SpanKind, TextElement};
