//! Single post flow: fetch by slug, derive display values, render blocks

use serde::Serialize;

use crate::content::{estimate_reading_time, rich_text, ContentBlock, PostDetail};
use crate::error::Result;
use crate::helpers::{date_xml, format_publication_date, parse_timestamp, DateFormat};
use crate::source::ContentSource;

/// Settings shared by every detail render
#[derive(Debug, Clone)]
pub struct DetailOptions {
    pub doc_type: String,
    pub date_format: DateFormat,
    pub words_per_minute: u32,
}

impl Default for DetailOptions {
    fn default() -> Self {
        Self {
            doc_type: "posts".to_string(),
            date_format: DateFormat::default(),
            words_per_minute: 200,
        }
    }
}

/// One content block ready for the template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    /// Positional key, unique within the post
    pub key: String,
    /// Fragment id derived from the heading, suffixed with the position
    pub anchor: String,
    pub heading: String,
    pub body_html: String,
}

/// A post plus everything derived from it for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPost {
    pub post: PostDetail,
    /// Display date; absent when the post has no publication timestamp
    pub published: Option<String>,
    /// Machine-readable date for `<time datetime>`
    pub published_iso: Option<String>,
    pub reading_time: u32,
    pub blocks: Vec<RenderedBlock>,
}

/// Render one block. The key never depends on the heading text, so
/// repeated headings still produce distinct blocks.
pub fn render_block(index: usize, block: &ContentBlock) -> RenderedBlock {
    let slug = slug::slugify(&block.heading);
    let anchor = if slug.is_empty() {
        format!("section-{}", index)
    } else {
        format!("{}-{}", slug, index)
    };

    RenderedBlock {
        key: format!("block-{}", index),
        anchor,
        heading: block.heading.clone(),
        body_html: rich_text::as_html(&block.body),
    }
}

/// Derive the display values of a post.
///
/// A null timestamp is skipped; a present but malformed one is an error.
pub fn render_post(post: PostDetail, options: &DetailOptions) -> Result<RenderedPost> {
    let (published, published_iso) = match post.first_publication_date.as_deref() {
        Some(raw) => (
            Some(format_publication_date(Some(raw), &options.date_format)?),
            Some(date_xml(&parse_timestamp(raw)?)),
        ),
        None => (None, None),
    };

    let reading_time = estimate_reading_time(&post.data.content, options.words_per_minute);
    let blocks = post
        .data
        .content
        .iter()
        .enumerate()
        .map(|(i, block)| render_block(i, block))
        .collect();

    Ok(RenderedPost {
        post,
        published,
        published_iso,
        reading_time,
        blocks,
    })
}

/// Where a detail page is in its life
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailState {
    /// Identifier known, document not fetched yet
    Loading { uid: String },
    Ready(Box<RenderedPost>),
    NotFound { uid: String },
}

/// Props handed to the detail view; `None` means not found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailProps {
    pub post: Option<PostDetail>,
}

/// State machine driving one detail page: `Loading` moves to `Ready` or
/// `NotFound` exactly once.
#[derive(Debug, Clone)]
pub struct DetailFlow {
    state: DetailState,
}

impl DetailFlow {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            state: DetailState::Loading { uid: uid.into() },
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn into_state(self) -> DetailState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, DetailState::Loading { .. })
    }

    pub fn props(&self) -> DetailProps {
        DetailProps {
            post: match &self.state {
                DetailState::Ready(rendered) => Some(rendered.post.clone()),
                _ => None,
            },
        }
    }

    /// Fetch and render the post. Terminal states are left untouched; on
    /// error the flow stays in `Loading` so it can be resolved again.
    pub async fn resolve(
        &mut self,
        client: &dyn ContentSource,
        options: &DetailOptions,
    ) -> Result<&DetailState> {
        let uid = match &self.state {
            DetailState::Loading { uid } => uid.clone(),
            _ => return Ok(&self.state),
        };

        let raw = client.get_by_identifier(&options.doc_type, &uid).await?;

        self.state = match raw.and_then(PostDetail::from_raw) {
            Some(post) => {
                let rendered = render_post(post, options)?;
                tracing::debug!(
                    "Resolved post {} ({} blocks, {} min)",
                    uid,
                    rendered.blocks.len(),
                    rendered.reading_time
                );
                DetailState::Ready(Box::new(rendered))
            }
            None => {
                tracing::info!("Post not found: {}", uid);
                DetailState::NotFound { uid }
            }
        };

        Ok(&self.state)
    }
}
