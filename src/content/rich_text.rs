//! Structured rich text and its HTML serializer
//!
//! The content source delivers rich text as a list of block elements, each
//! carrying plain text plus inline spans addressed by UTF-16 offsets into
//! that text. Rendering preserves block boundaries, groups consecutive list
//! items into one list, and nests inline markup even when spans overlap.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, post_path};

/// A block-level rich text element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RichTextElement {
    Paragraph(TextElement),
    Heading1(TextElement),
    Heading2(TextElement),
    Heading3(TextElement),
    Heading4(TextElement),
    Heading5(TextElement),
    Heading6(TextElement),
    Preformatted(TextElement),
    ListItem(TextElement),
    OListItem(TextElement),
    Image(ImageElement),
    #[serde(other)]
    Unsupported,
}

impl RichTextElement {
    /// Build a plain paragraph
    pub fn paragraph(text: impl Into<String>) -> Self {
        RichTextElement::Paragraph(TextElement::plain(text))
    }

    /// The plain text of a text-bearing element
    pub fn text(&self) -> Option<&str> {
        match self {
            RichTextElement::Paragraph(t)
            | RichTextElement::Heading1(t)
            | RichTextElement::Heading2(t)
            | RichTextElement::Heading3(t)
            | RichTextElement::Heading4(t)
            | RichTextElement::Heading5(t)
            | RichTextElement::Heading6(t)
            | RichTextElement::Preformatted(t)
            | RichTextElement::ListItem(t)
            | RichTextElement::OListItem(t) => Some(&t.text),
            RichTextElement::Image(_) | RichTextElement::Unsupported => None,
        }
    }
}

/// Text plus inline formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<InlineSpan>,
}

impl TextElement {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub alt: Option<String>,
}

/// Inline formatting over `[start, end)` of the element text, in UTF-16 units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineSpan {
    pub start: usize,
    pub end: usize,

    #[serde(flatten)]
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { data: LinkData },
    Label { data: LabelData },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Slug of the target when linking to another document
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelData {
    #[serde(default)]
    pub label: String,
}

impl SpanKind {
    fn open_tag(&self) -> Option<String> {
        match self {
            SpanKind::Strong => Some("<strong>".to_string()),
            SpanKind::Em => Some("<em>".to_string()),
            SpanKind::Hyperlink { data } => {
                let href = match (&data.url, &data.uid) {
                    (Some(url), _) if !url.is_empty() => url.clone(),
                    (_, Some(uid)) if !uid.is_empty() => format!("/{}", post_path(uid)),
                    _ => return None,
                };
                let target = match &data.target {
                    Some(t) => format!(r#" target="{}" rel="noopener""#, html_escape(t)),
                    None => String::new(),
                };
                Some(format!(r#"<a href="{}"{}>"#, html_escape(&href), target))
            }
            SpanKind::Label { data } => Some(format!(
                r#"<span class="{}">"#,
                html_escape(&data.label)
            )),
            SpanKind::Unknown => None,
        }
    }

    fn close_tag(&self) -> &'static str {
        match self {
            SpanKind::Strong => "</strong>",
            SpanKind::Em => "</em>",
            SpanKind::Hyperlink { .. } => "</a>",
            SpanKind::Label { .. } | SpanKind::Unknown => "</span>",
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

/// Serialize rich text elements to HTML
pub fn as_html(elements: &[RichTextElement]) -> String {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for element in elements {
        let list = match element {
            RichTextElement::ListItem(_) => Some(ListKind::Unordered),
            RichTextElement::OListItem(_) => Some(ListKind::Ordered),
            _ => None,
        };

        if open_list != list {
            match open_list {
                Some(ListKind::Unordered) => out.push_str("</ul>"),
                Some(ListKind::Ordered) => out.push_str("</ol>"),
                None => {}
            }
            match list {
                Some(ListKind::Unordered) => out.push_str("<ul>"),
                Some(ListKind::Ordered) => out.push_str("<ol>"),
                None => {}
            }
            open_list = list;
        }

        match element {
            RichTextElement::Paragraph(t) => wrap(&mut out, "p", t),
            RichTextElement::Heading1(t) => wrap(&mut out, "h1", t),
            RichTextElement::Heading2(t) => wrap(&mut out, "h2", t),
            RichTextElement::Heading3(t) => wrap(&mut out, "h3", t),
            RichTextElement::Heading4(t) => wrap(&mut out, "h4", t),
            RichTextElement::Heading5(t) => wrap(&mut out, "h5", t),
            RichTextElement::Heading6(t) => wrap(&mut out, "h6", t),
            RichTextElement::Preformatted(t) => wrap(&mut out, "pre", t),
            RichTextElement::ListItem(t) | RichTextElement::OListItem(t) => wrap(&mut out, "li", t),
            RichTextElement::Image(img) => {
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                    html_escape(&img.url),
                    html_escape(img.alt.as_deref().unwrap_or(""))
                ));
            }
            RichTextElement::Unsupported => {
                tracing::debug!("Skipping unsupported rich text element");
            }
        }
    }

    match open_list {
        Some(ListKind::Unordered) => out.push_str("</ul>"),
        Some(ListKind::Ordered) => out.push_str("</ol>"),
        None => {}
    }

    out
}

/// Plain text of all elements, one line per element
pub fn as_text(elements: &[RichTextElement]) -> String {
    elements
        .iter()
        .filter_map(RichTextElement::text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap(out: &mut String, tag: &str, element: &TextElement) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&render_inline(element));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Render text with its spans applied.
///
/// Spans are opened longest-first at a shared start. When a span closes
/// while spans opened after it are still open, those are closed and
/// reopened around the boundary so the output stays well nested.
fn render_inline(element: &TextElement) -> String {
    let text = &element.text;
    let len: usize = text.chars().map(char::len_utf16).sum();

    let spans: Vec<(&InlineSpan, String)> = element
        .spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= len)
        .filter_map(|s| s.kind.open_tag().map(|tag| (s, tag)))
        .collect();

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<usize> = Vec::new();
    let mut pos = 0;

    let mut chars = text.chars();
    loop {
        close_at(&mut out, &mut open, &spans, pos);

        let mut starting: Vec<usize> = (0..spans.len())
            .filter(|&i| spans[i].0.start == pos)
            .collect();
        starting.sort_by(|&a, &b| spans[b].0.end.cmp(&spans[a].0.end));
        for i in starting {
            out.push_str(&spans[i].1);
            open.push(i);
        }

        let Some(c) = chars.next() else { break };
        match c {
            '\n' => out.push_str("<br />"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
        pos += c.len_utf16();
    }

    out
}

fn close_at(out: &mut String, open: &mut Vec<usize>, spans: &[(&InlineSpan, String)], pos: usize) {
    let Some(lowest) = open.iter().position(|&i| spans[i].0.end <= pos) else {
        return;
    };

    let popped: Vec<usize> = open.drain(lowest..).collect();
    for &i in popped.iter().rev() {
        out.push_str(spans[i].0.kind.close_tag());
    }
    for i in popped {
        if spans[i].0.end > pos {
            out.push_str(&spans[i].1);
            open.push(i);
        }
    }
}
