//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded in the binary. Content-source strings are
//! escaped in the templates; rendered rich text is inserted as-is.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{LabelsConfig, SiteConfig};
use crate::content::PostSummary;
use crate::detail::{DetailState, RenderedPost};
use crate::error::Result;
use crate::helpers::{
    date_xml, format_publication_date, full_url_for, load_more_path, parse_timestamp, post_path,
    url_for, DateFormat,
};
use crate::listing::ListingProps;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
    labels: LabelsConfig,
    date_format: DateFormat,
    config: SiteConfig,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        // Escaping is explicit in the templates
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("loading.html", include_str!("site/loading.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            ("error.html", include_str!("site/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/post_item.html",
                include_str!("site/partials/post_item.html"),
            ),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self {
            tera,
            site: SiteData {
                title: config.title.clone(),
                description: config.description.clone(),
                language: config.language.clone(),
                root: url_for(config, ""),
                logo: url_for(config, "images/logo.svg"),
            },
            labels: config.labels.clone(),
            date_format: config.date.resolve()?,
            config: config.clone(),
        })
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("labels", &self.labels);
        context
    }

    /// Project a summary for display
    pub fn summary_view(&self, summary: &PostSummary) -> Result<SummaryView> {
        let (published, published_iso) = match summary.first_publication_date.as_deref() {
            Some(raw) => (
                Some(format_publication_date(Some(raw), &self.date_format)?),
                Some(date_xml(&parse_timestamp(raw)?)),
            ),
            None => (None, None),
        };

        Ok(SummaryView {
            uid: summary.uid.clone(),
            path: url_for(&self.config, &post_path(&summary.uid)),
            title: summary.data.title.clone(),
            subtitle: summary.data.subtitle.clone(),
            author: summary.data.author.clone(),
            published,
            published_iso,
        })
    }

    /// URL of the load-more endpoint for a cursor
    pub fn next_url(&self, cursor: Option<&str>) -> Option<String> {
        cursor.map(|c| url_for(&self.config, &load_more_path(c)))
    }

    /// Render the home page
    pub fn render_index(&self, props: &ListingProps) -> Result<String> {
        let posts = props
            .initial_results
            .iter()
            .map(|s| self.summary_view(s))
            .collect::<Result<Vec<_>>>()?;

        let mut context = self.base_context();
        context.insert("posts", &posts);
        context.insert("next_url", &self.next_url(props.initial_cursor.as_deref()));
        Ok(self.tera.render("index.html", &context)?)
    }

    /// Render one list item, as appended by the load-more button
    pub fn render_summary_item(&self, post: &SummaryView) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", post);
        Ok(self.tera.render("partials/post_item.html", &context)?)
    }

    /// Render a detail page in whatever state it is in
    pub fn render_detail(&self, state: &DetailState) -> Result<String> {
        match state {
            DetailState::Loading { .. } => self.render_loading(),
            DetailState::Ready(rendered) => self.render_post(rendered),
            DetailState::NotFound { .. } => self.render_not_found(),
        }
    }

    fn render_post(&self, rendered: &RenderedPost) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", &rendered.post);
        context.insert(
            "canonical",
            &full_url_for(&self.config, &post_path(&rendered.post.uid)),
        );
        context.insert("published", &rendered.published);
        context.insert("published_iso", &rendered.published_iso);
        context.insert("reading_time", &rendered.reading_time);
        context.insert("blocks", &rendered.blocks);
        Ok(self.tera.render("post.html", &context)?)
    }

    pub fn render_loading(&self) -> Result<String> {
        Ok(self.tera.render("loading.html", &self.base_context())?)
    }

    pub fn render_not_found(&self) -> Result<String> {
        Ok(self.tera.render("not_found.html", &self.base_context())?)
    }

    pub fn render_error(&self) -> Result<String> {
        Ok(self.tera.render("error.html", &self.base_context())?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub logo: String,
}

/// A post summary as shown in the list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub published: Option<String>,
    pub published_iso: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentBlock, PostDetail, RawDocument, RichTextElement};
    use crate::detail::{render_post, DetailOptions};

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new(&SiteConfig::default()).unwrap()
    }

    fn summary(uid: &str, title: &str) -> PostSummary {
        let raw: RawDocument = serde_json::from_value(serde_json::json!({
            "uid": uid,
            "first_publication_date": "2021-04-19T19:25:28+0000",
            "data": { "title": title, "subtitle": "Sub", "author": "Ana" }
        }))
        .unwrap();
        PostSummary::from_raw(raw).unwrap()
    }

    #[test]
    fn test_render_index_with_more() {
        let props = ListingProps {
            initial_results: vec![summary("a", "Tom & Jerry"), summary("b", "B")],
            initial_cursor: Some("memory://posts?page=2&pageSize=2".to_string()),
        };
        let html = renderer().render_index(&props).unwrap();
        assert!(html.contains(r#"href="/post/a/""#));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(html.contains("19 abr 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("data-next=\"/api/posts?cursor="));
    }

    #[test]
    fn test_render_index_without_more() {
        let props = ListingProps {
            initial_results: vec![summary("a", "A")],
            initial_cursor: None,
        };
        let html = renderer().render_index(&props).unwrap();
        assert!(!html.contains(r#"id="load-more""#));
    }

    #[test]
    fn test_summary_without_date() {
        let mut s = summary("a", "A");
        s.first_publication_date = None;
        let view = renderer().summary_view(&s).unwrap();
        assert!(view.published.is_none());
        let item = renderer().render_summary_item(&view).unwrap();
        assert!(!item.contains("<time"));
    }

    #[test]
    fn test_render_post_page() {
        let post = PostDetail {
            uid: "p".to_string(),
            first_publication_date: Some("2021-04-19T19:25:28+0000".to_string()),
            data: crate::content::PostDetailData {
                title: "Hooks <3".to_string(),
                subtitle: "s".to_string(),
                author: "Ana".to_string(),
                banner: Default::default(),
                content: vec![
                    ContentBlock {
                        heading: "Intro".to_string(),
                        body: vec![RichTextElement::paragraph("hello world foo bar")],
                    },
                    ContentBlock {
                        heading: "Intro".to_string(),
                        body: vec![RichTextElement::paragraph("more")],
                    },
                ],
            },
        };
        let rendered = render_post(post, &DetailOptions::default()).unwrap();
        let html = renderer()
            .render_detail(&DetailState::Ready(Box::new(rendered)))
            .unwrap();
        assert!(html.contains("<h1>Hooks &lt;3</h1>"));
        assert!(html.contains(r#"href="http://localhost:4000/post/p/""#));
        assert!(html.contains("1 min"));
        assert!(html.contains(r#"id="intro-0""#));
        assert!(html.contains(r#"id="intro-1""#));
        assert!(html.contains("<p>hello world foo bar</p>"));
        assert!(!html.contains("class=\"banner\""));
    }

    #[test]
    fn test_zero_minute_post_hides_reading_time() {
        let post = PostDetail::from_raw(
            serde_json::from_value(serde_json::json!({"uid": "empty", "data": {"title": "E"}}))
                .unwrap(),
        )
        .unwrap();
        let rendered = render_post(post, &DetailOptions::default()).unwrap();
        let html = renderer()
            .render_detail(&DetailState::Ready(Box::new(rendered)))
            .unwrap();
        assert!(!html.contains(" min</span>"));
    }

    #[test]
    fn test_render_loading_and_not_found() {
        let r = renderer();
        let loading = r
            .render_detail(&DetailState::Loading {
                uid: "x".to_string(),
            })
            .unwrap();
        assert!(loading.contains("Carregando..."));
        assert!(loading.contains("http-equiv=\"refresh\""));

        let missing = r
            .render_detail(&DetailState::NotFound {
                uid: "x".to_string(),
            })
            .unwrap();
        assert!(missing.contains("Post não encontrado"));
    }

    #[test]
    fn test_truncate_chars_filter() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(3));
        let out = truncate_chars_filter(&tera::Value::from("abcdef"), &args).unwrap();
        assert_eq!(out, tera::Value::from("abc..."));
    }
}
