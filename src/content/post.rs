//! Post models and their mapping from content-source records

use serde::{Deserialize, Serialize};

use super::rich_text::RichTextElement;

/// A document as returned by the content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,

    #[serde(default)]
    pub first_publication_date: Option<String>,

    #[serde(default)]
    pub data: RawPostData,
}

/// Custom fields of a post document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPostData {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<Banner>,
    pub content: Vec<ContentBlock>,
}

impl RawDocument {
    /// Stable identifier: the slug, falling back to the document id
    pub fn identifier(&self) -> Option<&str> {
        self.uid
            .as_deref()
            .or(self.id.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Banner image of a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// One heading plus its rich-text body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: String,

    #[serde(default)]
    pub body: Vec<RichTextElement>,
}

/// List-view projection of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub data: PostSummaryData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Map a content-source record. Records without any identifier are
    /// dropped since they cannot be linked to.
    pub fn from_raw(raw: RawDocument) -> Option<Self> {
        let uid = raw.identifier()?.to_string();
        Some(Self {
            uid,
            first_publication_date: raw.first_publication_date,
            data: PostSummaryData {
                title: raw.data.title.unwrap_or_default(),
                subtitle: raw.data.subtitle.unwrap_or_default(),
                author: raw.data.author.unwrap_or_default(),
            },
        })
    }
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub data: PostDetailData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetailData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<ContentBlock>,
}

impl PostDetail {
    pub fn from_raw(raw: RawDocument) -> Option<Self> {
        let uid = raw.identifier()?.to_string();
        Some(Self {
            uid,
            first_publication_date: raw.first_publication_date,
            data: PostDetailData {
                title: raw.data.title.unwrap_or_default(),
                subtitle: raw.data.subtitle.unwrap_or_default(),
                author: raw.data.author.unwrap_or_default(),
                banner: raw.data.banner.unwrap_or_default(),
                content: raw.data.content,
            },
        })
    }

    /// Project the detail down to its list-view summary
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date.clone(),
            data: PostSummaryData {
                title: self.data.title.clone(),
                subtitle: self.data.subtitle.clone(),
                author: self.data.author.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "id": "YFzN2xIAACIAs5Yq",
        "uid": "como-utilizar-hooks",
        "type": "posts",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": "Como utilizar Hooks",
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": { "url": "https://images.prismic.io/banner.png", "alt": null },
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        { "type": "paragraph", "text": "Nullam dolor sapien", "spans": [] }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn test_detail_from_raw() {
        let raw: RawDocument = serde_json::from_str(DOCUMENT).unwrap();
        let post = PostDetail::from_raw(raw).unwrap();
        assert_eq!(post.uid, "como-utilizar-hooks");
        assert_eq!(post.data.author, "Joseph Oliveira");
        assert_eq!(post.data.banner.url, "https://images.prismic.io/banner.png");
        assert_eq!(post.data.content.len(), 1);
        assert_eq!(post.data.content[0].heading, "Proin et varius");
    }

    #[test]
    fn test_summary_from_raw() {
        let raw: RawDocument = serde_json::from_str(DOCUMENT).unwrap();
        let summary = PostSummary::from_raw(raw.clone()).unwrap();
        assert_eq!(summary.data.title, "Como utilizar Hooks");
        assert_eq!(
            summary.first_publication_date.as_deref(),
            Some("2021-03-15T19:25:28+0000")
        );
        assert_eq!(PostDetail::from_raw(raw).unwrap().summary(), summary);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let raw: RawDocument =
            serde_json::from_str(r#"{"uid": "bare", "data": {"title": null}}"#).unwrap();
        let post = PostDetail::from_raw(raw).unwrap();
        assert_eq!(post.data.title, "");
        assert_eq!(post.data.banner.url, "");
        assert!(post.data.content.is_empty());
        assert!(post.first_publication_date.is_none());
    }

    #[test]
    fn test_identifier_falls_back_to_id() {
        let raw: RawDocument = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(PostSummary::from_raw(raw).unwrap().uid, "abc");

        let raw: RawDocument = serde_json::from_str(r#"{"uid": ""}"#).unwrap();
        assert!(PostSummary::from_raw(raw).is_none());
    }
}
