//! Prismic REST API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{ContentSource, QueryOptions, ResultsPage};
use crate::config::SourceConfig;
use crate::content::RawDocument;
use crate::error::{BlogError, Result};

/// Query parameter carrying the access token
const TOKEN_PARAM: &str = "access_token";

/// Client for a Prismic repository's v2 API
pub struct PrismicClient {
    http: Client,
    endpoint: Url,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/')).map_err(|e| {
            BlogError::Config(format!("invalid source.endpoint {}: {}", config.endpoint, e))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("cms-blog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Resolve the ref of the currently published content
    async fn master_ref(&self) -> Result<String> {
        let mut request = self.http.get(self.endpoint.clone());
        if let Some(token) = &self.access_token {
            request = request.query(&[(TOKEN_PARAM, token)]);
        }

        let root: ApiRoot = request.send().await?.error_for_status()?.json().await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| {
                BlogError::ContentSourceUnavailable("API root lists no master ref".to_string())
            })
    }

    async fn search(&self, predicate: &str, page_size: usize) -> Result<ResultsPage<RawDocument>> {
        let master_ref = self.master_ref().await?;
        let url = format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        );

        let mut params = vec![
            ("ref", master_ref),
            ("q", predicate.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(token) = &self.access_token {
            params.push((TOKEN_PARAM, token.clone()));
        }

        tracing::debug!("Querying {} with {}", url, predicate);
        let page: ResultsPage<RawDocument> = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(self.without_token(page))
    }

    /// Strip the access token from the next-page URL before it leaves the
    /// client; `fetch_page` adds it back.
    fn without_token(&self, mut page: ResultsPage<RawDocument>) -> ResultsPage<RawDocument> {
        page.next_page = page.next_page.map(|next| match Url::parse(&next) {
            Ok(mut url) => {
                let kept: Vec<(String, String)> = url
                    .query_pairs()
                    .filter(|(k, _)| k != TOKEN_PARAM)
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                url.query_pairs_mut().clear().extend_pairs(kept);
                url.to_string()
            }
            Err(_) => next,
        });
        page
    }

    /// Accept only cursors pointing back at the configured repository
    fn cursor_url(&self, cursor: &str) -> Result<Url> {
        let mut url = Url::parse(cursor).map_err(|_| BlogError::InvalidCursor(cursor.to_string()))?;
        if url.origin() != self.endpoint.origin() {
            return Err(BlogError::InvalidCursor(cursor.to_string()));
        }
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair(TOKEN_PARAM, token);
        }
        Ok(url)
    }
}

/// `[[at(document.type, "posts")]]`
fn type_predicate(doc_type: &str) -> String {
    format!("[[at(document.type,\"{}\")]]", escape(doc_type))
}

/// `[[at(my.posts.uid, "slug")]]`
fn uid_predicate(doc_type: &str, uid: &str) -> String {
    format!("[[at(my.{}.uid,\"{}\")]]", escape(doc_type), escape(uid))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query_by_type(
        &self,
        doc_type: &str,
        options: QueryOptions,
    ) -> Result<ResultsPage<RawDocument>> {
        self.search(&type_predicate(doc_type), options.page_size).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ResultsPage<RawDocument>> {
        let url = self.cursor_url(cursor)?;
        tracing::debug!("Fetching next page {}", cursor);
        let page: ResultsPage<RawDocument> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(self.without_token(page))
    }

    async fn get_by_identifier(&self, doc_type: &str, uid: &str) -> Result<Option<RawDocument>> {
        let page = self.search(&uid_predicate(doc_type, uid), 1).await?;
        Ok(page.results.into_iter().next())
    }
}
