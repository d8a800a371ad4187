//! Content source clients
//!
//! Both flows talk to the CMS through the [`ContentSource`] trait. One
//! client is built at startup from the site config and shared by handle.

mod memory;
mod prismic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub use memory::MemorySource;
pub use prismic::PrismicClient;

use crate::config::SourceConfig;
use crate::content::{PostSummary, RawDocument};
use crate::error::{BlogError, Result};

/// One page of query results plus the cursor of the next page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsPage<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl<T> ResultsPage<T> {
    pub fn new(results: Vec<T>, next_page: Option<String>) -> Self {
        Self { results, next_page }
    }
}

impl ResultsPage<RawDocument> {
    /// Map raw records to summaries, keeping order and the cursor.
    /// Records without an identifier cannot be linked and are dropped.
    pub fn into_summaries(self) -> ResultsPage<PostSummary> {
        let results = self
            .results
            .into_iter()
            .filter_map(|raw| {
                let id = raw.id.clone();
                let summary = PostSummary::from_raw(raw);
                if summary.is_none() {
                    tracing::warn!("Dropping record without identifier: {:?}", id);
                }
                summary
            })
            .collect();

        ResultsPage {
            results,
            next_page: self.next_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: usize,
}

impl QueryOptions {
    pub fn page_size(page_size: usize) -> Self {
        Self { page_size }
    }
}

/// Read access to the headless CMS
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of documents of a custom type
    async fn query_by_type(
        &self,
        doc_type: &str,
        options: QueryOptions,
    ) -> Result<ResultsPage<RawDocument>>;

    /// The page a cursor points at. Cursors are passed back verbatim.
    async fn fetch_page(&self, cursor: &str) -> Result<ResultsPage<RawDocument>>;

    /// One document by slug, `None` when it does not exist
    async fn get_by_identifier(&self, doc_type: &str, uid: &str) -> Result<Option<RawDocument>>;

    /// Identifiers of the first page of documents, used to pick the
    /// detail pages that are built ahead of time
    async fn list_identifiers(&self, doc_type: &str, options: QueryOptions) -> Result<Vec<String>> {
        let page = self.query_by_type(doc_type, options).await?;
        Ok(page
            .results
            .iter()
            .filter_map(|raw| raw.identifier().map(str::to_string))
            .collect())
    }
}

/// Build the client described by the config: fixtures take precedence
/// over the remote endpoint.
pub fn from_config(config: &SourceConfig, base_dir: &Path) -> Result<Arc<dyn ContentSource>> {
    if let Some(fixtures) = &config.fixtures {
        let path = base_dir.join(fixtures);
        tracing::info!("Serving posts from fixtures {:?}", path);
        return Ok(Arc::new(MemorySource::from_json_file(&path)?));
    }

    if config.endpoint.is_empty() {
        return Err(BlogError::Config("source.endpoint is not set".to_string()));
    }

    tracing::info!("Using content source {}", config.endpoint);
    Ok(Arc::new(PrismicClient::new(config)?))
}
