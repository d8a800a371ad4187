//! In-memory content source
//!
//! Serves documents from a JSON fixture file for local previews. Tests use
//! it as a stand-in for the CMS: pages can be registered under arbitrary
//! cursors, failures injected, and fetches held open behind a gate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::{ContentSource, QueryOptions, ResultsPage};
use crate::content::RawDocument;
use crate::error::{BlogError, Result};

/// Content source backed by a vector of documents
#[derive(Default)]
pub struct MemorySource {
    documents: Vec<RawDocument>,
    pages: HashMap<String, ResultsPage<RawDocument>>,
    failures: AtomicUsize,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl MemorySource {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// Load documents from a JSON array of CMS records
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let documents: Vec<RawDocument> = serde_json::from_str(&content).map_err(|e| {
            BlogError::Config(format!("invalid fixtures file {:?}: {}", path, e))
        })?;
        tracing::debug!("Loaded {} fixture documents", documents.len());
        Ok(Self::new(documents))
    }

    /// Serve `page` for `cursor`, ahead of the generated pagination
    pub fn with_page(mut self, cursor: &str, page: ResultsPage<RawDocument>) -> Self {
        self.pages.insert(cursor.to_string(), page);
        self
    }

    /// Hold every request until the gate is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make the next `n` requests fail as if the backend were down
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Number of requests served or failed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(BlogError::ContentSourceUnavailable(
                "injected failure".to_string(),
            ));
        }
        Ok(())
    }

    fn of_type<'a>(&'a self, doc_type: &'a str) -> impl Iterator<Item = &'a RawDocument> + 'a {
        self.documents
            .iter()
            .filter(move |d| d.doc_type.as_deref().map_or(true, |t| t == doc_type))
    }

    fn page(&self, doc_type: &str, page: usize, page_size: usize) -> ResultsPage<RawDocument> {
        let page_size = page_size.max(1);
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let total = self.of_type(doc_type).count();

        let results = self
            .of_type(doc_type)
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();
        let next_page = (start.saturating_add(page_size) < total)
            .then(|| format!("memory://{}?page={}&pageSize={}", doc_type, page + 1, page_size));

        ResultsPage::new(results, next_page)
    }
}

/// Parse a cursor produced by [`MemorySource::page`]
fn parse_cursor(cursor: &str) -> Option<(String, usize, usize)> {
    let rest = cursor.strip_prefix("memory://")?;
    let (doc_type, query) = rest.split_once('?')?;
    let mut page = None;
    let mut page_size = None;
    for pair in query.split('&') {
        match pair.split_once('=')? {
            ("page", v) => page = v.parse().ok(),
            ("pageSize", v) => page_size = v.parse().ok(),
            _ => {}
        }
    }
    let page = page.filter(|&p: &usize| p >= 1)?;
    let page_size = page_size.filter(|&s: &usize| s >= 1)?;
    // The page must start and end within addressable range
    (page - 1).checked_mul(page_size)?.checked_add(page_size)?;
    Some((doc_type.to_string(), page, page_size))
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query_by_type(
        &self,
        doc_type: &str,
        options: QueryOptions,
    ) -> Result<ResultsPage<RawDocument>> {
        self.enter().await?;
        Ok(self.page(doc_type, 1, options.page_size))
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ResultsPage<RawDocument>> {
        self.enter().await?;

        if let Some(page) = self.pages.get(cursor) {
            return Ok(page.clone());
        }

        let (doc_type, page, page_size) =
            parse_cursor(cursor).ok_or_else(|| BlogError::InvalidCursor(cursor.to_string()))?;
        Ok(self.page(&doc_type, page, page_size))
    }

    async fn get_by_identifier(&self, doc_type: &str, uid: &str) -> Result<Option<RawDocument>> {
        self.enter().await?;
        Ok(self
            .of_type(doc_type)
            .find(|d| d.identifier() == Some(uid))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(uid: &str) -> RawDocument {
        serde_json::from_value(serde_json::json!({
            "uid": uid,
            "type": "posts",
            "data": { "title": uid }
        }))
        .unwrap()
    }

    fn uids(page: &ResultsPage<RawDocument>) -> Vec<&str> {
        page.results.iter().filter_map(|d| d.identifier()).collect()
    }

    #[tokio::test]
    async fn test_generated_pagination() {
        let source = MemorySource::new(vec![doc("a"), doc("b"), doc("c")]);

        let first = source
            .query_by_type("posts", QueryOptions::page_size(2))
            .await
            .unwrap();
        assert_eq!(uids(&first), vec!["a", "b"]);

        let cursor = first.next_page.unwrap();
        let second = source.fetch_page(&cursor).await.unwrap();
        assert_eq!(uids(&second), vec!["c"]);
        assert!(second.next_page.is_none());
    }

    #[tokio::test]
    async fn test_registered_page_wins() {
        let source = MemorySource::new(vec![])
            .with_page("page2", ResultsPage::new(vec![doc("d")], None));
        let page = source.fetch_page("page2").await.unwrap();
        assert_eq!(uids(&page), vec!["d"]);
    }

    #[tokio::test]
    async fn test_unknown_cursor_is_rejected() {
        let source = MemorySource::new(vec![doc("a")]);
        let err = source.fetch_page("https://evil.example/").await.unwrap_err();
        assert!(matches!(err, BlogError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_get_by_identifier() {
        let source = MemorySource::new(vec![doc("a"), doc("b")]);
        let found = source.get_by_identifier("posts", "b").await.unwrap();
        assert_eq!(found.unwrap().identifier(), Some("b"));
        assert!(source
            .get_by_identifier("posts", "zzz")
            .await
            .unwrap()
            .is_none());
        assert!(source
            .get_by_identifier("pages", "a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let source = MemorySource::new(vec![doc("a")]);
        source.fail_next(1);

        let err = source
            .query_by_type("posts", QueryOptions::page_size(1))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(source
            .query_by_type("posts", QueryOptions::page_size(1))
            .await
            .is_ok());
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        fs::write(&path, r#"[{"uid": "a", "type": "posts", "data": {}}]"#).unwrap();
        let source = MemorySource::from_json_file(&path).unwrap();
        assert_eq!(source.documents.len(), 1);

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            MemorySource::from_json_file(&path),
            Err(BlogError::Config(_))
        ));
    }

    #[test]
    fn test_parse_cursor() {
        assert_eq!(
            parse_cursor("memory://posts?page=3&pageSize=2"),
            Some(("posts".to_string(), 3, 2))
        );
        assert_eq!(parse_cursor("memory://posts?page=0&pageSize=2"), None);
        assert_eq!(parse_cursor("page2"), None);
        assert_eq!(parse_cursor("memory://posts?page=2&pageSize=0"), None);
    }

    #[tokio::test]
    async fn test_out_of_range_cursor_is_rejected() {
        let source = MemorySource::new(vec![doc("a")]);
        let huge = format!("memory://posts?page={}&pageSize=2", usize::MAX);
        let err = source.fetch_page(&huge).await.unwrap_err();
        assert!(matches!(err, BlogError::InvalidCursor(_)));

        let wide = format!("memory://posts?page=2&pageSize={}", usize::MAX);
        assert!(matches!(
            source.fetch_page(&wide).await,
            Err(BlogError::InvalidCursor(_))
        ));
    }
}
