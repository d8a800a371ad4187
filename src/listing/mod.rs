//! Incremental post listing
//!
//! A [`ListingController`] holds the summaries shown on the home page and
//! the cursor of the next page. `load_more` follows the cursor and appends
//! the next page; at most one load runs at a time and a failed load leaves
//! the state exactly as it was.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::content::PostSummary;
use crate::error::Result;
use crate::source::{ContentSource, QueryOptions, ResultsPage};

/// Accumulated summaries plus the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingState {
    pub results: Vec<PostSummary>,
    pub cursor: Option<String>,
}

/// Props handed to the listing view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingProps {
    pub initial_results: Vec<PostSummary>,
    pub initial_cursor: Option<String>,
}

/// Outcome of a `load_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// A page was fetched and appended
    Loaded { appended: usize },
    /// No cursor; nothing left to load
    Exhausted,
    /// Another load is still running; this call was ignored
    InFlight,
}

pub struct ListingController {
    client: Arc<dyn ContentSource>,
    state: Mutex<ListingState>,
    loading: AtomicBool,
}

/// Releases the in-flight flag when the load finishes or is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ListingController {
    /// Create a controller with an empty listing
    pub fn new(client: Arc<dyn ContentSource>) -> Self {
        Self {
            client,
            state: Mutex::new(ListingState::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Query the first page and seed a controller with it
    pub async fn load_first(
        client: Arc<dyn ContentSource>,
        doc_type: &str,
        page_size: usize,
    ) -> Result<Self> {
        let first = client
            .query_by_type(doc_type, QueryOptions::page_size(page_size))
            .await?
            .into_summaries();
        tracing::debug!(
            "Loaded first page: {} posts, more = {}",
            first.results.len(),
            first.next_page.is_some()
        );

        let controller = Self::new(client);
        controller.initialize(first);
        Ok(controller)
    }

    /// Seed the listing with a pre-fetched first page, replacing any
    /// previous session
    pub fn initialize(&self, first_page: ResultsPage<PostSummary>) {
        let mut state = self.lock();
        state.results = first_page.results;
        state.cursor = first_page.next_page;
    }

    /// Fetch the page at the current cursor and append it
    pub async fn load_more(&self) -> Result<LoadMore> {
        let Some(_guard) = InFlightGuard::claim(&self.loading) else {
            tracing::debug!("load_more ignored: a load is already in flight");
            return Ok(LoadMore::InFlight);
        };

        let Some(cursor) = self.cursor() else {
            return Ok(LoadMore::Exhausted);
        };

        let page = self.client.fetch_page(&cursor).await.map_err(|e| {
            tracing::warn!("load_more failed, keeping current listing: {}", e);
            e
        })?;
        let page = page.into_summaries();
        let appended = page.results.len();

        let mut state = self.lock();
        if state.cursor.as_deref() != Some(cursor.as_str()) {
            // Re-initialized while the fetch was running
            return Ok(LoadMore::Exhausted);
        }
        state.results.extend(page.results);
        state.cursor = page.next_page;
        tracing::debug!(
            "Appended {} posts ({} total), more = {}",
            appended,
            state.results.len(),
            state.cursor.is_some()
        );

        Ok(LoadMore::Loaded { appended })
    }

    /// Follow the cursor until the listing is complete
    pub async fn load_all(&self) -> Result<usize> {
        let mut pages = 0;
        while let LoadMore::Loaded { .. } = self.load_more().await? {
            pages += 1;
        }
        Ok(pages)
    }

    pub fn summaries(&self) -> Vec<PostSummary> {
        self.lock().results.clone()
    }

    pub fn cursor(&self) -> Option<String> {
        self.lock().cursor.clone()
    }

    pub fn has_more(&self) -> bool {
        self.lock().cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().results.is_empty()
    }

    pub fn snapshot(&self) -> ListingState {
        self.lock().clone()
    }

    pub fn props(&self) -> ListingProps {
        let state = self.lock();
        ListingProps {
            initial_results: state.results.clone(),
            initial_cursor: state.cursor.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
