//! Request-time rendering server
//!
//! Pages are rendered on first request and kept in a cache keyed by path.
//! An entry older than the revalidate interval is served once more while a
//! background task renders a fresh copy.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    handler::Handler,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::detail::{DetailFlow, DetailOptions, DetailState};
use crate::error::BlogError;
use crate::listing::ListingController;
use crate::source::ContentSource;
use crate::templates::{SummaryView, TemplateRenderer};
use crate::Blog;

/// Pages rendered by the server
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Index,
    Post(String),
}

impl Route {
    fn cache_key(&self) -> String {
        match self {
            Route::Index => "/".to_string(),
            Route::Post(uid) => format!("/post/{}/", uid),
        }
    }
}

#[derive(Debug, Clone)]
struct RenderedPage {
    status: StatusCode,
    html: String,
}

impl RenderedPage {
    /// Not-found renders stay out of the cache; request paths choose the keys
    fn is_cacheable(&self) -> bool {
        self.status != StatusCode::NOT_FOUND
    }
}

impl IntoResponse for RenderedPage {
    fn into_response(self) -> Response {
        (self.status, Html(self.html)).into_response()
    }
}

#[derive(Debug, Clone)]
enum CacheEntry {
    /// First render still running
    Pending,
    Ready {
        page: RenderedPage,
        rendered_at: Instant,
    },
}

enum Lookup {
    Fresh(RenderedPage),
    /// Past the revalidate interval; the caller refreshes it
    Stale(RenderedPage),
    Pending,
    /// Nothing cached; the caller now owns the first render
    Claimed,
}

/// Rendered pages keyed by path
struct RenderCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    revalidate: Duration,
}

impl RenderCache {
    fn new(revalidate: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            revalidate,
        }
    }

    fn lookup(&self, key: &str) -> Lookup {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(CacheEntry::Pending) => Lookup::Pending,
            Some(CacheEntry::Ready { page, rendered_at }) => {
                if rendered_at.elapsed() < self.revalidate {
                    Lookup::Fresh(page.clone())
                } else {
                    // Only one request triggers the refresh
                    *rendered_at = Instant::now();
                    Lookup::Stale(page.clone())
                }
            }
            None => {
                entries.insert(key.to_string(), CacheEntry::Pending);
                Lookup::Claimed
            }
        }
    }

    fn store(&self, key: &str, page: RenderedPage) {
        self.lock().insert(
            key.to_string(),
            CacheEntry::Ready {
                page,
                rendered_at: Instant::now(),
            },
        );
    }

    /// Drop whatever is cached for `key`
    fn evict(&self, key: &str) {
        self.lock().remove(key);
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn abandon(&self, key: &str) {
        let mut entries = self.lock();
        if matches!(entries.get(key), Some(CacheEntry::Pending)) {
            entries.remove(key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears a pending entry if the first render never completes
struct PendingClaim<'a> {
    cache: &'a RenderCache,
    key: String,
}

impl Drop for PendingClaim<'_> {
    fn drop(&mut self) {
        self.cache.abandon(&self.key);
    }
}

/// Shared server state
pub struct AppState {
    client: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
    options: DetailOptions,
    page_size: usize,
    cache: RenderCache,
}

impl AppState {
    pub fn new(blog: &Blog) -> crate::error::Result<Self> {
        Ok(Self {
            client: blog.client.clone(),
            renderer: TemplateRenderer::new(&blog.config)?,
            options: blog.detail_options()?,
            page_size: blog.config.source.page_size,
            cache: RenderCache::new(Duration::from_secs(blog.config.revalidate_secs)),
        })
    }

    async fn render(&self, route: &Route) -> crate::error::Result<RenderedPage> {
        match route {
            Route::Index => {
                let listing = ListingController::load_first(
                    self.client.clone(),
                    &self.options.doc_type,
                    self.page_size,
                )
                .await?;
                Ok(RenderedPage {
                    status: StatusCode::OK,
                    html: self.renderer.render_index(&listing.props())?,
                })
            }
            Route::Post(uid) => {
                let mut flow = DetailFlow::new(uid.as_str());
                let state = flow.resolve(self.client.as_ref(), &self.options).await?;
                let status = match state {
                    DetailState::NotFound { .. } => StatusCode::NOT_FOUND,
                    _ => StatusCode::OK,
                };
                Ok(RenderedPage {
                    status,
                    html: self.renderer.render_detail(state)?,
                })
            }
        }
    }

    fn error_page(&self, err: &BlogError) -> Response {
        let status = error_status(err);
        tracing::error!("Render failed ({}): {}", status, err);
        match self.renderer.render_error() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, "Service unavailable").into_response(),
        }
    }

    fn loading_page(&self) -> Response {
        match self.renderer.render_loading() {
            Ok(html) => Html(html).into_response(),
            Err(e) => self.error_page(&e),
        }
    }
}

fn error_status(err: &BlogError) -> StatusCode {
    match err {
        BlogError::ContentSourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        BlogError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Serve a route from the cache, rendering it when needed
async fn serve(state: Arc<AppState>, route: Route) -> Response {
    let key = route.cache_key();

    match state.cache.lookup(&key) {
        Lookup::Fresh(page) => page.into_response(),
        Lookup::Pending => {
            tracing::debug!("{} is still rendering, serving loading page", key);
            state.loading_page()
        }
        Lookup::Stale(page) => {
            let bg = state.clone();
            tokio::spawn(async move {
                match bg.render(&route).await {
                    Ok(fresh) if fresh.is_cacheable() => {
                        tracing::debug!("Revalidated {}", key);
                        bg.cache.store(&key, fresh);
                    }
                    Ok(_) => {
                        tracing::debug!("{} is gone, evicting", key);
                        bg.cache.evict(&key);
                    }
                    Err(e) => {
                        tracing::warn!("Revalidating {} failed, keeping stale page: {}", key, e)
                    }
                }
            });
            page.into_response()
        }
        Lookup::Claimed => {
            let _claim = PendingClaim {
                cache: &state.cache,
                key: key.clone(),
            };
            match state.render(&route).await {
                Ok(page) => {
                    if page.is_cacheable() {
                        state.cache.store(&key, page.clone());
                    }
                    page.into_response()
                }
                Err(e) => state.error_page(&e),
            }
        }
    }
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    serve(state, Route::Index).await
}

async fn post_handler(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> Response {
    serve(state, Route::Post(uid)).await
}

async fn not_found_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.renderer.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => state.error_page(&e),
    }
}

#[derive(Debug, Deserialize)]
struct LoadMoreQuery {
    cursor: String,
}

/// One appended list item
#[derive(Debug, Serialize)]
pub struct LoadMoreItem {
    #[serde(flatten)]
    pub summary: SummaryView,
    pub html: String,
}

/// Body of `GET /api/posts`
#[derive(Debug, Serialize)]
pub struct LoadMoreResponse {
    pub results: Vec<LoadMoreItem>,
    pub next_page: Option<String>,
    pub next_url: Option<String>,
}

async fn load_more_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoadMoreQuery>,
) -> Response {
    match load_more(&state, &query.cursor).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            let status = error_status(&e);
            tracing::warn!("Load more failed ({}): {}", status, e);
            (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn load_more(state: &AppState, cursor: &str) -> crate::error::Result<LoadMoreResponse> {
    let page = state.client.fetch_page(cursor).await?.into_summaries();

    let mut results = Vec::with_capacity(page.results.len());
    for summary in &page.results {
        let view = state.renderer.summary_view(summary)?;
        let html = state.renderer.render_summary_item(&view)?;
        results.push(LoadMoreItem {
            summary: view,
            html,
        });
    }

    Ok(LoadMoreResponse {
        results,
        next_url: state.renderer.next_url(page.next_page.as_deref()),
        next_page: page.next_page,
    })
}

/// Build the router; files under `static_dir` are served as-is
pub fn router(state: Arc<AppState>, static_dir: &std::path::Path) -> Router {
    let static_files =
        ServeDir::new(static_dir).not_found_service(not_found_handler.with_state(state.clone()));

    Router::new()
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .route("/api/posts", get(load_more_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(AppState::new(blog)?);
    let app = router(state, &blog.static_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!(
        "Pages are revalidated every {}s. Press Ctrl+C to stop.",
        blog.config.revalidate_secs
    );

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
