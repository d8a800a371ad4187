//! Generate static files

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::generator::{GenerateStats, Generator};
use crate::Blog;

/// Generate the static site
pub async fn run(blog: &Blog) -> Result<GenerateStats> {
    let start = Instant::now();

    let generator = Generator::new(blog)?;
    let stats = generator.generate().await?;

    tracing::info!(
        "Generated index, {} posts and {} assets in {:.2}s",
        stats.posts,
        stats.assets,
        start.elapsed().as_secs_f64()
    );
    if stats.skipped > 0 {
        tracing::warn!("{} listed posts could not be fetched", stats.skipped);
    }

    Ok(stats)
}

/// Regenerate every `revalidate_secs` so published edits reach the output
pub async fn watch(blog: &Blog) -> Result<()> {
    let period = Duration::from_secs(blog.config.revalidate_secs.max(1));
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately
    interval.tick().await;

    tracing::info!(
        "Regenerating every {}s. Press Ctrl+C to stop.",
        period.as_secs()
    );

    loop {
        interval.tick().await;
        tracing::info!("Revalidating...");
        if let Err(e) = run(blog).await {
            tracing::error!("Generation failed, keeping previous output: {:#}", e);
        }
    }
}
