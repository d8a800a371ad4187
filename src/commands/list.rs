//! List posts available from the content source

use anyhow::Result;

use crate::helpers::{format_date, parse_timestamp};
use crate::listing::ListingController;
use crate::Blog;

/// Walk every page of the listing and print one line per post
pub async fn run(blog: &Blog) -> Result<()> {
    let source = &blog.config.source;
    let listing =
        ListingController::load_first(blog.client.clone(), &source.document_type, source.page_size)
            .await?;
    let pages = listing.load_all().await?;
    tracing::debug!("Followed {} more pages", pages);

    let posts = listing.summaries();
    println!("Posts ({}):", posts.len());
    for post in posts {
        let date = match post.first_publication_date.as_deref().map(parse_timestamp) {
            Some(Ok(date)) => format_date(&date, "YYYY-MM-DD"),
            Some(Err(_)) => "invalid".to_string(),
            None => "-".to_string(),
        };
        println!("  {} - {} [{}]", date, post.data.title, post.uid);
    }

    Ok(())
}
