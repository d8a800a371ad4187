//! Generator module - renders the site ahead of time into the public directory

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::detail::{DetailFlow, DetailOptions, DetailState};
use crate::helpers::post_segment;
use crate::listing::ListingController;
use crate::source::QueryOptions;
use crate::templates::TemplateRenderer;
use crate::Blog;

/// What one generation run produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub skipped: usize,
    pub assets: usize,
}

/// Static site generator using the built-in templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    options: DetailOptions,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new(&blog.config)?,
            options: blog.detail_options()?,
        })
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.blog.public_dir)?;

        let assets = self.copy_static_assets()?;

        self.generate_index().await?;
        let (posts, skipped) = self.generate_post_pages().await?;
        self.generate_not_found()?;

        Ok(GenerateStats {
            posts,
            skipped,
            assets,
        })
    }

    /// Home page from the first listing page
    async fn generate_index(&self) -> Result<()> {
        let source = &self.blog.config.source;
        let listing = ListingController::load_first(
            self.blog.client.clone(),
            &source.document_type,
            source.page_size,
        )
        .await
        .context("failed to load the first page of posts")?;

        let html = self.renderer.render_index(&listing.props())?;
        self.write_page(Path::new("index.html"), &html)?;
        tracing::debug!("Generated index with {} posts", listing.len());
        Ok(())
    }

    /// One page per identifier of the first `paths_page_size` posts; the
    /// rest are rendered on demand by the server
    async fn generate_post_pages(&self) -> Result<(usize, usize)> {
        let source = &self.blog.config.source;
        let uids = self
            .blog
            .client
            .list_identifiers(
                &source.document_type,
                QueryOptions::page_size(source.paths_page_size),
            )
            .await
            .context("failed to list post identifiers")?;

        let mut generated = 0;
        let mut skipped = 0;
        for uid in uids {
            let Some(dir) = post_dir(&uid) else {
                tracing::warn!("Post uid {:?} is not a valid path segment, skipping", uid);
                skipped += 1;
                continue;
            };

            let mut flow = DetailFlow::new(uid.as_str());
            flow.resolve(self.blog.client.as_ref(), &self.options)
                .await
                .with_context(|| format!("failed to render post {}", uid))?;

            match flow.state() {
                DetailState::Ready(_) => {
                    let html = self.renderer.render_detail(flow.state())?;
                    self.write_page(&dir.join("index.html"), &html)?;
                    generated += 1;
                }
                _ => {
                    tracing::warn!("Listed post {} could not be fetched, skipping", uid);
                    skipped += 1;
                }
            }
        }

        Ok((generated, skipped))
    }

    fn generate_not_found(&self) -> Result<()> {
        let html = self.renderer.render_not_found()?;
        self.write_page(Path::new("404.html"), &html)
    }

    fn write_page(&self, rel: &Path, html: &str) -> Result<()> {
        let dest = self.blog.public_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, html)?;
        tracing::debug!("Generated: {:?}", rel);
        Ok(())
    }

    /// Copy the static directory (logo, images) into public
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let relative = path.strip_prefix(static_dir)?;

            // Skip hidden files
            if relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
            {
                continue;
            }

            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        Ok(copied)
    }
}

/// Output directory of a post, matching the link `post_path` builds.
/// `None` when the encoded uid is not a single normal path component.
fn post_dir(uid: &str) -> Option<PathBuf> {
    let segment = post_segment(uid);
    let mut components = Path::new(&segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(Path::new("post").join(&segment)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::RawDocument;
    use crate::error::BlogError;
    use crate::source::MemorySource;
    use std::sync::Arc;

    fn doc(uid: &str, date: &str) -> RawDocument {
        serde_json::from_value(serde_json::json!({
            "uid": uid,
            "type": "posts",
            "first_publication_date": date,
            "data": {
                "title": format!("Post {}", uid),
                "subtitle": "sub",
                "author": "Ana",
                "content": [{ "heading": "Intro", "body": [
                    { "type": "paragraph", "text": "hello world", "spans": [] }
                ]}]
            }
        }))
        .unwrap()
    }

    fn blog(dir: &Path, docs: Vec<RawDocument>) -> Blog {
        Blog::with_client(
            SiteConfig::default(),
            dir,
            Arc::new(MemorySource::new(docs)),
        )
    }

    #[tokio::test]
    async fn test_generate_site() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("static/images")).unwrap();
        fs::write(dir.path().join("static/images/logo.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("static/.hidden"), "x").unwrap();

        let docs = (1..=7)
            .map(|i| doc(&format!("p{}", i), "2021-04-19T19:25:28+0000"))
            .collect();
        let blog = blog(dir.path(), docs);
        let stats = Generator::new(&blog).unwrap().generate().await.unwrap();

        assert_eq!(
            stats,
            GenerateStats {
                posts: 5,
                skipped: 0,
                assets: 1
            }
        );

        let public = dir.path().join("public");
        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("Post p1"));
        assert!(index.contains("Post p2"));
        assert!(!index.contains("Post p3"));
        assert!(index.contains(r#"id="load-more""#));

        assert!(public.join("post/p5/index.html").exists());
        assert!(!public.join("post/p6/index.html").exists());
        assert!(public.join("404.html").exists());
        assert!(public.join("images/logo.svg").exists());
        assert!(!public.join(".hidden").exists());
    }

    #[tokio::test]
    async fn test_uids_stay_inside_public() {
        let dir = tempfile::tempdir().unwrap();
        let date = "2021-04-19T19:25:28+0000";
        let docs = vec![doc("../../escaped", date), doc("..", date), doc("a/b", date)];
        let blog = blog(dir.path(), docs);
        let stats = Generator::new(&blog).unwrap().generate().await.unwrap();

        assert_eq!(stats.posts, 2);
        assert_eq!(stats.skipped, 1);
        assert!(!dir.path().join("escaped").exists());

        let public = dir.path().join("public");
        assert!(public.join("post/..%2F..%2Fescaped/index.html").exists());
        assert!(public.join("post/a%2Fb/index.html").exists());
        assert!(!public.join("post/a").exists());
    }

    #[test]
    fn test_post_dir() {
        assert_eq!(post_dir("hello"), Some(PathBuf::from("post/hello")));
        assert_eq!(post_dir("a/b"), Some(PathBuf::from("post/a%2Fb")));
        assert_eq!(post_dir(".."), None);
        assert_eq!(post_dir("."), None);
        assert_eq!(post_dir(""), None);
    }

    #[tokio::test]
    async fn test_malformed_date_fails_generation() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path(), vec![doc("bad", "yesterday")]);
        let err = Generator::new(&blog).unwrap().generate().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlogError>(),
            Some(BlogError::MalformedTimestamp(Some(_)))
        ));
    }

    #[tokio::test]
    async fn test_source_failure_fails_generation() {
        let dir = tempfile::tempdir().unwrap();
        let source = MemorySource::new(vec![doc("a", "2021-04-19T19:25:28+0000")]);
        source.fail_next(1);
        let blog = Blog::with_client(SiteConfig::default(), dir.path(), Arc::new(source));
        assert!(Generator::new(&blog).unwrap().generate().await.is_err());
    }
}
