//! cms-blog: a blog front end for a headless CMS
//!
//! Posts are fetched from the content source and rendered with embedded
//! Tera templates, either ahead of time into a public directory or per
//! request by the built-in server.

pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod listing;
pub mod server;
pub mod source;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detail::DetailOptions;
use crate::source::ContentSource;

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied or served as-is
    pub static_dir: PathBuf,
    /// Content source shared by every flow
    pub client: Arc<dyn ContentSource>,
}

impl Blog {
    /// Create a blog from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let mut config = config::SiteConfig::load_dir(&base_dir)?;
        config.apply_env();
        config.validate()?;

        let client = source::from_config(&config.source, &base_dir)?;
        Ok(Self::with_client(config, &base_dir, client))
    }

    /// Create a blog around an existing content source
    pub fn with_client(
        config: config::SiteConfig,
        base_dir: &Path,
        client: Arc<dyn ContentSource>,
    ) -> Self {
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir: base_dir.to_path_buf(),
            public_dir,
            static_dir,
            client,
        }
    }

    /// Options for the detail flow derived from the config
    pub fn detail_options(&self) -> error::Result<DetailOptions> {
        Ok(DetailOptions {
            doc_type: self.config.source.document_type.clone(),
            date_format: self.config.date.resolve()?,
            words_per_minute: self.config.reading.words_per_minute,
        })
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<generator::GenerateStats> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_with_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Meu blog\npublic_dir: out\nsource:\n  fixtures: posts.json\n",
        )
        .unwrap();
        fs::write(dir.path().join("posts.json"), "[]").unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Meu blog");
        assert_eq!(blog.public_dir, dir.path().join("out"));
        assert_eq!(blog.detail_options().unwrap().doc_type, "posts");
    }

    #[test]
    fn test_new_without_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Blog::new(dir.path()).is_err());
    }
}
