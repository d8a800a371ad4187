//! Clean the public directory

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;
use crate::Blog;

/// Remove everything the generator wrote
pub fn run(blog: &Blog) -> Result<()> {
    remove_public(&blog.public_dir)
}

/// Clean a site directory from its config alone; no content source is needed
pub fn run_in(base_dir: &Path) -> Result<()> {
    let config = SiteConfig::load_dir(base_dir)?;
    remove_public(&base_dir.join(&config.public_dir))
}

fn remove_public(public_dir: &Path) -> Result<()> {
    if public_dir.exists() {
        fs::remove_dir_all(public_dir)?;
        tracing::info!("Deleted: {:?}", public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::source::MemorySource;
    use std::sync::Arc;

    #[test]
    fn test_clean_removes_public_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("public/post/a")).unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();

        let blog = Blog::with_client(
            SiteConfig::default(),
            dir.path(),
            Arc::new(MemorySource::default()),
        );
        run(&blog).unwrap();
        assert!(!dir.path().join("public").exists());
        assert!(dir.path().join("static").exists());

        // Nothing to clean is fine
        run(&blog).unwrap();
    }

    #[test]
    fn test_clean_without_content_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "public_dir: out\n").unwrap();
        fs::create_dir_all(dir.path().join("out/post/a")).unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();

        run_in(dir.path()).unwrap();
        assert!(!dir.path().join("out").exists());
        assert!(dir.path().join("public").exists());
    }
}
