//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::BlogError;
use crate::helpers::DateFormat;

/// Environment variable that overrides `source.access_token`
pub const ACCESS_TOKEN_ENV: &str = "CMS_BLOG_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    /// Seconds a rendered page stays fresh before it is regenerated
    pub revalidate_secs: u64,

    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub date: DateConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub labels: LabelsConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            author: String::new(),
            language: "pt-BR".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            revalidate_secs: 60 * 30,

            source: SourceConfig::default(),
            date: DateConfig::default(),
            reading: ReadingConfig::default(),
            labels: LabelsConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load `_config.yml` from a site directory, or the defaults without one
    pub fn load_dir(base_dir: &Path) -> Result<Self> {
        let config_path = base_dir.join("_config.yml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.source.access_token = Some(token);
            }
        }
    }

    /// Check the values that cannot be validated by deserialization alone
    pub fn validate(&self) -> std::result::Result<(), BlogError> {
        if self.source.page_size == 0 || self.source.paths_page_size == 0 {
            return Err(BlogError::Config("page sizes must be positive".to_string()));
        }
        if self.reading.words_per_minute == 0 {
            return Err(BlogError::Config(
                "reading.words_per_minute must be positive".to_string(),
            ));
        }
        if self.source.endpoint.is_empty() && self.source.fixtures.is_none() {
            return Err(BlogError::Config(
                "either source.endpoint or source.fixtures must be set".to_string(),
            ));
        }
        self.date.resolve()?;
        Ok(())
    }
}

/// Content source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding the posts
    pub document_type: String,
    /// Posts per listing page
    pub page_size: usize,
    /// Posts whose detail page is pre-built by `generate`
    pub paths_page_size: usize,
    /// JSON file served by the in-memory source instead of the remote API
    pub fixtures: Option<String>,
    /// Per-request HTTP timeout
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 2,
            paths_page_size: 5,
            fixtures: None,
            timeout_secs: 10,
        }
    }
}

/// Publication date display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    pub locale: String,
    pub timezone: String,
    /// Moment.js-style pattern
    pub format: String,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            locale: "pt_BR".to_string(),
            timezone: "UTC".to_string(),
            format: "DD MMM YYYY".to_string(),
        }
    }
}

impl DateConfig {
    pub fn resolve(&self) -> std::result::Result<DateFormat, BlogError> {
        DateFormat::new(&self.locale, &self.timezone, &self.format)
    }
}

/// Reading time estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: u32,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
        }
    }
}

/// User-facing strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub load_more: String,
    pub loading: String,
    pub not_found: String,
    pub unavailable: String,
    pub minutes: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            load_more: "Carregar mais posts".to_string(),
            loading: "Carregando...".to_string(),
            not_found: "Post não encontrado".to_string(),
            unavailable: "Conteúdo indisponível no momento".to_string(),
            minutes: "min".to_string(),
        }
    }
}
