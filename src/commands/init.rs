//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Site
title: spacetraveling
description: ''
author: ''
language: pt-BR

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
static_dir: static

# Seconds before a rendered page is regenerated
revalidate_secs: 1800

# Content source
## Set endpoint to your repository's API, e.g. https://my-repo.cdn.prismic.io/api/v2
## and remove fixtures. The access token can also come from CMS_BLOG_ACCESS_TOKEN.
source:
  endpoint: ''
  access_token:
  document_type: posts
  page_size: 2
  paths_page_size: 5
  fixtures: posts.json
  timeout_secs: 10

# Date / Time format
date:
  locale: pt_BR
  timezone: UTC
  format: DD MMM YYYY

reading:
  words_per_minute: 200

labels:
  load_more: Carregar mais posts
  loading: Carregando...
  not_found: Post não encontrado
  unavailable: Conteúdo indisponível no momento
  minutes: min
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="26" viewBox="0 0 240 26"><text x="0" y="20" fill="#ff57b2" font-family="sans-serif" font-size="22">spacetraveling.</text></svg>
"##;

const SAMPLE_POSTS: &str = r#"[
  {
    "id": "YGGgFhIAACAAaBwz",
    "uid": "hello-world",
    "type": "posts",
    "first_publication_date": "2021-04-19T19:25:28+0000",
    "data": {
      "title": "Hello World",
      "subtitle": "Your very first post",
      "author": "Admin",
      "banner": { "url": "", "alt": null },
      "content": [
        {
          "heading": "Quick start",
          "body": [
            {
              "type": "paragraph",
              "text": "Edit posts.json or point source.endpoint at your CMS repository.",
              "spans": [{ "start": 5, "end": 15, "type": "strong" }]
            },
            { "type": "list-item", "text": "cms-blog server", "spans": [] },
            { "type": "list-item", "text": "cms-blog generate", "spans": [] }
          ]
        }
      ]
    }
  }
]
"#;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static/images"))?;

    write_if_missing(&target_dir.join("_config.yml"), CONFIG)?;
    write_if_missing(&target_dir.join("static/images/logo.svg"), LOGO)?;
    write_if_missing(&target_dir.join("posts.json"), SAMPLE_POSTS)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}
