//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters left untouched in a path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/images/logo.png") // -> "/blog/images/logo.png"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Path of a post detail page, relative to the site root
///
/// # Examples
/// ```ignore
/// post_path("como-utilizar-hooks") // -> "post/como-utilizar-hooks/"
/// ```
pub fn post_path(uid: &str) -> String {
    format!("post/{}/", post_segment(uid))
}

/// A uid encoded as one path segment, as it appears in [`post_path`]
pub fn post_segment(uid: &str) -> String {
    utf8_percent_encode(uid, SEGMENT).to_string()
}

/// Path of the load-more endpoint for a cursor
pub fn load_more_path(cursor: &str) -> String {
    format!("api/posts?cursor={}", utf8_percent_encode(cursor, NON_ALPHANUMERIC))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        let mut config = SiteConfig::default();
        assert_eq!(url_for(&config, "/post/a/"), "/post/a/");
        config.root = "/blog/".to_string();
        assert_eq!(url_for(&config, "post/a/"), "/blog/post/a/");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = SiteConfig::default();
        assert_eq!(
            full_url_for(&config, "post/a/"),
            "http://localhost:4000/post/a/"
        );
    }

    #[test]
    fn test_post_path_encodes_uid() {
        assert_eq!(post_path("hello-world"), "post/hello-world/");
        assert_eq!(post_path("a b/c"), "post/a%20b%2Fc/");
        assert_eq!(post_segment("../x"), "..%2Fx");
    }

    #[test]
    fn test_load_more_path_encodes_cursor() {
        assert_eq!(
            load_more_path("https://x.io/api?page=2&pageSize=1"),
            "api/posts?cursor=https%3A%2F%2Fx%2Eio%2Fapi%3Fpage%3D2%26pageSize%3D1"
        );
    }
}
