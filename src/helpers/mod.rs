//! Helper functions for templates and renderers
//!
//! Date formatting, URL generation and HTML escaping shared by the
//! generator, the server and the rich-text renderer.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
