//! Configuration module

mod site;

pub use site::DateConfig;
pub use site::LabelsConfig;
pub use site::ReadingConfig;
pub use site::SiteConfig;
pub use site::SourceConfig;
