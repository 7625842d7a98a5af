mod build;
mod context;
mod engine;
pub mod entity;
mod error;
pub mod feed;
mod helpers;
mod html;
mod markdown;
mod meta;
mod new;
pub mod slug;
pub mod sort;

pub use build::{build, watch_build};
pub use context::Context;
pub use engine::FolioEngine;
pub use error::FolioError;
pub use new::new_folio_project;

/// The root config file of a folio site.
pub static FOLIO_FILE: &str = "folio.toml";
/// The directory holding the `posts` and `projects` collections.
pub static CONTENT_DIR: &str = "content";
/// The RSS feed file in the dest directory.
pub static FEED_FILE: &str = "rss.xml";
