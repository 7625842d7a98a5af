use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Invalid format of root `folio.toml`: {0}")]
    InvalidRootTomlFile(#[from] toml::de::Error),
    #[error("Not a root `folio.toml`, the `[site]` table is missing")]
    NotRootTomlFile,
    #[error("Missing `+++` frontmatter in `{0}`")]
    MissingFrontmatter(PathBuf),
    #[error("Invalid frontmatter in `{path}`: {source}")]
    InvalidFrontmatter {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Cannot derive a slug from `{0}`")]
    EmptySlug(String),
    #[error("Slug `{slug}` is used by both `{first}` and `{second}`")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Project `{0}` has neither `url` nor `canonical_url`")]
    MissingProjectLink(String),
}
