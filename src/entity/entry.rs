use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    context::Context, engine, error::FolioError, feed::POSTS_PATH_PREFIX, helpers, markdown,
    meta::Meta, slug, sort::Published,
};

use super::Entity;

/// The frontmatter delimiter line.
static FRONTMATTER_DELIMITER: &str = "+++";

/// The content collection an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Posts,
    Projects,
}

impl Collection {
    /// Directory name of the collection below `content/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Projects => "projects",
        }
    }
}

/// The TOML frontmatter of a content file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: String,
    #[serde(alias = "pubDatetime", with = "helpers::serde_datetime")]
    pub pub_datetime: OffsetDateTime,
    /// Fallback to the first meaningful line of the body if empty.
    #[serde(default)]
    pub description: String,
    /// External link of a project.
    pub url: Option<String>,
    #[serde(alias = "canonicalURL")]
    pub canonical_url: Option<String>,
    pub image: Option<String>,
    /// Explicit slug, takes precedence over the title.
    #[serde(alias = "postSlug")]
    pub slug: Option<String>,
    /// Drafts are never loaded.
    #[serde(default)]
    pub draft: bool,
    /// Featured posts are listed on the home page.
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A single post or project.
#[derive(Clone, Serialize)]
pub struct ContentEntry {
    pub collection: Collection,
    pub frontmatter: Frontmatter,
    /// The markdown body after the frontmatter.
    #[serde(skip_serializing)]
    pub markdown: String,
    /// Path of the file relative to its collection directory.
    pub file_path: PathBuf,
    /// Resolved in the parse stage, empty for projects.
    pub slug: String,
}

impl Frontmatter {
    /// Where a project links to: `url` if present, otherwise `canonical_url`.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().or(self.canonical_url.as_deref())
    }
}

impl Published for Frontmatter {
    fn pub_datetime(&self) -> OffsetDateTime {
        self.pub_datetime
    }
}

impl Published for ContentEntry {
    fn pub_datetime(&self) -> OffsetDateTime {
        self.frontmatter.pub_datetime
    }
}

impl std::fmt::Debug for ContentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentEntry")
            .field("collection", &self.collection)
            .field("frontmatter", &self.frontmatter)
            .field("file_path", &self.file_path)
            .field("slug", &self.slug)
            .finish()
    }
}

/// Split `content` into its frontmatter and markdown body.
///
/// The first line must be `+++`, the frontmatter ends at the next `+++` line.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix(FRONTMATTER_DELIMITER)?
        .trim_start_matches(&[' ', '\t'][..]);
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

impl ContentEntry {
    /// Load an entry from `path`, a file below the `collection` directory `dir`.
    pub fn load(collection: Collection, dir: &Path, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file `{}`", path.display()))?;
        let (frontmatter, markdown) = split_frontmatter(&content)
            .ok_or_else(|| FolioError::MissingFrontmatter(path.to_owned()))?;
        let frontmatter = toml::from_str::<Frontmatter>(frontmatter).map_err(|source| {
            FolioError::InvalidFrontmatter {
                path: path.to_owned(),
                source,
            }
        })?;

        Ok(ContentEntry {
            collection,
            frontmatter,
            markdown: markdown.trim_start().to_owned(),
            file_path: path.strip_prefix(dir).unwrap_or(path).to_owned(),
            slug: String::new(),
        })
    }

    /// Path of the rendered page relative to the site root.
    pub fn page_path(&self) -> String {
        format!("{POSTS_PATH_PREFIX}/{}", self.slug)
    }
}

impl Entity for ContentEntry {
    fn parse(&mut self, _source: &Path) -> Result<()> {
        // Slugs only name post pages.
        if self.collection == Collection::Posts {
            self.slug = slug::slugify_frontmatter(&self.frontmatter)
                .with_context(|| format!("Invalid slug in `{}`", self.file_path.display()))?;
        }

        if self.frontmatter.description.trim().is_empty() {
            self.frontmatter.description = markdown::extract_description(&self.markdown);
        }

        if self.collection == Collection::Projects && self.frontmatter.link().is_none() {
            return Err(FolioError::MissingProjectLink(self.frontmatter.title.clone()).into());
        }
        Ok(())
    }

    fn render(&self, env: &Environment, mut context: Context, dest: &Path) -> Result<()> {
        // Projects link out, only posts own a page.
        if self.collection != Collection::Posts {
            return Ok(());
        }

        let page_path = self.page_path();
        context.insert(
            "meta",
            &Meta {
                title: Cow::Borrowed(&self.frontmatter.title),
                description: Cow::Borrowed(&self.frontmatter.description),
                url: Some(Cow::Borrowed(&page_path)),
                image: self.frontmatter.image.as_deref().map(Cow::Borrowed),
            },
        );
        context.insert("page_type", "post");
        context.insert("entry", self);
        context.insert("html", &markdown::render_html(&self.markdown));
        engine::render(env, "post.html", context, dest.join(page_path))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use test_case::test_case;

    use super::*;

    fn parse_entry(collection: Collection, content: &str) -> Result<ContentEntry> {
        let (frontmatter, markdown) = split_frontmatter(content).unwrap();
        let mut entry = ContentEntry {
            collection,
            frontmatter: toml::from_str(frontmatter)?,
            markdown: markdown.to_owned(),
            file_path: PathBuf::from("entry.md"),
            slug: String::new(),
        };
        entry.parse(Path::new("."))?;
        Ok(entry)
    }

    #[test_case("+++\ntitle = \"a\"\n+++\nbody", "title = \"a\"\n", "body"; "lf")]
    #[test_case("+++\r\ntitle = \"a\"\r\n+++\r\nbody", "title = \"a\"\r\n", "body"; "crlf")]
    #[test_case("\u{feff}+++\ntitle = \"a\"\n+++\n", "title = \"a\"\n", ""; "bom and empty body")]
    #[test_case("+++\n+++\nbody\n+++\n", "", "body\n+++\n"; "first delimiter closes")]
    fn test_split_frontmatter(content: &str, frontmatter: &str, body: &str) {
        assert_eq!(split_frontmatter(content), Some((frontmatter, body)));
    }

    #[test_case("title = \"a\"\n+++\nbody"; "no opening")]
    #[test_case("+++\ntitle = \"a\"\nbody"; "no closing")]
    #[test_case("+++title = \"a\"\n+++\n"; "opening not alone")]
    fn test_split_frontmatter_missing(content: &str) {
        assert_eq!(split_frontmatter(content), None);
    }

    #[test]
    fn test_frontmatter_aliases() {
        let frontmatter = toml::from_str::<Frontmatter>(
            r#"
            title = "Hello"
            pubDatetime = "2023-01-01T00:00:00Z"
            canonicalURL = "https://example.com/hello"
            postSlug = "hi"
            "#,
        )
        .unwrap();
        assert_eq!(frontmatter.pub_datetime.unix_timestamp(), 1672531200);
        assert_eq!(
            frontmatter.canonical_url.as_deref(),
            Some("https://example.com/hello")
        );
        assert_eq!(frontmatter.slug.as_deref(), Some("hi"));
        assert!(!frontmatter.draft);
        assert!(frontmatter.tags.is_empty());
    }

    #[test]
    fn test_missing_pub_datetime() {
        assert!(toml::from_str::<Frontmatter>("title = \"Hello\"").is_err());
    }

    #[test]
    fn test_parse_post() {
        let entry = parse_entry(
            Collection::Posts,
            "+++\ntitle = \"Hello World\"\npub_datetime = 2023-01-01\n+++\n# Heading\n\nThe first line.\n",
        )
        .unwrap();
        assert_eq!(entry.slug, "hello-world");
        assert_eq!(entry.page_path(), "posts/hello-world");
        assert_eq!(entry.frontmatter.description, "The first line.");
    }

    #[test]
    fn test_parse_post_with_explicit_slug() {
        let entry = parse_entry(
            Collection::Posts,
            "+++\ntitle = \"Hello World\"\nslug = \"Custom Slug\"\ndescription = \"Kept\"\npub_datetime = 2023-01-01\n+++\nBody\n",
        )
        .unwrap();
        assert_eq!(entry.slug, "custom-slug");
        assert_eq!(entry.frontmatter.description, "Kept");
    }

    #[test]
    fn test_parse_project_requires_link() {
        let err = parse_entry(
            Collection::Projects,
            "+++\ntitle = \"Tool\"\npub_datetime = 2023-01-01\n+++\n",
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FolioError>(),
            Some(FolioError::MissingProjectLink(_))
        ));

        let entry = parse_entry(
            Collection::Projects,
            "+++\ntitle = \"Tool\"\ncanonical_url = \"/projects/tool\"\npub_datetime = 2023-01-01\n+++\n",
        )
        .unwrap();
        assert_eq!(entry.frontmatter.link(), Some("/projects/tool"));
    }

    #[test]
    fn test_parse_project_without_sluggable_title() {
        let entry = parse_entry(
            Collection::Projects,
            "+++\ntitle = \"🚀\"\nurl = \"https://example.com/rocket\"\npub_datetime = 2023-01-01\n+++\n",
        )
        .unwrap();
        assert!(entry.slug.is_empty());
        assert_eq!(entry.frontmatter.link(), Some("https://example.com/rocket"));

        let err = parse_entry(
            Collection::Posts,
            "+++\ntitle = \"🚀\"\npub_datetime = 2023-01-01\n+++\n",
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FolioError>(),
            Some(FolioError::EmptySlug(_))
        ));
    }
}
