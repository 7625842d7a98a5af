use std::{borrow::Cow, collections::HashMap, fs, path::Path};

use anyhow::{Context as _, Result};
use minijinja::Environment;
use rayon::iter::{
    IndexedParallelIterator, IntoParallelRefIterator, ParallelBridge, ParallelExtend,
    ParallelIterator,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    context::Context,
    engine,
    error::FolioError,
    feed::{self, FeedItem},
    meta::Meta,
    slug, sort, CONTENT_DIR, FOLIO_FILE,
};

use super::{Collection, ContentEntry, Entity, Site};

/// The root folio entity.
///
/// The site config is parsed from the root directory's `folio.toml`,
/// the collections are loaded from `content/` in the parse stage.
#[derive(Deserialize)]
pub struct Folio {
    pub site: Site,
    /// Sorted newest first once parsed.
    #[serde(skip)]
    pub posts: Vec<ContentEntry>,
    /// Sorted newest first once parsed.
    #[serde(skip)]
    pub projects: Vec<ContentEntry>,
}

impl std::fmt::Debug for Folio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Folio")
            .field("site", &self.site)
            .field("posts", &self.posts.len())
            .field("projects", &self.projects.len())
            .finish()
    }
}

/// The neighbours of a post page.
#[derive(Serialize)]
struct Siblings<'a> {
    newer: Option<&'a ContentEntry>,
    older: Option<&'a ContentEntry>,
}

impl Folio {
    /// Parse the root `folio.toml` in `source`.
    pub fn parse_from_toml(source: impl AsRef<Path>) -> Result<Self> {
        let path = source.as_ref().join(FOLIO_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read `{}`", path.display()))?;
        let table =
            toml::from_str::<toml::Table>(&content).map_err(FolioError::InvalidRootTomlFile)?;
        if !table.contains_key("site") {
            return Err(FolioError::NotRootTomlFile.into());
        }
        let folio = toml::Value::Table(table)
            .try_into::<Folio>()
            .map_err(FolioError::InvalidRootTomlFile)?;
        Ok(folio)
    }

    /// Project all posts and projects into feed items, posts first.
    pub fn feed_items(&self) -> Result<Vec<FeedItem<'_>>, FolioError> {
        feed::project_feed_items(&self.posts, &self.projects, slug::slugify_frontmatter)
    }

    /// Get `sitemap.xml` entries.
    pub fn sitemap_entries(&self) -> Result<Vec<String>> {
        // Sitemap URL must begin with the protocol (such as http)
        // and end with a trailing slash.
        let mut entries = vec![
            self.site.base_url()?.to_string(),
            self.site.absolute_url("posts/")?,
            self.site.absolute_url("projects/")?,
        ];
        entries.par_extend(
            self.posts
                .par_iter()
                .map(|post| self.site.absolute_url(&format!("{}/", post.page_path())))
                .collect::<Result<Vec<_>>>()?,
        );
        Ok(entries)
    }

    fn featured_posts(&self) -> Vec<&ContentEntry> {
        self.posts
            .iter()
            .filter(|post| post.frontmatter.featured)
            .collect()
    }

    fn recent_posts(&self) -> Vec<&ContentEntry> {
        self.posts
            .iter()
            .filter(|post| !post.frontmatter.featured)
            .take(self.site.posts_per_index)
            .collect()
    }

    fn sibling_posts(&self, current: usize) -> Siblings<'_> {
        Siblings {
            newer: current.checked_sub(1).and_then(|index| self.posts.get(index)),
            older: self.posts.get(current + 1),
        }
    }

    fn ensure_unique_post_slugs(&self) -> Result<(), FolioError> {
        let mut seen = HashMap::with_capacity(self.posts.len());
        for post in &self.posts {
            if let Some(first) = seen.insert(post.slug.as_str(), &post.file_path) {
                return Err(FolioError::DuplicateSlug {
                    slug: post.slug.clone(),
                    first: first.clone(),
                    second: post.file_path.clone(),
                });
            }
        }
        Ok(())
    }

    fn render_list(
        &self,
        env: &Environment,
        mut context: Context,
        dest: &Path,
        collection: Collection,
    ) -> Result<()> {
        let (title, entries) = match collection {
            Collection::Posts => ("Posts", &self.posts),
            Collection::Projects => ("Projects", &self.projects),
        };
        let name = collection.dir_name();
        context.insert(
            "meta",
            &Meta {
                title: Cow::Borrowed(title),
                description: Cow::Borrowed(&self.site.description),
                url: Some(Cow::Borrowed(name)),
                image: None,
            },
        );
        context.insert("page_type", name);
        context.insert("entries", entries);
        engine::render(env, &format!("{name}.html"), context, dest.join(name))
    }
}

/// Load every non-draft markdown file of `collection`.
fn load_collection(source: &Path, collection: Collection) -> Result<Vec<ContentEntry>> {
    let dir = source.join(CONTENT_DIR).join(collection.dir_name());
    if !dir.exists() {
        warn!("No {} found, `{}` doesn't exist", collection.dir_name(), dir.display());
        return Ok(Vec::new());
    }

    let mut entries = WalkDir::new(&dir)
        .into_iter()
        .par_bridge()
        .try_fold_with(vec![], |mut entries, entry| {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "md") {
                let content_entry = ContentEntry::load(collection, &dir, path)?;
                if content_entry.frontmatter.draft {
                    debug!("Skip draft `{}`", path.display());
                } else {
                    entries.push(content_entry);
                }
            }
            anyhow::Ok(entries)
        })
        .try_reduce_with(|mut entries, chunk| {
            entries.par_extend(chunk);
            anyhow::Ok(entries)
        })
        .transpose()?
        .unwrap_or_default();

    // Walk order is arbitrary across threads, settle it so that entries
    // published in the same second always keep the same relative order.
    entries.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    Ok(entries)
}

impl Entity for Folio {
    fn parse(&mut self, source: &Path) -> Result<()> {
        self.posts = load_collection(source, Collection::Posts)?;
        self.projects = load_collection(source, Collection::Projects)?;

        self.posts.parse(source)?;
        self.projects.parse(source)?;
        self.ensure_unique_post_slugs()?;

        sort::sort_by_pub_datetime(&mut self.posts);
        sort::sort_by_pub_datetime(&mut self.projects);
        info!(
            posts = self.posts.len(),
            projects = self.projects.len(),
            "Content loaded"
        );
        Ok(())
    }

    fn render(&self, env: &Environment, mut context: Context, dest: &Path) -> Result<()> {
        context.insert("site", &self.site);

        // Render all post pages.
        self.posts
            .par_iter()
            .enumerate()
            .try_for_each(|(index, post)| {
                let mut context = context.clone();
                context.insert("siblings", &self.sibling_posts(index));
                post.render(env, context, dest)
            })?;

        self.render_list(env, context.clone(), dest, Collection::Posts)?;
        self.render_list(env, context.clone(), dest, Collection::Projects)?;

        // Render home page.
        context.insert(
            "meta",
            &Meta {
                title: Cow::Borrowed(&self.site.title),
                description: Cow::Borrowed(&self.site.description),
                url: None,
                image: self.site.og_image.as_deref().map(Cow::Borrowed),
            },
        );
        context.insert("page_type", "index");
        context.insert("featured_posts", &self.featured_posts());
        context.insert("recent_posts", &self.recent_posts());
        context.insert("projects", &self.projects);
        engine::render(env, "index.html", context, dest)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn post(title: &str, slug: &str, featured: bool) -> ContentEntry {
        ContentEntry {
            collection: Collection::Posts,
            frontmatter: toml::from_str(&format!(
                "title = \"{title}\"\npub_datetime = 2023-01-01\nfeatured = {featured}"
            ))
            .unwrap(),
            markdown: String::new(),
            file_path: PathBuf::from(format!("{slug}.md")),
            slug: slug.to_owned(),
        }
    }

    fn folio(posts: Vec<ContentEntry>) -> Folio {
        let mut folio = toml::from_str::<Folio>(
            r#"
            [site]
            website = "https://example.com"
            title = "Test"
            posts_per_index = 2
            "#,
        )
        .unwrap();
        folio.posts = posts;
        folio
    }

    #[test]
    fn test_featured_and_recent_posts() {
        let folio = folio(vec![
            post("A", "a", false),
            post("B", "b", true),
            post("C", "c", false),
            post("D", "d", false),
        ]);
        let slugs = |entries: Vec<&ContentEntry>| {
            entries
                .into_iter()
                .map(|e| e.slug.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(slugs(folio.featured_posts()), ["b"]);
        assert_eq!(slugs(folio.recent_posts()), ["a", "c"]);
    }

    #[test]
    fn test_sibling_posts() {
        let folio = folio(vec![post("A", "a", false), post("B", "b", false)]);
        let first = folio.sibling_posts(0);
        assert!(first.newer.is_none());
        assert_eq!(first.older.map(|e| e.slug.as_str()), Some("b"));
        let last = folio.sibling_posts(1);
        assert_eq!(last.newer.map(|e| e.slug.as_str()), Some("a"));
        assert!(last.older.is_none());
    }

    #[test]
    fn test_duplicate_slugs() {
        let folio = folio(vec![post("A", "same", false), post("B", "same", false)]);
        assert!(matches!(
            folio.ensure_unique_post_slugs(),
            Err(FolioError::DuplicateSlug { slug, .. }) if slug == "same"
        ));
    }

    #[test]
    fn test_sitemap_entries() {
        let folio = folio(vec![post("A", "a", false)]);
        assert_eq!(
            folio.sitemap_entries().unwrap(),
            [
                "https://example.com/",
                "https://example.com/posts/",
                "https://example.com/projects/",
                "https://example.com/posts/a/"
            ]
        );
    }

    #[test]
    fn test_parse_sorts_loaded_entries_by_second() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join(CONTENT_DIR).join("posts");
        fs::create_dir_all(&posts).unwrap();
        // Same second: file order wins over the sub-second part.
        for (file, at) in [
            ("x.md", "2023-03-01T10:00:00.1"),
            ("y.md", "2023-03-01T10:00:00.9"),
            ("z.md", "2023-03-01T10:00:01.2"),
        ] {
            fs::write(
                posts.join(file),
                format!("+++\ntitle = \"{file}\"\npub_datetime = {at}\n+++\n"),
            )
            .unwrap();
        }

        let mut folio = folio(vec![]);
        folio.parse(dir.path()).unwrap();
        let titles = folio
            .posts
            .iter()
            .map(|post| post.frontmatter.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["z.md", "x.md", "y.md"]);
        assert!(folio.projects.is_empty());
    }

    #[test]
    fn test_not_root_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FOLIO_FILE), "title = \"no site table\"").unwrap();
        let err = Folio::parse_from_toml(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FolioError>(),
            Some(FolioError::NotRootTomlFile)
        ));

        fs::write(dir.path().join(FOLIO_FILE), "[site]\ntitle = 1").unwrap();
        let err = Folio::parse_from_toml(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FolioError>(),
            Some(FolioError::InvalidRootTomlFile(_))
        ));
    }
}
