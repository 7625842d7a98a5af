use anyhow::Result;
use rss::{Channel, Guid, Item};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::{
    entity::{ContentEntry, Frontmatter, Site},
    error::FolioError,
};

/// Path prefix of every post page.
pub static POSTS_PATH_PREFIX: &str = "posts";

/// A single item of the site feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem<'a> {
    /// A site relative path for posts, the project url verbatim for projects.
    pub link: String,
    pub title: &'a str,
    pub description: &'a str,
    pub pub_date: OffsetDateTime,
}

impl<'a> FeedItem<'a> {
    fn new(link: String, frontmatter: &'a Frontmatter) -> Self {
        FeedItem {
            link,
            title: &frontmatter.title,
            description: &frontmatter.description,
            pub_date: frontmatter.pub_datetime,
        }
    }
}

/// Project already sorted posts and projects into feed items, posts first.
///
/// Post links are `posts/<slug>` with the slug produced by `slugify`, whose
/// failure aborts the whole projection. Project links are the `url` field,
/// falling back to `canonical_url`.
pub fn project_feed_items<'a, F>(
    posts: &'a [ContentEntry],
    projects: &'a [ContentEntry],
    slugify: F,
) -> Result<Vec<FeedItem<'a>>, FolioError>
where
    F: Fn(&Frontmatter) -> Result<String, FolioError>,
{
    let mut items = Vec::with_capacity(posts.len() + projects.len());
    for post in posts {
        let slug = slugify(&post.frontmatter)?;
        items.push(FeedItem::new(
            format!("{POSTS_PATH_PREFIX}/{slug}"),
            &post.frontmatter,
        ));
    }
    for project in projects {
        let link = project
            .frontmatter
            .link()
            .ok_or_else(|| FolioError::MissingProjectLink(project.frontmatter.title.clone()))?;
        items.push(FeedItem::new(link.to_owned(), &project.frontmatter));
    }
    Ok(items)
}

/// Serialize feed items into an RSS 2.0 document.
///
/// Item links are resolved against the site url, absolute links are kept.
pub fn render_rss(site: &Site, items: &[FeedItem]) -> Result<String> {
    let items = items
        .iter()
        .map(|feed_item| {
            let link = site.absolute_url(&feed_item.link)?;
            let mut guid = Guid::default();
            guid.set_value(link.clone());
            guid.set_permalink(true);

            let mut item = Item::default();
            item.set_title(feed_item.title.to_owned());
            item.set_description(feed_item.description.to_owned());
            item.set_link(link);
            item.set_guid(guid);
            item.set_pub_date(feed_item.pub_date.format(&Rfc2822)?);
            anyhow::Ok(item)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut channel = Channel::default();
    channel.set_title(site.title.clone());
    channel.set_description(site.description.clone());
    channel.set_link(site.base_url()?.to_string());
    channel.set_generator(format!("folio {}", env!("CARGO_PKG_VERSION")));
    channel.set_items(items);

    let buf = channel.write_to(Vec::new())?;
    Ok(String::from_utf8(buf)?)
}
