use anyhow::Result;
use serde::{Deserialize, Serialize};
use url::Url;

/// The `[site]` table of the root `folio.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// The absolute url of this site.
    pub website: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub author: Option<String>,
    /// The OpenGraph social image.
    pub og_image: Option<String>,
    /// How many recent posts the home page lists.
    #[serde(default = "Site::default_posts_per_index")]
    pub posts_per_index: usize,
    #[serde(rename(deserialize = "menu"))]
    #[serde(default)]
    pub menus: Vec<Menu>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pub name: String,
    pub url: String,
}

impl Site {
    const DEFAULT_POSTS_PER_INDEX: usize = 4;

    fn default_posts_per_index() -> usize {
        Self::DEFAULT_POSTS_PER_INDEX
    }

    /// The site url, always with a trailing slash so relative links
    /// resolve below it.
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.website)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Resolve `link` against the site url. Absolute links are kept.
    pub fn absolute_url(&self, link: &str) -> Result<String> {
        Ok(self.base_url()?.join(link)?.to_string())
    }

    /// The site url without trailing slash, if the site lives under a sub-path.
    pub fn sub_path_url(&self) -> Result<Option<String>> {
        let url = Url::parse(&self.website)?;
        if url.path() == "/" {
            Ok(None)
        } else {
            Ok(Some(self.website.trim_end_matches('/').to_owned()))
        }
    }
}
