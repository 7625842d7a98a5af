use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context as _, Result};
use minijinja::{context, value::Value as JinjaValue, Environment};
use tracing::{debug, info};

use crate::{
    context::Context,
    entity::{Entity, Folio, Site},
    feed,
    helpers::{self, copy_dir},
    html::rewrite_html_base_url,
    FEED_FILE,
};

static TEMPLATES: &[(&str, &str)] = &[
    ("_macros.html", include_str!("../templates/_macros.html")),
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("post.html", include_str!("../templates/post.html")),
    ("posts.html", include_str!("../templates/posts.html")),
    ("projects.html", include_str!("../templates/projects.html")),
    ("sitemap.xml", include_str!("../templates/sitemap.xml")),
];

static FOLIO_CSS: &str = include_str!("../static/folio.css");

static SITEMAP_FILE: &str = "sitemap.xml";

fn init_jinja(folio: &Folio) -> Result<Environment<'static>> {
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)
            .with_context(|| format!("Invalid builtin template `{name}`"))?;
    }

    env.add_global("site", JinjaValue::from_serializable(&folio.site));
    env.add_global("folio_version", env!("CARGO_PKG_VERSION"));
    env.add_filter("display_date", display_date_filter);
    env.add_function("url", url_function);

    let site = folio.site.clone();
    env.add_function("absolute_url", move |path: String| -> JinjaValue {
        let url = site.absolute_url(&path).unwrap_or(path);
        url_function(url)
    });
    Ok(env)
}

/// Render `template` into `dest/index.html`.
pub fn render(
    env: &Environment,
    template: &str,
    context: Context,
    dest: impl AsRef<Path>,
) -> Result<()> {
    let dest = dest.as_ref().join("index.html");
    if let Some(parent_dir) = dest.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }

    // Root path links need a rewrite if and only if the site url has a sub-path.
    let site_url = match context.get("site") {
        Some(site) => serde_json::from_value::<Site>(site.clone())?
            .sub_path_url()
            .context("Invalid site url")?,
        None => None,
    };

    let mut buf = vec![];
    env.get_template(template)?
        .render_to_write(context.into_json(), &mut buf)
        .with_context(|| format!("Failed to render `{}`", dest.display()))?;

    if let Some(site_url) = site_url {
        buf = rewrite_html_base_url(&buf, &site_url)?;
    }
    fs::write(&dest, buf)?;
    debug!("Rendered `{}`", dest.display());
    Ok(())
}

// Render the RSS feed of posts and projects.
fn render_rss_feed(folio: &Folio, dest: &Path) -> Result<()> {
    let items = folio.feed_items()?;
    let xml = feed::render_rss(&folio.site, &items)?;
    fs::write(dest.join(FEED_FILE), xml)?;
    Ok(())
}

// Render sitemap.xml
fn render_sitemap(env: &Environment, folio: &Folio, dest: &Path) -> Result<()> {
    let xml = env.get_template(SITEMAP_FILE)?.render(context! {
        entries => folio.sitemap_entries()?,
    })?;
    fs::write(dest.join(SITEMAP_FILE), xml)?;
    Ok(())
}

#[derive(Debug)]
pub struct FolioEngine {
    pub source: PathBuf,
    pub dest: PathBuf,
    folio: Folio,
}

impl FolioEngine {
    pub fn new(source: impl AsRef<Path>, dest: impl AsRef<Path>, folio: Folio) -> Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        if !dest.exists() {
            fs::create_dir_all(&dest)?;
        }
        Ok(FolioEngine {
            source: source.as_ref().to_path_buf(),
            dest,
            folio,
        })
    }

    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = self.source.join("static");
        if static_dir.exists() {
            copy_dir(&static_dir, &self.dest)?;
        }

        // Builtin stylesheet, a user file of the same name wins.
        let dest_static_dir = self.dest.join("static");
        fs::create_dir_all(&dest_static_dir)?;
        let css = dest_static_dir.join("folio.css");
        if !static_dir.join("folio.css").exists() {
            fs::write(css, FOLIO_CSS)?;
        }
        Ok(())
    }

    /// Build the whole site into the dest directory.
    ///
    /// `reload` re-reads the root `folio.toml` before the build.
    pub fn build(&mut self, reload: bool) -> Result<()> {
        let instant = Instant::now();

        if reload {
            self.folio = Folio::parse_from_toml(&self.source)?;
        }
        self.folio.parse(&self.source)?;

        let env = init_jinja(&self.folio)?;
        self.folio.render(&env, Context::new(), &self.dest)?;
        render_rss_feed(&self.folio, &self.dest)?;
        render_sitemap(&env, &self.folio, &self.dest)?;
        self.copy_static_assets()?;

        info!("Build cost: {}ms", instant.elapsed().as_millis());
        Ok(())
    }
}

// A template filter to display an RFC 3339 timestamp as a date.
fn display_date_filter(value: String) -> String {
    match helpers::parse_datetime(&value) {
        Some(datetime) => helpers::format_display_date(&datetime),
        None => value,
    }
}

// A template function to output a URL into an attribute without escaping
// its slashes, so that root paths can still be rewritten afterwards.
fn url_function(url: String) -> JinjaValue {
    let escaped = url
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    JinjaValue::from_safe_string(escaped)
}
