use std::borrow::Cow;

use serde::Serialize;

/// The meta info of the HTML page, rendered into `<head>`.
#[derive(Debug, Default, Serialize)]
pub struct Meta<'a> {
    pub title: Cow<'a, str>,
    pub description: Cow<'a, str>,
    /// Path of the page relative to the site root.
    pub url: Option<Cow<'a, str>>,
    pub image: Option<Cow<'a, str>>,
}
