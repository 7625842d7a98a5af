use anyhow::Result;
use lol_html::{element, html_content::Element, HtmlRewriter, Settings};

/// Rewrite root path URLs in `raw_html` to live under `site_url`.
///
/// Needed when the site is deployed under a sub-path, such as
/// `https://example.com/blog`. Relative, absolute and protocol-relative
/// URLs are left alone.
pub fn rewrite_html_base_url(raw_html: &[u8], site_url: &str) -> Result<Vec<u8>> {
    let site_url = site_url.trim_end_matches('/');
    let rewrite_url_in_attr = |el: &mut Element, attr_name: &str| -> Result<()> {
        if let Some(attr) = el.get_attribute(attr_name) {
            if attr.starts_with('/') && !attr.starts_with("//") {
                el.set_attribute(attr_name, &format!("{site_url}{attr}"))?;
            }
        }
        Ok(())
    };

    let mut html = vec![];
    let mut html_rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("a[href], link[href]", |el| {
                    rewrite_url_in_attr(el, "href")?;
                    Ok(())
                }),
                element!(
                    "script[src], iframe[src], img[src], audio[src], video[src]",
                    |el| {
                        rewrite_url_in_attr(el, "src")?;
                        Ok(())
                    }
                ),
                element!("meta[content]", |el| {
                    rewrite_url_in_attr(el, "content")?;
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| {
            html.extend_from_slice(c);
        },
    );
    html_rewriter.write(raw_html)?;
    html_rewriter.end()?;

    Ok(html)
}
