use pulldown_cmark::Event::{Code, End, HardBreak, Rule, SoftBreak, Start, Text};
use pulldown_cmark::{html, Options, Parser, Tag};

/// Render markdown into HTML.
///
/// Tables, footnotes, strikethrough and task lists are enabled.
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut buffer = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut buffer, Parser::new_ext(markdown, options));
    buffer
}

/// Extract the description from markdown content.
///
/// The strategy is extract the first meaningful line,
/// and only take at most 200 plain chars from this line.
pub fn extract_description(markdown: &str) -> String {
    markdown
        .lines()
        .find_map(|line| {
            // Ignore heading, image line.
            let line = line.trim();
            if line.is_empty() || line.starts_with(&['#', '!']) {
                return None;
            }
            let raw = strip_markdown(line);
            let raw = raw.trim();
            if raw.is_empty() {
                None
            } else {
                Some(raw.chars().take(200).collect::<String>().replace('"', "'"))
            }
        })
        .unwrap_or_default()
}

/// Convert markdown into plain text.
#[must_use]
pub fn strip_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut buffer = String::new();
    for event in Parser::new_ext(markdown, options) {
        match event {
            Start(Tag::CodeBlock(_) | Tag::List(_)) => buffer.push('\n'),
            Start(Tag::Link(_, _, title)) if !title.is_empty() => buffer.push_str(&title),
            End(
                Tag::Heading(..) | Tag::BlockQuote | Tag::CodeBlock(_) | Tag::Item | Tag::Table(_),
            ) => buffer.push('\n'),
            Text(text) | Code(text) => buffer.push_str(&text),
            SoftBreak | HardBreak | Rule => buffer.push('\n'),
            _ => (),
        }
    }
    buffer
}
