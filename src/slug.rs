use crate::{entity::Frontmatter, error::FolioError};

/// Derive the URL slug of an entry from its frontmatter.
///
/// The explicit `slug` field takes precedence over the title.
pub fn slugify_frontmatter(frontmatter: &Frontmatter) -> Result<String, FolioError> {
    let source = frontmatter
        .slug
        .as_deref()
        .filter(|slug| !slug.trim().is_empty())
        .unwrap_or(&frontmatter.title);
    slugify(source)
}

/// Convert `text` into a URL-safe token.
///
/// Letters and digits are lower-cased, `-` and `_` are kept, every whitespace
/// char becomes `-` and anything else is dropped. Consecutive separators are
/// not collapsed, so `Rust & Go` becomes `rust--go`.
pub fn slugify(text: &str) -> Result<String, FolioError> {
    let slug = text
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('-'),
            _ => None,
        })
        .collect::<String>();

    if slug.chars().all(|c| c == '-') {
        return Err(FolioError::EmptySlug(text.to_owned()));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::slugify;

    #[test_case("Hello World", "hello-world"; "spaces")]
    #[test_case("Hello, World!", "hello-world"; "punctuation")]
    #[test_case("Rust & Go", "rust--go"; "symbol between spaces")]
    #[test_case("  Padded Title ", "padded-title"; "trimmed")]
    #[test_case("snake_case-and-kebab", "snake_case-and-kebab"; "separators kept")]
    #[test_case("Ünïcödé Tïtle", "ünïcödé-tïtle"; "unicode letters")]
    #[test_case("Version 2.0", "version-20"; "dots dropped")]
    fn test_slugify(text: &str, expected: &str) {
        assert_eq!(slugify(text).unwrap(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("!!!"; "only punctuation")]
    #[test_case(" - "; "only separators")]
    fn test_slugify_empty(text: &str) {
        assert!(slugify(text).is_err());
    }
}
