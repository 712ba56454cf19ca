// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Append a path to a root URL.
///
/// A doubled `/` at the seam is collapsed; absolute links are returned as-is.
///
/// # Examples
/// ```
/// use whatson::utils::url::join_root;
///
/// assert_eq!(
///     join_root("https://example.com/", "/shows/1"),
///     "https://example.com/shows/1"
/// );
/// ```
pub fn join_root(root: &str, path: &str) -> String {
    if is_absolute(path) {
        return path.to_string();
    }

    match (root.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", root, &path[1..]),
        _ => format!("{root}{path}"),
    }
}

/// Resolve a potentially relative URL against the URL of the page it came from.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Whether a link carries its own scheme.
pub fn is_absolute(link: &str) -> bool {
    link.starts_with("http://") || link.starts_with("https://") || link.starts_with("//")
}

/// Check that a configured URL is absolute and parseable.
pub fn validate(url: &str) -> Result<Url, url::ParseError> {
    Url::parse(url)
}
