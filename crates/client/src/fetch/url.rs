//! URL canonicalization for request identity.
//!
//! The canonical string form of a URL is the cache key: two requests share
//! an entry exactly when their canonical URLs are equal.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a request URL against the application origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve origin-relative paths (`/static/a.css`) against `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        origin.join(trimmed)
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://app.test").unwrap()
    }

    #[test]
    fn test_canonicalize_relative_path() {
        let url = canonicalize(&origin(), "/static/css/style.css").unwrap();
        assert_eq!(url.as_str(), "http://app.test/static/css/style.css");
    }

    #[test]
    fn test_canonicalize_absolute_url_keeps_host() {
        let url = canonicalize(&origin(), "https://cdn.example.com/font.woff2").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize(&origin(), "https://EXAMPLE.COM/Path").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn test_canonicalize_remove_fragment_preserve_query() {
        let url = canonicalize(&origin(), "/admin?evento=2#top").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("evento=2"));
        assert_eq!(url.as_str(), "http://app.test/admin?evento=2");
    }

    #[test]
    fn test_canonicalize_same_identity() {
        let a = canonicalize(&origin(), " /a.css ").unwrap();
        let b = canonicalize(&origin(), "http://APP.test/a.css#x").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize(&origin(), "   "), Err(UrlError::Empty)));
    }
}
