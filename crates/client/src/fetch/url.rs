//! URL resolution for requests handed to the worker by its host.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Schemes a page can issue requests with that the worker may see.
const ACCEPTED_SCHEMES: &[&str] = &["http", "https", "chrome-extension"];

/// Resolve a request URL as the page would.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve paths (`/api/songs`) against the app origin
/// 3. Lowercase the host (done by the parser for http/https)
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// `chrome-extension:` URLs are accepted so the router can ignore them.
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        url::Url::parse(trimmed)
    } else {
        origin.join(trimmed)
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    if !ACCEPTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve(&origin(), "https://xyz.supabase.co/storage/v1/object/public/covers/1.jpg").unwrap();
        assert_eq!(url.host_str(), Some("xyz.supabase.co"));
        assert_eq!(url.path(), "/storage/v1/object/public/covers/1.jpg");
    }

    #[test]
    fn test_resolve_path_against_origin() {
        let url = resolve(&origin(), "/api/songs/42").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/songs/42");
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://OUCAAQUI.COM.BR/album/1").unwrap();
        assert_eq!(url.host_str(), Some("oucaaqui.com.br"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/artist/9#discografia").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/artist/9");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/api/songs?genre=forro&page=2").unwrap();
        assert_eq!(url.query(), Some("genre=forro&page=2"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /index.html  ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/index.html");
    }

    #[test]
    fn test_resolve_chrome_extension_accepted() {
        let url = resolve(&origin(), "chrome-extension://abcdef/content.js").unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }
}
