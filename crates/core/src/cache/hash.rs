//! Request key generation.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the cache key for a request: SHA-256 over the uppercase method
/// and the URL without its fragment.
pub fn compute_request_key(method: &str, url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalized.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let a = compute_request_key("GET", &url("http://localhost:3000/api/songs/42"));
        let b = compute_request_key("GET", &url("http://localhost:3000/api/songs/42"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_fragment_and_host_case() {
        let a = compute_request_key("GET", &url("http://LOCALHOST:3000/album/7#faixas"));
        let b = compute_request_key("GET", &url("http://localhost:3000/album/7"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        let a = compute_request_key("get", &url("http://localhost:3000/"));
        let b = compute_request_key("GET", &url("http://localhost:3000/"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_keeps_query() {
        let a = compute_request_key("GET", &url("http://localhost:3000/api/songs?page=1"));
        let b = compute_request_key("GET", &url("http://localhost:3000/api/songs?page=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", &url("http://localhost:3000/"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
