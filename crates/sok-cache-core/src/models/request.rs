use std::fmt;

use serde::{Deserialize, Serialize};

/// Method used when a request is built from a bare URL.
pub const DEFAULT_METHOD: &str = "GET";

/// An outgoing request as seen by the proxy.
///
/// Only the method and the URL take part in cache lookups; two requests with
/// the same method and URL always resolve to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheRequest {
    pub method: String,
    pub url: String,
}

impl CacheRequest {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.trim().to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Shorthand for a GET request, the only kind the manifest produces.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(DEFAULT_METHOD, url)
    }

    pub fn is_get(&self) -> bool {
        self.method == DEFAULT_METHOD
    }

    /// Key under which this request is stored, e.g. `GET /css/styles.css`.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl fmt::Display for CacheRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_normalized() {
        let request = CacheRequest::new(" get ", "/");
        assert_eq!(request.method, "GET");
        assert!(request.is_get());
        assert_eq!(request, CacheRequest::get("/"));
    }

    #[test]
    fn test_cache_key_separates_methods() {
        let get = CacheRequest::get("/js/main.js");
        let post = CacheRequest::new("POST", "/js/main.js");
        assert_eq!(get.cache_key(), "GET /js/main.js");
        assert_ne!(get.cache_key(), post.cache_key());
    }
}
