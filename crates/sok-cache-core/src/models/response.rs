/// A response body together with its status line and headers.
///
/// Headers keep their original order, casing and raw value bytes; name
/// lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for 2xx statuses
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Raw value of the first header called `name`
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_slice())
    }

    /// Header value as text, `None` when absent or not valid UTF-8
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ok_covers_2xx_only() {
        assert!(CachedResponse::new(200, "").is_ok());
        assert!(CachedResponse::new(204, "").is_ok());
        assert!(!CachedResponse::new(304, "").is_ok());
        assert!(!CachedResponse::new(404, "").is_ok());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = CachedResponse::new(200, "body {}")
            .with_header("Content-Type", "text/css");
        assert_eq!(response.header_str("content-type"), Some("text/css"));
        assert_eq!(response.header("etag"), None);
        assert_eq!(response.text(), "body {}");
    }

    #[test]
    fn test_non_utf8_header_kept_as_bytes() {
        let response = CachedResponse::new(200, "").with_header("X-Name", b"caf\xE9".to_vec());
        assert_eq!(response.header("x-name"), Some(&b"caf\xE9"[..]));
        assert_eq!(response.header_str("x-name"), None);
    }
}
