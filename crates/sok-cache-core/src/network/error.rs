use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unsupported method: {0}")]
    InvalidMethod(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected status {status} for {url}: {body}")]
    BadStatus {
        url: String,
        status: u16,
        body: String,
    },
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl NetworkError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &[u8]) -> String {
        let text = String::from_utf8_lossy(body);
        if text.chars().count() <= MAX_ERROR_BODY_LENGTH {
            text.into_owned()
        } else {
            let head: String = text.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", head, body.len())
        }
    }

    /// Classify a failed send: refused or unreachable hosts become
    /// `Connection`, everything else stays a `Request` error.
    pub fn from_send(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            NetworkError::Connection(format!("{}: {}", url, err))
        } else {
            NetworkError::Request(err)
        }
    }

    pub fn from_status(url: &str, status: u16, body: &[u8]) -> Self {
        NetworkError::BadStatus {
            url: url.to_string(),
            status,
            body: Self::truncate_body(body),
        }
    }
}
