//! HTTP implementation of [`Network`] on top of reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use super::{Network, NetworkError};
use crate::models::{CacheRequest, CachedResponse};

/// Fetches site-relative URLs against a fixed origin.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: String,
}

impl HttpNetwork {
    /// Create a client for `origin` (e.g. `https://sokbeauty.example`).
    /// Without a timeout a hanging server hangs the caller.
    pub fn new(origin: &str, timeout: Option<Duration>) -> Result<Self, NetworkError> {
        let origin = origin.trim().trim_end_matches('/');
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(NetworkError::InvalidUrl(origin.to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            origin: origin.to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Absolute URLs pass through; anything else is joined to the origin.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.origin, url)
        } else {
            format!("{}/{}", self.origin, url)
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<CachedResponse, NetworkError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| NetworkError::InvalidMethod(request.method.clone()))?;
        let url = self.resolve(&request.url);

        let response = self
            .client
            .request(method, &url)
            .send()
            .await
            .map_err(|e| NetworkError::from_send(&url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!(url = %url, status = status, bytes = body.len(), "Network response");

        Ok(CachedResponse {
            status,
            headers,
            body,
        })
    }
}
