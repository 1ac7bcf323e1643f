//! Scripted network used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{CacheRequest, CachedResponse};
use crate::network::{Network, NetworkError};

enum Reply {
    Respond(CachedResponse),
    Fail(String),
}

/// Answers from a fixed table and counts every call. Unknown URLs get a 404.
#[derive(Default)]
pub struct MockNetwork {
    replies: HashMap<String, Reply>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A network serving `body` with status 200 for each of `urls`
    pub fn serving(urls: &[&str]) -> Self {
        urls.iter().fold(Self::new(), |network, url| {
            network.respond(url, CachedResponse::new(200, format!("body of {}", url)))
        })
    }

    pub fn respond(mut self, url: &str, response: CachedResponse) -> Self {
        self.replies.insert(url.to_string(), Reply::Respond(response));
        self
    }

    pub fn fail(mut self, url: &str) -> Self {
        self.replies
            .insert(url.to_string(), Reply::Fail(format!("connection refused for {}", url)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.requested.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &CacheRequest) -> Result<CachedResponse, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(request.url.clone());
        match self.replies.get(&request.url) {
            Some(Reply::Respond(response)) => Ok(response.clone()),
            Some(Reply::Fail(reason)) => Err(NetworkError::Connection(reason.clone())),
            None => Ok(CachedResponse::new(404, "not found")),
        }
    }
}
