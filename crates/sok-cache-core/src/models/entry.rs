use chrono::{DateTime, Utc};

use super::{CacheRequest, CachedResponse};

/// A response held by a cache store, keyed by the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub request: CacheRequest,
    pub response: CachedResponse,
    pub stored_at: DateTime<Utc>,
}

impl StoredEntry {
    pub fn new(request: CacheRequest, response: CachedResponse) -> Self {
        Self {
            request,
            response,
            stored_at: Utc::now(),
        }
    }

    pub fn key(&self) -> String {
        self.request.cache_key()
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.stored_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Covers clock skew as well
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}
