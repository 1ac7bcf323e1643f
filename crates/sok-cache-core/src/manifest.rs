//! The install-time asset manifest and the versioned cache name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CacheRequest;

/// Critical-path assets of the site. Must be kept in sync with the deployed
/// asset paths by hand.
pub const DEFAULT_MANIFEST: [&str; 4] = ["/", "/css/styles.css", "/js/main.js", "/images/logo.webp"];

/// Application part of the default cache name
pub const DEFAULT_APP_NAME: &str = "sok-beauty";

/// Version part of the default cache name
pub const DEFAULT_CACHE_VERSION: u32 = 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Manifest entry {0} is empty")]
    EmptyUrl(usize),

    #[error("Manifest lists {0} more than once")]
    DuplicateUrl(String),

    #[error("Invalid cache name '{0}': expected <app>-v<version>")]
    InvalidCacheName(String),
}

/// Ordered, duplicate-free list of URLs fetched on install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Manifest {
    urls: Vec<String>,
}

impl Manifest {
    pub fn new<I, S>(urls: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut checked: Vec<String> = Vec::new();
        for (index, url) in urls.into_iter().enumerate() {
            let url = url.into().trim().to_string();
            if url.is_empty() {
                return Err(ManifestError::EmptyUrl(index));
            }
            if checked.contains(&url) {
                return Err(ManifestError::DuplicateUrl(url));
            }
            checked.push(url);
        }
        Ok(Self { urls: checked })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    /// One GET request per manifest URL, in manifest order
    pub fn requests(&self) -> impl Iterator<Item = CacheRequest> + '_ {
        self.urls.iter().map(|url| CacheRequest::get(url.clone()))
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            urls: DEFAULT_MANIFEST.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for Manifest {
    type Error = ManifestError;

    fn try_from(urls: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(urls)
    }
}

impl From<Manifest> for Vec<String> {
    fn from(manifest: Manifest) -> Self {
        manifest.urls
    }
}

/// Version-tagged cache identifier such as `sok-beauty-v1`.
///
/// Each distinct name scopes its own cache store; bumping the version is the
/// only way previously stored entries get replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheName {
    app: String,
    version: u32,
}

impl CacheName {
    pub fn new(app: impl Into<String>, version: u32) -> Self {
        Self {
            app: app.into(),
            version,
        }
    }

    pub fn parse(s: &str) -> Result<Self, ManifestError> {
        let invalid = || ManifestError::InvalidCacheName(s.to_string());
        let (app, version) = s.rsplit_once("-v").ok_or_else(invalid)?;
        if app.is_empty() || app.contains(['/', '\\']) {
            return Err(invalid());
        }
        // Canonical decimal only, so that parse and Display agree
        let canonical = !version.is_empty()
            && version.bytes().all(|b| b.is_ascii_digit())
            && (version == "0" || !version.starts_with('0'));
        if !canonical {
            return Err(invalid());
        }
        let version = version.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(app, version))
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The next version of this cache name
    pub fn bump(&self) -> Self {
        Self::new(self.app.clone(), self.version.saturating_add(1))
    }
}

impl Default for CacheName {
    fn default() -> Self {
        Self::new(DEFAULT_APP_NAME, DEFAULT_CACHE_VERSION)
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.app, self.version)
    }
}

impl FromStr for CacheName {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CacheName {
    type Error = ManifestError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CacheName> for String {
    fn from(name: CacheName) -> Self {
        name.to_string()
    }
}
