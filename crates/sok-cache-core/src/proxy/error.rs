use thiserror::Error;

use crate::network::NetworkError;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Install of {cache_name} failed on {url}: {source}")]
    InstallFailed {
        cache_name: String,
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ProxyError {
    pub fn is_install_failure(&self) -> bool {
        matches!(self, ProxyError::InstallFailed { .. })
    }
}
