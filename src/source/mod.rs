//! Clients for the external services the report is assembled from
//!
//! Every source is an HTTP collaborator that hands raw version strings to
//! the normalizer. Each client takes its base URL so tests can point it at a
//! local mock server.
//!
//! # Modules
//!
//! - [`koji`]: Koji hub client (XML-RPC), package set and per-tag builds
//! - [`upstream`]: release-monitoring.org project versions
//! - [`bootstrap`]: javapackages-bootstrap project descriptors
//! - [`comments`]: free-form per-package comments and tags
//! - [`groups`]: optional named package groups
//! - [`xmlrpc`]: the minimal XML-RPC codec Koji speaks

pub mod bootstrap;
pub mod comments;
pub mod groups;
pub mod koji;
pub mod upstream;
pub mod xmlrpc;

use std::future::Future;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub use bootstrap::BootstrapRepo;
pub use comments::CommentsFile;
pub use groups::GroupsEndpoint;
pub use koji::KojiHub;
pub use upstream::ReleaseMonitoring;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("package not found: {0}")]
    NotFound(String),

    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i32, message: String },
}

impl SourceError {
    /// Transport failures and server-side errors are worth another attempt;
    /// everything else is a property of the request itself.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(status) => status.is_server_error(),
            _ => false,
        }
    }
}

/// A source that reports version strings for a single package, newest first.
///
/// Implemented by the per-package sources ([`ReleaseMonitoring`],
/// [`BootstrapRepo`]); the Koji hubs answer per-tag batch queries and have
/// their own interface.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionSource: Send + Sync {
    /// Short identifier used in log messages
    fn name(&self) -> &'static str;

    /// Raw, un-normalized version strings as reported by the source
    async fn fetch_raw_versions(&self, package: &str) -> Result<Vec<String>, SourceError>;
}

/// Explicit retry policy for the outbound HTTP calls: a bounded number of
/// attempts with a fixed pause, retrying only transient failures.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails non-transiently, or the attempts
    /// are exhausted.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    warn!("{what}: attempt {attempt} failed, retrying: {err}");
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(self.backoff_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Map a reqwest status check onto [`SourceError`], keeping 404 distinct so
/// callers can treat an absent package as data rather than failure.
pub(crate) fn check_status(
    response: reqwest::Response,
    package: &str,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound(package.to_string()));
    }
    if !status.is_success() {
        return Err(SourceError::Status(status));
    }
    Ok(response)
}
