//! fetch::traits
//!
//! Fetcher trait definition for retrieving page markup.
//!
//! # Design
//!
//! The `Fetcher` trait is async because fetching involves network I/O. It
//! mirrors the browser's `fetch`: a response with any status is a success at
//! this level. Turning non-2xx statuses and timeouts into errors is the page
//! cache's job, so every fetcher behaves identically there.
//!
//! # Example
//!
//! ```ignore
//! use softnav::fetch::{Fetcher, FetchRequest};
//!
//! async fn body(fetcher: &dyn Fetcher, url: &url::Url) -> Result<String, RequestError> {
//!     let response = fetcher.fetch(url, &FetchRequest::get()).await?;
//!     Ok(response.body)
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors from fetching a page.
///
/// `Clone` so that one settled in-flight request can hand the same error to
/// every caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The request did not settle within the configured timeout.
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout {
        url: String,
        timeout_ms: u64,
    },

    /// The server answered with a non-2xx status.
    #[error("request to {url} failed: {status} {status_text}")]
    Failed {
        url: String,
        status: u16,
        status_text: String,
    },

    /// The request never produced a response.
    #[error("network error for {url}: {message}")]
    Network {
        url: String,
        message: String,
    },
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            RequestError::Timeout { url, .. }
            | RequestError::Failed { url, .. }
            | RequestError::Network { url, .. } => url,
        }
    }
}

/// Credentials mode, as in the browser's fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// A request to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub credentials: Credentials,
}

impl FetchRequest {
    /// A plain `GET` with no extra headers.
    pub fn get() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            credentials: Credentials::SameOrigin,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A response as seen by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves raw page markup.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one fetcher is shared by every
/// request a page cache issues.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue `request` against `url`.
    ///
    /// Only transport failures are errors here; any HTTP status is returned
    /// as a response.
    async fn fetch(&self, url: &Url, request: &FetchRequest) -> Result<FetchResponse, RequestError>;

    /// Human-readable fetcher name, for diagnostics.
    fn name(&self) -> &'static str;
}
