//! fetch::mock
//!
//! Mock fetcher for deterministic testing.
//!
//! # Design
//!
//! Routes are keyed by path and query (the same key the page cache uses), so
//! tests can register `/a` without caring about the origin. Each route may
//! carry a delay, which is served with `tokio::time::sleep` and therefore
//! follows paused test time. Every request is recorded before the delay so
//! deduplication tests can count requests while they are still in flight.
//!
//! # Example
//!
//! ```
//! use softnav::fetch::mock::MockFetcher;
//! use softnav::fetch::{FetchRequest, Fetcher};
//! use url::Url;
//!
//! # tokio_test::block_on(async {
//! let fetcher = MockFetcher::new().with_page("/a", "<title>A</title>");
//!
//! let url = Url::parse("https://example.com/a").unwrap();
//! let response = fetcher.fetch(&url, &FetchRequest::get()).await.unwrap();
//! assert_eq!(response.status, 200);
//! assert_eq!(fetcher.request_count("/a"), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use super::traits::{FetchRequest, FetchResponse, Fetcher, RequestError};
use crate::core::urls::cache_key;

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub response: FetchResponse,
    pub delay: Option<Duration>,
}

/// Recorded request for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub url: String,
    pub key: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct MockFetcherInner {
    routes: HashMap<String, MockRoute>,
    fail_on: HashMap<String, RequestError>,
    requests: Vec<MockRequest>,
}

/// Mock fetcher for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    inner: Arc<Mutex<MockFetcherInner>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `path`.
    pub fn with_page(self, path: &str, body: impl Into<String>) -> Self {
        self.route(path, FetchResponse::ok(body), None);
        self
    }

    /// Serve `body` at `path` after `delay`.
    pub fn with_delayed_page(self, path: &str, body: impl Into<String>, delay: Duration) -> Self {
        self.route(path, FetchResponse::ok(body), Some(delay));
        self
    }

    /// Answer `path` with an arbitrary status.
    pub fn with_status(self, path: &str, status: u16, status_text: &str) -> Self {
        let response = FetchResponse {
            status,
            status_text: status_text.to_string(),
            body: String::new(),
        };
        self.route(path, response, None);
        self
    }

    /// Register or replace a route.
    pub fn route(&self, path: &str, response: FetchResponse, delay: Option<Duration>) {
        self.inner
            .lock()
            .routes
            .insert(path.to_string(), MockRoute { response, delay });
    }

    /// Fail every request for `path` with `error`.
    pub fn fail_on(&self, path: &str, error: RequestError) {
        self.inner.lock().fail_on.insert(path.to_string(), error);
    }

    /// Stop failing requests for `path`.
    pub fn clear_failure(&self, path: &str) {
        self.inner.lock().fail_on.remove(path);
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.inner.lock().requests.clone()
    }

    /// Number of requests received for `key`.
    pub fn request_count(&self, key: &str) -> usize {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|r| r.key == key)
            .count()
    }

    pub fn total_requests(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn clear_requests(&self) {
        self.inner.lock().requests.clear();
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url, request: &FetchRequest) -> Result<FetchResponse, RequestError> {
        let key = cache_key(url);
        let (route, failure) = {
            let mut inner = self.inner.lock();
            inner.requests.push(MockRequest {
                url: url.to_string(),
                key: key.clone(),
                method: request.method.clone(),
                headers: request.headers.clone(),
            });
            (
                inner.routes.get(&key).cloned(),
                inner.fail_on.get(&key).cloned(),
            )
        };

        if let Some(error) = failure {
            return Err(error);
        }

        let Some(route) = route else {
            return Ok(FetchResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: String::new(),
            });
        };

        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(route.response)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
