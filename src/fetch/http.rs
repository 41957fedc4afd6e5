//! fetch::http
//!
//! reqwest-backed [`Fetcher`].
//!
//! # Credentials
//!
//! reqwest has no notion of the browser's credentials modes. `Omit` strips any
//! `Cookie` header the caller configured; `SameOrigin` and `Include` send
//! headers as given.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE, USER_AGENT};
use reqwest::{Client, Method};
use url::Url;

use super::traits::{Credentials, FetchRequest, FetchResponse, Fetcher, RequestError};

/// User-Agent header value for page requests.
const USER_AGENT_VALUE: &str = concat!("softnav/", env!("CARGO_PKG_VERSION"));

/// Fetches pages over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn headers(url: &Url, request: &FetchRequest) -> Result<HeaderMap, RequestError> {
        let invalid = |message: String| RequestError::Network {
            url: url.to_string(),
            message,
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| invalid(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| invalid(format!("invalid header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }
        if request.credentials == Credentials::Omit {
            headers.remove(COOKIE);
        }
        Ok(headers)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, request: &FetchRequest) -> Result<FetchResponse, RequestError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            RequestError::Network {
                url: url.to_string(),
                message: format!("unsupported method '{}': {}", request.method, e),
            }
        })?;
        let headers = Self::headers(url, request)?;

        let response = self
            .client
            .request(method, url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| RequestError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| RequestError::Network {
            url: url.to_string(),
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
