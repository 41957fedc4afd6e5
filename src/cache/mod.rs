//! cache
//!
//! Resource cache (page store).
//!
//! # Design
//!
//! [`PageCache`] maps a cache key (path plus query, see
//! [`cache_key`](crate::core::urls::cache_key)) to an `Arc<Page>`. Both the
//! page table and the in-flight table are [`Registry`]s behind `parking_lot`
//! mutexes, so one cache is shared between the navigation pipeline and hover
//! prefetching without either holding a lock across an await.
//!
//! # Deduplication
//!
//! A fetch is stored in the in-flight table as a [`Shared`] future that
//! resolves to the finished `Arc<Page>`. Every concurrent `load` of the same
//! key awaits a clone of that one future, so exactly one request goes out and
//! all callers observe the same `Arc` (or the same error). The first waiter to
//! wake removes the in-flight entry, stores the page, and applies eviction.
//! The entry is removed on failure too, so a later load retries.
//!
//! # Eviction
//!
//! Once the cache holds more than `max_pages` entries, one entry is dropped:
//! the second key if the current location's key is first, otherwise the
//! first key. The evicted page is torn down before removal.
//!
//! Keys pinned with [`PageCache::pin`] are never chosen. A navigation pins
//! the page it leaves and the page it enters, so neither is torn down while
//! it still needs them. With everything pinned the cache stays over capacity
//! until the pins are released, and is trimmed then.

pub mod page;
pub mod parser;

pub use page::{Page, PageError};
pub use parser::{MarkerParser, MarkupParser};

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use url::Url;

use crate::core::config::{Filters, NavigationConfig};
use crate::core::registry::Registry;
use crate::core::urls::{cache_key, UrlMatcher};
use crate::fetch::{FetchRequest, Fetcher, RequestError};
use crate::host::Window;

/// Header identifying soft-navigation requests to the server.
pub const REQUESTED_WITH_HEADER: (&str, &str) = ("X-Requested-With", "softnav");

type InFlight = Shared<BoxFuture<'static, Result<Arc<Page>, RequestError>>>;

/// Cache settings derived from the session configuration.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub max_pages: usize,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
    pub cache_ignore: UrlMatcher,
}

impl CacheOptions {
    pub fn from_config(config: &NavigationConfig, filters: &Filters) -> Self {
        let mut headers: Vec<(String, String)> = config
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.push((
            REQUESTED_WITH_HEADER.0.to_string(),
            REQUESTED_WITH_HEADER.1.to_string(),
        ));
        Self {
            max_pages: config.max_pages,
            timeout: config.timeout(),
            headers,
            cache_ignore: filters.cache_ignore.clone(),
        }
    }

    fn request(&self) -> FetchRequest {
        FetchRequest {
            headers: self.headers.clone(),
            ..FetchRequest::get()
        }
    }
}

/// Page store with request deduplication and neighbor eviction.
pub struct PageCache {
    options: CacheOptions,
    pages: Mutex<Registry<String, Arc<Page>>>,
    in_flight: Mutex<Registry<String, InFlight>>,
    pinned: Mutex<Vec<String>>,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn MarkupParser>,
    window: Arc<dyn Window>,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("keys", &self.keys())
            .field("in_flight", &self.in_flight_count())
            .field("fetcher", &self.fetcher.name())
            .finish()
    }
}

impl PageCache {
    pub fn new(
        options: CacheOptions,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn MarkupParser>,
        window: Arc<dyn Window>,
    ) -> Self {
        Self {
            options,
            pages: Mutex::new(Registry::new()),
            in_flight: Mutex::new(Registry::new()),
            pinned: Mutex::new(Vec::new()),
            fetcher,
            parser,
            window,
        }
    }

    pub fn parser(&self) -> Arc<dyn MarkupParser> {
        Arc::clone(&self.parser)
    }

    /// Get the page for `url`, from the cache or the network.
    ///
    /// Cached pages are returned without any network activity unless the
    /// URL matches `cache_ignore`. Concurrent loads of one key share a single
    /// request.
    ///
    /// # Errors
    ///
    /// Returns the fetch's `RequestError` (timeout, non-2xx, or transport).
    pub async fn load(&self, url: &Url) -> Result<Arc<Page>, RequestError> {
        let key = cache_key(url);

        if !self.options.cache_ignore.matches(url) {
            if let Some(page) = self.pages.lock().get(&key) {
                tracing::trace!(path = %key, "cache hit");
                return Ok(Arc::clone(page));
            }
        }

        let pending = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&key) {
                Some(existing) => {
                    tracing::debug!(path = %key, "joining in-flight request");
                    existing.clone()
                }
                None => {
                    tracing::debug!(path = %key, url = %url, "fetching page");
                    let pending = self.start(url.clone(), key.clone());
                    in_flight.set(key.clone(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;
        self.settle(&key, &pending, &result);
        result
    }

    /// Fetch the raw markup for `url` with the configured headers and timeout.
    ///
    /// # Errors
    ///
    /// - `Timeout` if the fetch does not settle in time
    /// - `Failed` for a non-2xx status
    /// - `Network` for transport failures
    pub async fn request(&self, url: &Url) -> Result<String, RequestError> {
        fetch_raw(
            Arc::clone(&self.fetcher),
            url.clone(),
            self.options.request(),
            self.options.timeout,
        )
        .await
    }

    fn start(&self, url: Url, key: String) -> InFlight {
        let fetcher = Arc::clone(&self.fetcher);
        let parser = Arc::clone(&self.parser);
        let request = self.options.request();
        let timeout = self.options.timeout;

        async move {
            let raw = fetch_raw(fetcher, url.clone(), request, timeout).await?;
            Ok(Arc::new(Page::new(url, key, raw, parser)))
        }
        .boxed()
        .shared()
    }

    /// Runs once per fetch: the first waiter to get here removes the
    /// in-flight entry and stores the page.
    fn settle(&self, key: &str, pending: &InFlight, result: &Result<Arc<Page>, RequestError>) {
        {
            let mut in_flight = self.in_flight.lock();
            let owned = in_flight.get(key).is_some_and(|f| f.ptr_eq(pending));
            if !owned {
                return;
            }
            in_flight.delete(key);
        }

        match result {
            Ok(page) => self.insert(Arc::clone(page)),
            Err(error) => tracing::debug!(path = %key, %error, "fetch failed"),
        }
    }

    /// Store `page` under its key, evicting a neighbor if over capacity.
    ///
    /// A page replaced by a refetch is torn down unless its key is pinned.
    pub fn insert(&self, page: Arc<Page>) {
        let key = page.key().to_string();
        let mut pages = self.pages.lock();
        if let Some(replaced) = pages.set(key.clone(), Arc::clone(&page)) {
            if !Arc::ptr_eq(&replaced, &page) && !self.pinned.lock().contains(&key) {
                replaced.teardown();
                tracing::debug!(path = %key, "replaced stale page");
            }
        }
        self.evict_over_capacity(&mut pages);
    }

    /// Keep `keys` out of eviction until the returned guard is dropped.
    pub fn pin<I, S>(&self, keys: I) -> PinnedPages<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.pinned.lock().extend(keys.iter().cloned());
        PinnedPages { cache: self, keys }
    }

    /// Keys currently protected from eviction. A key pinned twice appears
    /// twice.
    pub fn pinned(&self) -> Vec<String> {
        self.pinned.lock().clone()
    }

    fn trim(&self) {
        let mut pages = self.pages.lock();
        self.evict_over_capacity(&mut pages);
    }

    fn evict_over_capacity(&self, pages: &mut Registry<String, Arc<Page>>) {
        if pages.len() <= self.options.max_pages {
            return;
        }

        let current = cache_key(&self.window.location());
        let pinned = self.pinned.lock();
        while pages.len() > self.options.max_pages {
            let victim = pages
                .keys()
                .find(|k| **k != current && !pinned.contains(*k))
                .cloned();
            let Some(victim) = victim else {
                tracing::debug!(current = %current, pages = pages.len(), "every cached page is in use");
                return;
            };
            if let Some(evicted) = pages.delete(&victim) {
                evicted.teardown();
                tracing::debug!(path = %victim, current = %current, "evicted page");
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Page>> {
        self.pages.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pages.lock().has(key)
    }

    /// True if `url` would be served from the cache.
    pub fn is_cached(&self, url: &Url) -> bool {
        !self.options.cache_ignore.matches(url) && self.contains(&cache_key(url))
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Page>> {
        let removed = self.pages.lock().delete(key);
        if let Some(page) = &removed {
            page.teardown();
        }
        removed
    }

    /// Cached keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.pages.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Tear down and drop every cached page.
    pub fn clear(&self) {
        self.pages.lock().drain_with(|_, page| page.teardown());
        self.in_flight.lock().clear();
    }
}

/// Pins taken by [`PageCache::pin`]. Dropping it releases them and trims the
/// cache back to `max_pages`.
pub struct PinnedPages<'a> {
    cache: &'a PageCache,
    keys: Vec<String>,
}

impl std::fmt::Debug for PinnedPages<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedPages").field("keys", &self.keys).finish()
    }
}

impl Drop for PinnedPages<'_> {
    fn drop(&mut self) {
        {
            let mut pinned = self.cache.pinned.lock();
            for key in &self.keys {
                if let Some(position) = pinned.iter().position(|k| k == key) {
                    pinned.swap_remove(position);
                }
            }
        }
        self.cache.trim();
    }
}

async fn fetch_raw(
    fetcher: Arc<dyn Fetcher>,
    url: Url,
    request: FetchRequest,
    timeout: Duration,
) -> Result<String, RequestError> {
    let response = match tokio::time::timeout(timeout, fetcher.fetch(&url, &request)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(RequestError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    };

    if !response.is_success() {
        return Err(RequestError::Failed {
            url: url.to_string(),
            status: response.status,
            status_text: response.status_text,
        });
    }
    Ok(response.body)
}
