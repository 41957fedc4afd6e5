//! fetch
//!
//! Page fetching collaborators.
//!
//! # Architecture
//!
//! The page cache depends only on the [`Fetcher`] trait:
//!
//! - [`HttpFetcher`] issues real requests through reqwest
//! - [`mock::MockFetcher`] serves canned responses for tests
//!
//! Timeouts and status checks are applied by the cache, not here.

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpFetcher;
pub use traits::{Credentials, FetchRequest, FetchResponse, Fetcher, RequestError};
