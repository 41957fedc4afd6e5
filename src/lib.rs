//! softnav - soft navigation engine
//!
//! Intercepts link activation, fetches the target document, swaps a marked
//! content region in place, runs a named transition between old and new
//! content, and keeps session history consistent with what the user sees.
//!
//! # Architecture
//!
//! The codebase is layered; each layer only depends on the ones above it:
//!
//! - [`core`] - Navigation states, URLs, registry, configuration
//! - [`events`] - Named-event bus every other layer reports through
//! - [`host`] - Document, native history and window collaborators
//! - [`history`] - Session history store mirrored to native history
//! - [`fetch`] - Network collaborator (reqwest-backed and in-memory)
//! - [`cache`] - Pages, markup parsing, deduplicating bounded page cache
//! - [`transition`] - Transition registry and lifecycle engine
//! - [`engine`] - Navigation controller and link qualification
//! - [`router`] - Optional path-pattern callbacks on completed navigations
//! - [`cli`] - The `softnav` binary
//!
//! # Invariants
//!
//! 1. At most one navigation is in flight per controller
//! 2. History is committed only after both pages have loaded
//! 3. Concurrent requests for one URL share a single fetch
//! 4. The cache never holds more than `max_pages` pages

pub mod cache;
pub mod cli;
pub mod core;
pub mod engine;
pub mod events;
pub mod fetch;
pub mod history;
pub mod host;
pub mod router;
pub mod transition;
