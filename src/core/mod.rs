//! core
//!
//! Shared types and utilities used by every other layer.
//!
//! # Modules
//!
//! - [`types`] - Navigation states, history payloads, direction and trigger
//! - [`registry`] - Insertion-ordered keyed container
//! - [`urls`] - Cache keys, origin checks, URL filters
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod registry;
pub mod types;
pub mod urls;
