//! Strata: Contextual Hierarchical Configuration
//!
//! A hierarchical configuration store: slash-separated keys with per-key
//! metadata, grouped into keysets, resolved through a layered context. The
//! core is the contextual resolution and caching layer: templated key paths
//! bound to typed values, kept consistent through a four-tier invalidation
//! protocol as layer bindings and the underlying keyset change.

pub mod backend;
pub mod context;
pub mod error;
pub mod format;
pub mod key;
pub mod keyset;
pub mod logging;
pub mod merge;
pub mod resolve;
