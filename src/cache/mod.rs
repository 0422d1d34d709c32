//! In-memory caching layer.
//!
//! This module provides a domain-agnostic key/value cache where:
//! - Every entry carries its own absolute expiry (TTL set at write time)
//! - Expired entries are indistinguishable from missing ones
//! - Clones share one store, safe for concurrent readers and writers

mod ttl;

pub use ttl::TtlCache;
