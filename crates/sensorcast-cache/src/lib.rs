//! In-memory TTL cache for serialized payloads.
//!
//! This crate provides a content-agnostic key/value store with:
//! - Per-entry expiry checked on every read (an expired entry is a miss)
//! - A background sweeper that physically removes expired entries
//! - Reader-shared / writer-exclusive locking
//!
//! # Example
//!
//! ```rust,ignore
//! use sensorcast_cache::{CacheConfig, TtlCache};
//!
//! let cache = TtlCache::new(CacheConfig::default());
//! let sweeper = cache.spawn_sweeper(shutdown.child_token());
//!
//! cache.set("all_sensors", payload, Duration::from_secs(30));
//! if let Some(bytes) = cache.get("all_sensors") {
//!     // fresh hit
//! }
//! ```

mod cache;
mod config;
mod entry;

pub use cache::TtlCache;
pub use config::{CacheConfig, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
pub use entry::CacheEntry;
