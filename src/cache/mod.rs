//! Key/value response cache with per-entry time-to-live.
//!
//! This module knows nothing about WCL. It provides:
//! - A `CacheStorage` trait over a flat `get`/`set` store of JSON values
//! - A SQLite implementation (on disk or in memory) and a no-op implementation
//! - A `CacheLayer` that does get-or-populate around an async fetcher

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, DEFAULT_TTL_SECS};
pub use storage::{CacheStorage, CachedEntry, NoopStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource};
