//! # reinhardt-admin-confirm-cache
//!
//! Cache backends used to carry state across the confirmation round trip.
//!
//! An admin confirmation page cannot re-submit everything the first request
//! carried (uploaded files in particular), so the unsaved object and the raw
//! uploads are parked here for a few seconds until the user confirms.
//!
//! ## Examples
//!
//! ```
//! use reinhardt_admin_confirm_cache::{Cache, InMemoryCache};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cache = InMemoryCache::new().with_default_ttl(Duration::from_secs(10));
//! cache.set("key", &"value", None).await.unwrap();
//!
//! let value: Option<String> = cache.get("key").await.unwrap();
//! assert_eq!(value.as_deref(), Some("value"));
//! # }
//! ```

mod cache_trait;
mod entry;
mod error;
mod in_memory;
mod statistics;

pub use cache_trait::Cache;
pub use error::{CacheError, CacheResult};
pub use in_memory::InMemoryCache;
pub use statistics::{CacheEntryInfo, CacheStatistics};
