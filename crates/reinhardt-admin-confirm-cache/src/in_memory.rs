//! In-memory cache implementation

use crate::cache_trait::Cache;
use crate::entry::CacheEntry;
use crate::error::CacheResult;
use crate::statistics::{CacheEntryInfo, CacheStatistics};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

type Store = RwLock<HashMap<String, CacheEntry>>;

/// Process-local cache backend
///
/// Clones share the same store, so one instance can be handed to every
/// admin that needs a round-trip cache.
#[derive(Clone)]
pub struct InMemoryCache {
	store: Arc<Store>,
	default_ttl: Option<Duration>,
	cleanup_interval: Option<Duration>,
	hits: Arc<AtomicU64>,
	misses: Arc<AtomicU64>,
}

impl InMemoryCache {
	/// Create a new in-memory cache without a default TTL
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
			default_ttl: None,
			cleanup_interval: None,
			hits: Arc::new(AtomicU64::new(0)),
			misses: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Set a default TTL for entries stored without an explicit one
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_cache::{Cache, InMemoryCache};
	/// use std::time::Duration;
	///
	/// # #[tokio::main]
	/// # async fn main() {
	/// let cache = InMemoryCache::new().with_default_ttl(Duration::from_millis(10));
	/// cache.set("key", &"value", None).await.unwrap();
	///
	/// tokio::time::sleep(Duration::from_millis(30)).await;
	///
	/// let value: Option<String> = cache.get("key").await.unwrap();
	/// assert_eq!(value, None);
	/// # }
	/// ```
	pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = Some(ttl);
		self
	}

	/// Drop every expired entry
	pub async fn cleanup_expired(&self) {
		purge_expired(&self.store).await;
	}

	/// Start automatic cleanup of expired entries
	///
	/// Spawns a background task that removes expired entries at the given
	/// interval. The task stops once every clone of the cache is dropped.
	/// Outside a tokio runtime, or with a zero interval, nothing is spawned
	/// and expired entries are only dropped when read or by
	/// [`InMemoryCache::cleanup_expired`].
	pub fn start_auto_cleanup(&self, interval: Duration) {
		if interval.is_zero() {
			tracing::warn!("zero cleanup interval, automatic cache cleanup not started");
			return;
		}
		let Ok(handle) = tokio::runtime::Handle::try_current() else {
			tracing::warn!("no tokio runtime, automatic cache cleanup not started");
			return;
		};
		let store: Weak<Store> = Arc::downgrade(&self.store);
		handle.spawn(async move {
			let mut timer = tokio::time::interval(interval);
			// the first tick completes immediately
			timer.tick().await;
			loop {
				timer.tick().await;
				let Some(store) = store.upgrade() else {
					break;
				};
				purge_expired(&store).await;
			}
		});
	}

	/// Set the cleanup interval and start automatic cleanup
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_cache::{Cache, InMemoryCache};
	/// use std::time::Duration;
	///
	/// # #[tokio::main]
	/// # async fn main() {
	/// let cache = InMemoryCache::new().with_auto_cleanup(Duration::from_millis(10));
	/// cache.set("key", &"value", Some(Duration::ZERO)).await.unwrap();
	///
	/// tokio::time::sleep(Duration::from_millis(50)).await;
	///
	/// assert_eq!(cache.get_statistics().await.entry_count, 0);
	/// # }
	/// ```
	pub fn with_auto_cleanup(mut self, interval: Duration) -> Self {
		self.cleanup_interval = Some(interval);
		self.start_auto_cleanup(interval);
		self
	}

	pub fn cleanup_interval(&self) -> Option<Duration> {
		self.cleanup_interval
	}

	/// Get cache statistics
	pub async fn get_statistics(&self) -> CacheStatistics {
		let store = self.store.read().await;
		let hits = self.hits.load(Ordering::Relaxed);
		let misses = self.misses.load(Ordering::Relaxed);

		CacheStatistics {
			hits,
			misses,
			total_requests: hits + misses,
			entry_count: store.len() as u64,
			memory_usage: store.values().map(|entry| entry.value.len() as u64).sum(),
		}
	}

	/// Inspect a cache entry, or `None` if the key is not stored
	pub async fn inspect_entry(&self, key: &str) -> Option<CacheEntryInfo> {
		let store = self.store.read().await;
		store.get(key).map(|entry| {
			let ttl_seconds = entry.expires_at.and_then(|expires_at| {
				expires_at
					.duration_since(SystemTime::now())
					.ok()
					.map(|d| d.as_secs())
			});

			CacheEntryInfo {
				key: key.to_string(),
				size: entry.value.len(),
				has_expiry: entry.expires_at.is_some(),
				ttl_seconds,
			}
		})
	}
}

impl Default for InMemoryCache {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Cache for InMemoryCache {
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: for<'de> Deserialize<'de> + Send,
	{
		let expired = {
			let store = self.store.read().await;
			match store.get(key) {
				Some(entry) if !entry.is_expired() => {
					self.hits.fetch_add(1, Ordering::Relaxed);
					let value = serde_json::from_slice(&entry.value)?;
					return Ok(Some(value));
				}
				Some(_) => true,
				None => false,
			}
		};

		self.misses.fetch_add(1, Ordering::Relaxed);
		if expired {
			evict_if_expired(&self.store, key).await;
		}
		Ok(None)
	}

	async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
	where
		T: Serialize + Send + Sync,
	{
		let serialized = serde_json::to_vec(value)?;
		let entry = CacheEntry::new(serialized, ttl.or(self.default_ttl));

		let mut store = self.store.write().await;
		store.insert(key.to_string(), entry);
		Ok(())
	}

	async fn delete(&self, key: &str) -> CacheResult<()> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn has_key(&self, key: &str) -> CacheResult<bool> {
		let live = {
			let store = self.store.read().await;
			store.get(key).map(|entry| !entry.is_expired())
		};
		if live == Some(false) {
			evict_if_expired(&self.store, key).await;
		}
		Ok(live == Some(true))
	}

	async fn clear(&self) -> CacheResult<()> {
		let mut store = self.store.write().await;
		store.clear();
		Ok(())
	}

	async fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
		let mut store = self.store.write().await;
		for key in keys {
			store.remove(key);
		}
		Ok(())
	}
}

async fn purge_expired(store: &Store) {
	let mut store = store.write().await;
	let before = store.len();
	store.retain(|_, entry| !entry.is_expired());
	let removed = before - store.len();
	if removed > 0 {
		tracing::debug!(removed, "cleaned up expired cache entries");
	}
}

async fn evict_if_expired(store: &Store, key: &str) {
	let mut store = store.write().await;
	// a concurrent set may have refreshed the entry in between
	if store.get(key).is_some_and(CacheEntry::is_expired) {
		store.remove(key);
	}
}
