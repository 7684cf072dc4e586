//! The cache backend contract

use crate::error::CacheResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Key/value cache with optional per-entry expiry
///
/// Values are stored serialized, so anything that implements
/// `Serialize`/`Deserialize` can be cached.
#[async_trait]
pub trait Cache: Send + Sync {
	/// Get a value, returning `None` when missing or expired
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: for<'de> Deserialize<'de> + Send;

	/// Set a value; `None` falls back to the backend's default TTL
	async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
	where
		T: Serialize + Send + Sync;

	/// Remove a key
	async fn delete(&self, key: &str) -> CacheResult<()>;

	/// Whether a live (non-expired) entry exists for the key
	async fn has_key(&self, key: &str) -> CacheResult<bool>;

	/// Remove every entry
	async fn clear(&self) -> CacheResult<()>;

	/// Remove several keys at once
	async fn delete_many(&self, keys: &[String]) -> CacheResult<()> {
		for key in keys {
			self.delete(key).await?;
		}
		Ok(())
	}
}
