//! Upload cache
//!
//! A browser cannot re-send a file through a hidden input, so uploads of the
//! first submission are parked in the cache until the user confirms.

use parking_lot::Mutex;
use reinhardt_admin_confirm_cache::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ConfirmResult;
use crate::request::UploadedFile;

/// Serialized form of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFile {
	pub name: String,
	pub size: usize,
	pub content_type: String,
	pub charset: Option<String>,
	#[serde(with = "serde_bytes")]
	pub content: Vec<u8>,
}

impl From<&UploadedFile> for CachedFile {
	fn from(upload: &UploadedFile) -> Self {
		Self {
			name: upload.name.clone(),
			size: upload.size,
			content_type: upload.content_type.clone(),
			charset: upload.charset.clone(),
			content: upload.content.to_vec(),
		}
	}
}

impl From<CachedFile> for UploadedFile {
	fn from(cached: CachedFile) -> Self {
		Self {
			name: cached.name,
			size: cached.size,
			content_type: cached.content_type,
			charset: cached.charset,
			content: cached.content.into(),
		}
	}
}

struct TrackedKey {
	key: String,
	expires_at: Instant,
}

/// Caches uploads and remembers which keys it wrote
///
/// Tracked keys are forgotten once their entry has expired, so abandoned
/// confirmations do not accumulate.
pub struct FileCache<C: Cache> {
	cache: Arc<C>,
	timeout: Duration,
	cached_keys: Mutex<Vec<TrackedKey>>,
}

impl<C: Cache> FileCache<C> {
	pub fn new(cache: Arc<C>, timeout: Duration) -> Self {
		Self {
			cache,
			timeout,
			cached_keys: Mutex::new(Vec::new()),
		}
	}

	/// Store an upload under a key
	pub async fn set(&self, key: &str, upload: &UploadedFile) -> ConfirmResult<()> {
		let state = CachedFile::from(upload);
		self.cache.set(key, &state, Some(self.timeout)).await?;
		tracing::debug!(key, name = %upload.name, size = upload.size, "cached upload");

		let mut keys = self.cached_keys.lock();
		prune_expired(&mut keys);
		keys.retain(|tracked| tracked.key != key);
		keys.push(TrackedKey {
			key: key.to_string(),
			expires_at: Instant::now() + self.timeout,
		});
		Ok(())
	}

	/// Rebuild the upload stored under a key
	pub async fn get(&self, key: &str) -> ConfirmResult<Option<UploadedFile>> {
		let state: Option<CachedFile> = self.cache.get(key).await?;
		match &state {
			Some(_) => tracing::debug!(key, "restored cached upload"),
			None => self.cached_keys.lock().retain(|tracked| tracked.key != key),
		}
		Ok(state.map(UploadedFile::from))
	}

	/// Drop one upload; unknown keys are ignored
	pub async fn delete(&self, key: &str) -> ConfirmResult<()> {
		self.cache.delete(key).await?;
		self.cached_keys.lock().retain(|tracked| tracked.key != key);
		Ok(())
	}

	/// Drop every upload this cache wrote
	pub async fn delete_all(&self) -> ConfirmResult<()> {
		let keys: Vec<String> = std::mem::take(&mut *self.cached_keys.lock())
			.into_iter()
			.map(|tracked| tracked.key)
			.collect();
		self.cache.delete_many(&keys).await?;
		Ok(())
	}

	/// Keys currently holding uploads written by this cache
	pub fn cached_keys(&self) -> Vec<String> {
		let mut keys = self.cached_keys.lock();
		prune_expired(&mut keys);
		keys.iter().map(|tracked| tracked.key.clone()).collect()
	}
}

fn prune_expired(keys: &mut Vec<TrackedKey>) {
	let now = Instant::now();
	keys.retain(|tracked| tracked.expires_at > now);
}
