//! Internal cache entry structure

use std::time::{Duration, SystemTime};

/// Serialized value with an optional expiry instant
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
	pub(crate) value: Vec<u8>,
	pub(crate) expires_at: Option<SystemTime>,
}

impl CacheEntry {
	pub(crate) fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
		let expires_at = ttl.map(|d| SystemTime::now() + d);
		Self { value, expires_at }
	}

	pub(crate) fn is_expired(&self) -> bool {
		match self.expires_at {
			Some(expires_at) => SystemTime::now() > expires_at,
			None => false,
		}
	}
}
