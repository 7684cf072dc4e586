//! Cache statistics and entry information

/// Cache entry information for inspection
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
	/// The key of the entry
	pub key: String,
	/// Size of the serialized value in bytes
	pub size: usize,
	/// Whether the entry has an expiration time
	pub has_expiry: bool,
	/// Seconds until expiration (if applicable)
	pub ttl_seconds: Option<u64>,
}

/// Hit/miss counters and occupancy of a cache
#[derive(Debug, Clone, Default)]
pub struct CacheStatistics {
	pub hits: u64,
	pub misses: u64,
	pub total_requests: u64,
	pub entry_count: u64,
	/// Approximate memory usage in bytes
	pub memory_usage: u64,
}

impl CacheStatistics {
	/// Calculate hit rate (0.0 to 1.0)
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_cache::CacheStatistics;
	///
	/// let stats = CacheStatistics {
	///     hits: 3,
	///     misses: 1,
	///     total_requests: 4,
	///     ..Default::default()
	/// };
	/// assert_eq!(stats.hit_rate(), 0.75);
	/// ```
	pub fn hit_rate(&self) -> f64 {
		if self.total_requests == 0 {
			0.0
		} else {
			self.hits as f64 / self.total_requests as f64
		}
	}
}
