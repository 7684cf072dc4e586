//! Cache error types

use thiserror::Error;

/// Errors raised by cache backends
#[derive(Debug, Error)]
pub enum CacheError {
	/// A value could not be encoded or decoded
	#[error("Cache serialization error: {0}")]
	Serialization(String),

	/// The backend itself failed
	#[error("Cache backend error: {0}")]
	Backend(String),
}

impl From<serde_json::Error> for CacheError {
	fn from(err: serde_json::Error) -> Self {
		CacheError::Serialization(err.to_string())
	}
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
