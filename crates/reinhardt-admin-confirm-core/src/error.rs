//! Error types for admin confirmation

use http::StatusCode;
use reinhardt_admin_confirm_cache::CacheError;
use thiserror::Error;

/// Admin confirmation error type
#[derive(Debug, Error)]
pub enum ConfirmError {
	/// The user may not add or change this object, or run this action
	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	/// A popup asked for a field that may not be referenced
	#[error("The field {0} cannot be referenced.")]
	DisallowedToField(String),

	/// An action name that is not registered
	#[error("Invalid action: {0}")]
	InvalidAction(String),

	/// The round-trip cache failed
	#[error("Cache error: {0}")]
	Cache(#[from] CacheError),

	/// Template rendering error
	#[error("Template rendering error: {0}")]
	Template(String),

	/// Settings could not be loaded
	#[error("Configuration error: {0}")]
	Config(String),

	/// The host admin failed (lookup, validation or save)
	#[error("Admin backend error: {0}")]
	Backend(String),
}

impl ConfirmError {
	/// HTTP status a view should answer with for this error
	///
	/// # Examples
	///
	/// ```
	/// use http::StatusCode;
	/// use reinhardt_admin_confirm_core::ConfirmError;
	///
	/// let err = ConfirmError::DisallowedToField("shop".to_string());
	/// assert_eq!(err.to_string(), "The field shop cannot be referenced.");
	/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
	/// ```
	pub fn status_code(&self) -> StatusCode {
		match self {
			ConfirmError::PermissionDenied(_) => StatusCode::FORBIDDEN,
			ConfirmError::DisallowedToField(_) | ConfirmError::InvalidAction(_) => {
				StatusCode::BAD_REQUEST
			}
			ConfirmError::Cache(_)
			| ConfirmError::Template(_)
			| ConfirmError::Config(_)
			| ConfirmError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<tera::Error> for ConfirmError {
	fn from(err: tera::Error) -> Self {
		// tera nests the useful message in its source chain
		let mut message = err.to_string();
		let mut source = std::error::Error::source(&err);
		while let Some(inner) = source {
			message = format!("{}: {}", message, inner);
			source = inner.source();
		}
		ConfirmError::Template(message)
	}
}

/// Result type for admin confirmation operations
pub type ConfirmResult<T> = Result<T, ConfirmError>;
