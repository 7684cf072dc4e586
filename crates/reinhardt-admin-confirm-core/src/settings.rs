//! Settings for admin confirmation
//!
//! Settings come from a TOML table and may be overridden by environment
//! variables carrying the `ADMIN_CONFIRM_` prefix:
//!
//! ```toml
//! cache_timeout_secs = 30
//! cache_key_prefix = "tenant-a"
//! template_dir = "templates"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::DEFAULT_CACHE_TIMEOUT;
use crate::error::{ConfirmError, ConfirmResult};

/// Prefix of the environment variables read by [`ConfirmSettings::with_env`]
pub const ENV_PREFIX: &str = "ADMIN_CONFIRM_";

/// Site-wide confirmation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfirmSettings {
	/// Seconds the round-trip state survives between the two submissions
	pub cache_timeout_secs: u64,
	/// Prefix put in front of every round-trip cache key
	pub cache_key_prefix: Option<String>,
	/// Directory of `.html` templates overriding the built-in ones
	pub template_dir: Option<PathBuf>,
}

impl Default for ConfirmSettings {
	fn default() -> Self {
		Self {
			cache_timeout_secs: DEFAULT_CACHE_TIMEOUT.as_secs(),
			cache_key_prefix: None,
			template_dir: None,
		}
	}
}

impl ConfirmSettings {
	/// Parse settings from TOML
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_core::ConfirmSettings;
	/// use std::time::Duration;
	///
	/// let settings = ConfirmSettings::from_toml_str("cache_timeout_secs = 30").unwrap();
	/// assert_eq!(settings.cache_timeout(), Duration::from_secs(30));
	/// assert_eq!(settings.cache_key_prefix, None);
	/// ```
	pub fn from_toml_str(source: &str) -> ConfirmResult<Self> {
		toml::from_str(source).map_err(|e| ConfirmError::Config(e.to_string()))
	}

	/// Read settings from a TOML file
	pub fn from_file(path: impl AsRef<Path>) -> ConfirmResult<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path)
			.map_err(|e| ConfirmError::Config(format!("{}: {}", path.display(), e)))?;
		Self::from_toml_str(&source)
	}

	/// Apply overrides from the process environment
	pub fn with_env(self) -> ConfirmResult<Self> {
		self.with_env_from(|key| std::env::var(key).ok())
	}

	/// Apply overrides from an arbitrary variable lookup
	pub fn with_env_from(
		mut self,
		lookup: impl Fn(&str) -> Option<String>,
	) -> ConfirmResult<Self> {
		let var = |name: &str| lookup(format!("{}{}", ENV_PREFIX, name).as_str());

		if let Some(raw) = var("CACHE_TIMEOUT") {
			self.cache_timeout_secs = raw.trim().parse().map_err(|_| {
				ConfirmError::Config(format!(
					"{}CACHE_TIMEOUT must be a number of seconds, got {:?}",
					ENV_PREFIX, raw
				))
			})?;
		}
		if let Some(prefix) = var("CACHE_KEY_PREFIX") {
			self.cache_key_prefix = Some(prefix).filter(|p| !p.is_empty());
		}
		if let Some(dir) = var("TEMPLATE_DIR") {
			self.template_dir = Some(PathBuf::from(dir));
		}
		Ok(self)
	}

	pub fn cache_timeout(&self) -> Duration {
		Duration::from_secs(self.cache_timeout_secs)
	}
}
