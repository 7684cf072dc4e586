//! Outcome of validating a submitted admin form

use indexmap::IndexMap;
use serde_json::Value;

use crate::request::UploadedFile;

/// Field errors keyed by field name (`_all` for form-wide errors)
pub type FormErrors = IndexMap<String, Vec<String>>;

/// Cleaned data of a valid form
#[derive(Debug, Clone, Default)]
pub struct CleanedForm {
	/// Cleaned values of the non-file fields
	pub values: IndexMap<String, Value>,
	/// Files uploaded with this submission
	pub uploads: IndexMap<String, UploadedFile>,
	/// File fields whose clear checkbox was ticked
	pub cleared: Vec<String>,
}

impl CleanedForm {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set a cleaned value
	pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.values.insert(name.into(), value.into());
		self
	}

	/// Attach an upload
	pub fn with_upload(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
		self.uploads.insert(name.into(), file);
		self
	}

	/// Mark a file field as cleared
	pub fn with_cleared(mut self, name: impl Into<String>) -> Self {
		self.cleared.push(name.into());
		self
	}

	pub fn is_cleared(&self, name: &str) -> bool {
		self.cleared.iter().any(|cleared| cleared == name)
	}
}

/// Result of validating a bound form
#[derive(Debug, Clone)]
pub enum FormOutcome {
	Valid(CleanedForm),
	Invalid(FormErrors),
}

impl FormOutcome {
	pub fn is_valid(&self) -> bool {
		matches!(self, FormOutcome::Valid(_))
	}
}
