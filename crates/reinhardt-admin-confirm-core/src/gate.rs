//! The confirmation gate
//!
//! Decides whether a submission may be saved straight away or has to stop
//! at the confirmation page.

use crate::changes::ChangedData;
use crate::model::{Fieldset, flatten_fieldsets};
use crate::options::ConfirmOptions;

/// Outcome of the gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
	/// Nothing confirmation-worthy changed; save normally
	Proceed,
	/// Stop at the confirmation page for these confirmation fields
	Confirm(Vec<String>),
}

impl GateDecision {
	pub fn needs_confirmation(&self) -> bool {
		matches!(self, GateDecision::Confirm(_))
	}
}

/// Fields whose change needs confirmation
///
/// The configured list wins; otherwise every field shown in the form.
///
/// # Examples
///
/// ```
/// use reinhardt_admin_confirm_core::gate::confirmation_fields;
/// use reinhardt_admin_confirm_core::model::Fieldset;
/// use reinhardt_admin_confirm_core::ConfirmOptions;
///
/// let fieldsets = vec![Fieldset::new(None, vec!["name", "price"])];
///
/// let defaulted = confirmation_fields(&ConfirmOptions::new(), &fieldsets);
/// assert_eq!(defaulted, vec!["name", "price"]);
///
/// let configured = ConfirmOptions::builder().confirmation_fields(vec!["price"]).build();
/// assert_eq!(confirmation_fields(&configured, &fieldsets), vec!["price"]);
/// ```
pub fn confirmation_fields(options: &ConfirmOptions, fieldsets: &[Fieldset]) -> Vec<String> {
	match &options.confirmation_fields {
		Some(fields) => fields.clone(),
		None => flatten_fieldsets(fieldsets),
	}
}

/// Intersect the changed fields with the confirmation fields
pub fn evaluate(changed: &ChangedData, confirmation_fields: &[String]) -> GateDecision {
	let hits: Vec<String> = changed
		.fields()
		.into_iter()
		.filter(|field| confirmation_fields.iter().any(|f| f == field))
		.map(str::to_string)
		.collect();

	if hits.is_empty() {
		GateDecision::Proceed
	} else {
		GateDecision::Confirm(hits)
	}
}
