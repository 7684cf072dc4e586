//! Per-admin confirmation options

/// Which submissions of one admin need confirmation
///
/// # Examples
///
/// ```
/// use reinhardt_admin_confirm_core::ConfirmOptions;
///
/// let options = ConfirmOptions::builder()
///     .confirm_change(true)
///     .confirmation_fields(vec!["quantity"])
///     .build();
///
/// assert!(options.confirm_change);
/// assert!(!options.confirm_add);
/// assert_eq!(options.confirmation_fields, Some(vec!["quantity".to_string()]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmOptions {
	/// Ask for confirmation on the add form
	pub confirm_add: bool,
	/// Ask for confirmation on the change form
	pub confirm_change: bool,
	/// Fields whose change triggers confirmation (`None`: every shown field)
	pub confirmation_fields: Option<Vec<String>>,
	/// Template replacing the change confirmation page
	pub change_confirmation_template: Option<String>,
	/// Template replacing the action confirmation page
	pub action_confirmation_template: Option<String>,
}

impl ConfirmOptions {
	/// Confirmation on both add and change, for every shown field
	pub fn new() -> Self {
		Self {
			confirm_add: true,
			confirm_change: true,
			..Default::default()
		}
	}

	pub fn builder() -> ConfirmOptionsBuilder {
		ConfirmOptionsBuilder::default()
	}
}

/// Builder for [`ConfirmOptions`]
#[derive(Debug, Default)]
pub struct ConfirmOptionsBuilder {
	options: ConfirmOptions,
}

impl ConfirmOptionsBuilder {
	pub fn confirm_add(mut self, enabled: bool) -> Self {
		self.options.confirm_add = enabled;
		self
	}

	pub fn confirm_change(mut self, enabled: bool) -> Self {
		self.options.confirm_change = enabled;
		self
	}

	pub fn confirmation_fields(mut self, fields: Vec<impl Into<String>>) -> Self {
		self.options.confirmation_fields = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn change_confirmation_template(mut self, template: impl Into<String>) -> Self {
		self.options.change_confirmation_template = Some(template.into());
		self
	}

	pub fn action_confirmation_template(mut self, template: impl Into<String>) -> Self {
		self.options.action_confirmation_template = Some(template.into());
		self
	}

	pub fn build(self) -> ConfirmOptions {
		self.options
	}
}
