//! Changelist actions and their confirmation
//!
//! Actions run on the records selected in the changelist. Wrapping an action
//! in [`ConfirmAction`] makes the first submission render a confirmation
//! page instead; the action only runs once the page is posted back with the
//! `_confirm_action` marker.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::admin::{AdminResponse, ModelAdmin, PermissionAction};
use crate::constants::{ACTION_CHECKBOX_NAME, ACTION_NAME, CONFIRM_ACTION};
use crate::error::{ConfirmError, ConfirmResult};
use crate::model::Record;
use crate::options::ConfirmOptions;
use crate::render::{
	ActionConfirmationContext, ConfirmationRenderer, PageContext, QuerysetEntry,
};
use crate::request::AdminRequest;
use crate::utils::snake_to_title_case;

/// Message shown when no usable action was posted
pub const NO_ACTION_SELECTED: &str = "No action selected.";
/// Message shown when an action was posted without records
pub const NO_ITEMS_SELECTED: &str =
	"Items must be selected in order to perform actions on them. No items have been changed.";

/// Outcome of running an action
///
/// Only [`message`](Self::message) reaches the user, as the flash message of
/// the redirect back to the changelist; the counts are logged.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
	/// Every selected record was handled
	Success {
		message: String,
		affected_count: usize,
	},
	/// Records were handled, with caveats the action wants to report
	Warning {
		message: String,
		affected_count: usize,
		warnings: Vec<String>,
	},
	/// Nothing was changed
	Error {
		message: String,
		errors: Vec<String>,
	},
	/// Some records were handled and others failed
	PartialSuccess {
		message: String,
		succeeded_count: usize,
		failed_count: usize,
		errors: Vec<String>,
	},
}

impl ActionResult {
	pub fn success(message: impl Into<String>, affected_count: usize) -> Self {
		ActionResult::Success {
			message: message.into(),
			affected_count,
		}
	}

	pub fn is_success(&self) -> bool {
		!matches!(self, ActionResult::Error { .. })
	}

	pub fn affected_count(&self) -> usize {
		match self {
			ActionResult::Success { affected_count, .. }
			| ActionResult::Warning { affected_count, .. } => *affected_count,
			ActionResult::PartialSuccess {
				succeeded_count, ..
			} => *succeeded_count,
			ActionResult::Error { .. } => 0,
		}
	}

	pub fn message(&self) -> &str {
		match self {
			ActionResult::Success { message, .. }
			| ActionResult::Warning { message, .. }
			| ActionResult::Error { message, .. }
			| ActionResult::PartialSuccess { message, .. } => message,
		}
	}
}

/// An action on selected changelist records
#[async_trait]
pub trait AdminAction: Send + Sync {
	fn name(&self) -> &str;

	/// Label shown in the action selector
	fn description(&self) -> String {
		snake_to_title_case(self.name())
	}

	/// Permissions the user needs on the model to run the action
	fn allowed_permissions(&self) -> Vec<PermissionAction> {
		Vec::new()
	}

	fn requires_confirmation(&self) -> bool {
		false
	}

	async fn execute(&self, request: &AdminRequest, records: &[Record]) -> ActionResult;
}

/// An action that asks for confirmation before running
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use reinhardt_admin_confirm_core::actions::{ActionResult, AdminAction, ConfirmAction};
/// use reinhardt_admin_confirm_core::model::Record;
/// use reinhardt_admin_confirm_core::request::AdminRequest;
///
/// struct ShowMessage;
///
/// #[async_trait]
/// impl AdminAction for ShowMessage {
///     fn name(&self) -> &str {
///         "show_message"
///     }
///
///     async fn execute(&self, _request: &AdminRequest, records: &[Record]) -> ActionResult {
///         ActionResult::success("You selected with confirmation", records.len())
///     }
/// }
///
/// let action = ConfirmAction::new(ShowMessage);
/// assert!(action.requires_confirmation());
/// assert_eq!(action.description(), "Show Message");
/// ```
pub struct ConfirmAction<A> {
	inner: A,
}

impl<A: AdminAction> ConfirmAction<A> {
	pub fn new(inner: A) -> Self {
		Self { inner }
	}

	pub fn inner(&self) -> &A {
		&self.inner
	}
}

#[async_trait]
impl<A: AdminAction> AdminAction for ConfirmAction<A> {
	fn name(&self) -> &str {
		self.inner.name()
	}

	fn description(&self) -> String {
		self.inner.description()
	}

	fn allowed_permissions(&self) -> Vec<PermissionAction> {
		self.inner.allowed_permissions()
	}

	fn requires_confirmation(&self) -> bool {
		true
	}

	async fn execute(&self, request: &AdminRequest, records: &[Record]) -> ActionResult {
		self.inner.execute(request, records).await
	}
}

/// Actions available on one changelist
pub struct ActionRegistry {
	actions: DashMap<String, Arc<dyn AdminAction>>,
}

impl ActionRegistry {
	pub fn new() -> Self {
		Self {
			actions: DashMap::new(),
		}
	}

	pub fn register(&self, action: impl AdminAction + 'static) {
		self.actions
			.insert(action.name().to_string(), Arc::new(action));
	}

	pub fn get_action(&self, name: &str) -> ConfirmResult<Arc<dyn AdminAction>> {
		self.actions
			.get(name)
			.map(|entry| Arc::clone(entry.value()))
			.ok_or_else(|| ConfirmError::InvalidAction(format!("Action '{}' not found", name)))
	}

	/// Registered action names, sorted
	pub fn available_actions(&self) -> Vec<String> {
		let mut names: Vec<String> = self
			.actions
			.iter()
			.map(|entry| entry.key().clone())
			.collect();
		names.sort();
		names
	}

	/// Handle an action submitted from the changelist of `admin`
	///
	/// Unknown actions and actions the user lacks a permission for redirect
	/// back to the changelist with [`NO_ACTION_SELECTED`]. A confirmed
	/// action only runs when the post carries `_confirm_action`; otherwise
	/// the confirmation page is rendered.
	pub async fn dispatch<A>(
		&self,
		admin: &A,
		renderer: &ConfirmationRenderer,
		options: &ConfirmOptions,
		request: &AdminRequest,
	) -> ConfirmResult<AdminResponse>
	where
		A: ModelAdmin + ?Sized,
	{
		let changelist_url = admin.changelist_url();
		let Some(action) = request
			.post
			.get(ACTION_NAME)
			.and_then(|name| self.get_action(name).ok())
		else {
			return Ok(AdminResponse::redirect_with_message(changelist_url, NO_ACTION_SELECTED));
		};

		for permission in action.allowed_permissions() {
			if !admin.has_permission(permission, request).await {
				tracing::warn!(
					action = action.name(),
					permission = permission.as_str(),
					model = %admin.meta().label(),
					"action permission denied"
				);
				return Ok(AdminResponse::redirect_with_message(changelist_url, NO_ACTION_SELECTED));
			}
		}

		let selected: Vec<String> = request
			.post
			.get_list(ACTION_CHECKBOX_NAME)
			.into_iter()
			.map(str::to_string)
			.collect();
		if selected.is_empty() {
			return Ok(AdminResponse::redirect_with_message(changelist_url, NO_ITEMS_SELECTED));
		}
		let records = admin.get_queryset(request, &selected).await?;

		if action.requires_confirmation() && !request.post.contains(CONFIRM_ACTION) {
			tracing::debug!(action = action.name(), count = records.len(), "rendering action confirmation");
			let meta = admin.meta();
			let context = ActionConfirmationContext {
				page: PageContext::new(
					meta,
					format!("Confirm Action: {}", snake_to_title_case(action.name())),
					admin.admin_url(),
					changelist_url,
				)
				.with_csrf_token(request.csrf_token()),
				action: action.name().to_string(),
				action_display_name: action.description(),
				action_checkbox_name: ACTION_CHECKBOX_NAME.to_string(),
				queryset: records
					.iter()
					.map(|record| QuerysetEntry {
						pk: record.pk_string().unwrap_or_default(),
						repr: admin.object_repr(record),
					})
					.collect(),
			};
			let response = renderer.render_action_confirmation(
				meta,
				options.action_confirmation_template.as_deref(),
				&context,
			)?;
			return Ok(AdminResponse::Template(response));
		}

		let result = action.execute(request, &records).await;
		tracing::info!(
			action = action.name(),
			affected = result.affected_count(),
			success = result.is_success(),
			"action executed"
		);
		Ok(AdminResponse::redirect_with_message(changelist_url, result.message()))
	}
}

impl Default for ActionRegistry {
	fn default() -> Self {
		Self::new()
	}
}
