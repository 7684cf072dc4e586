//! The host admin contract
//!
//! Confirmation wraps a model admin of the surrounding framework. The
//! framework keeps ownership of lookups, validation, saving and its own
//! change-form view; this trait is the surface confirmation needs from it.

use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;

use crate::error::{ConfirmError, ConfirmResult};
use crate::form::{CleanedForm, FormOutcome};
use crate::model::{Fieldset, ModelMeta, Record};
use crate::render::{ExtraContext, TemplateResponse};
use crate::request::AdminRequest;

/// Permission kinds checked by admin views and actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
	View,
	Add,
	Change,
	Delete,
}

impl PermissionAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			PermissionAction::View => "view",
			PermissionAction::Add => "add",
			PermissionAction::Change => "change",
			PermissionAction::Delete => "delete",
		}
	}

	/// Permission codename for a model, e.g. `market.change_item`
	pub fn codename(&self, meta: &ModelMeta) -> String {
		format!("{}.{}_{}", meta.app_label, self.as_str(), meta.model_name)
	}
}

/// What an admin view answers with
#[derive(Debug, Clone)]
pub enum AdminResponse {
	/// A rendered page
	Template(TemplateResponse),
	/// A redirect, with the messages to flash on the next page
	Redirect {
		location: String,
		messages: Vec<String>,
	},
	Forbidden,
	BadRequest(String),
}

impl AdminResponse {
	pub fn redirect(location: impl Into<String>) -> Self {
		AdminResponse::Redirect {
			location: location.into(),
			messages: Vec::new(),
		}
	}

	pub fn redirect_with_message(location: impl Into<String>, message: impl Into<String>) -> Self {
		AdminResponse::Redirect {
			location: location.into(),
			messages: vec![message.into()],
		}
	}

	/// Turn a client error into its response, passing server errors through
	pub fn from_error(err: ConfirmError) -> ConfirmResult<Self> {
		match err.status_code() {
			StatusCode::FORBIDDEN => Ok(AdminResponse::Forbidden),
			StatusCode::BAD_REQUEST => Ok(AdminResponse::BadRequest(err.to_string())),
			_ => Err(err),
		}
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			AdminResponse::Template(_) => StatusCode::OK,
			AdminResponse::Redirect { .. } => StatusCode::FOUND,
			AdminResponse::Forbidden => StatusCode::FORBIDDEN,
			AdminResponse::BadRequest(_) => StatusCode::BAD_REQUEST,
		}
	}

	pub fn template(&self) -> Option<&TemplateResponse> {
		match self {
			AdminResponse::Template(template) => Some(template),
			_ => None,
		}
	}

	pub fn location(&self) -> Option<&str> {
		match self {
			AdminResponse::Redirect { location, .. } => Some(location),
			_ => None,
		}
	}

	pub fn messages(&self) -> &[String] {
		match self {
			AdminResponse::Redirect { messages, .. } => messages,
			_ => &[],
		}
	}
}

/// A model admin of the host framework
#[async_trait]
pub trait ModelAdmin: Send + Sync {
	/// Reflection data of the administered model
	fn meta(&self) -> &ModelMeta;

	/// Fieldsets of the form; every editable field by default
	fn fieldsets(&self, _request: &AdminRequest, _obj: Option<&Record>) -> Vec<Fieldset> {
		let fields: Vec<String> = self
			.meta()
			.editable_fields()
			.map(|field| field.name.clone())
			.collect();
		vec![Fieldset::new(None, fields)]
	}

	fn readonly_fields(&self, _request: &AdminRequest, _obj: Option<&Record>) -> Vec<String> {
		Vec::new()
	}

	/// Whether a popup may reference records through this field
	fn to_field_allowed(&self, to_field: &str) -> bool {
		self.meta()
			.pk_field()
			.is_some_and(|pk| pk.name == to_field)
	}

	fn admin_url(&self) -> String {
		"/admin/".to_string()
	}

	fn changelist_url(&self) -> String {
		let meta = self.meta();
		format!("{}{}/{}/", self.admin_url(), meta.app_label, meta.model_name)
	}

	/// Display string of a record
	fn object_repr(&self, record: &Record) -> String {
		match record.pk_string() {
			Some(pk) => format!("{} object ({})", self.meta().verbose_name, pk),
			None => format!("{} object", self.meta().verbose_name),
		}
	}

	/// Look a record up by the id (or `to_field` value) in the URL
	async fn get_object(
		&self,
		request: &AdminRequest,
		object_id: &str,
		to_field: Option<&str>,
	) -> ConfirmResult<Option<Record>>;

	/// Records selected in the changelist, in selection order
	async fn get_queryset(&self, request: &AdminRequest, ids: &[String]) -> ConfirmResult<Vec<Record>>;

	async fn has_view_permission(&self, request: &AdminRequest, _obj: Option<&Record>) -> bool {
		request.user_has_perm(&PermissionAction::View.codename(self.meta()))
	}

	async fn has_add_permission(&self, request: &AdminRequest) -> bool {
		request.user_has_perm(&PermissionAction::Add.codename(self.meta()))
	}

	async fn has_change_permission(&self, request: &AdminRequest, _obj: Option<&Record>) -> bool {
		request.user_has_perm(&PermissionAction::Change.codename(self.meta()))
	}

	async fn has_delete_permission(&self, request: &AdminRequest, _obj: Option<&Record>) -> bool {
		request.user_has_perm(&PermissionAction::Delete.codename(self.meta()))
	}

	/// Dispatch to the permission check of `action`
	async fn has_permission(&self, action: PermissionAction, request: &AdminRequest) -> bool {
		match action {
			PermissionAction::View => self.has_view_permission(request, None).await,
			PermissionAction::Add => self.has_add_permission(request).await,
			PermissionAction::Change => self.has_change_permission(request, None).await,
			PermissionAction::Delete => self.has_delete_permission(request, None).await,
		}
	}

	/// Bind the submission to the form restricted to `fields` and validate it
	async fn validate_form(
		&self,
		request: &AdminRequest,
		obj: Option<&Record>,
		fields: &[String],
	) -> ConfirmResult<FormOutcome>;

	/// The unsaved record the form would produce
	fn save_form(&self, form: &CleanedForm, obj: Option<&Record>) -> Record {
		let mut record = match obj {
			Some(obj) => obj.clone(),
			None => Record::from_defaults(self.meta()),
		};
		for (name, value) in &form.values {
			record.values.insert(name.clone(), value.clone());
		}
		for (name, upload) in &form.uploads {
			record
				.values
				.insert(name.clone(), serde_json::Value::String(upload.name.clone()));
		}
		for name in &form.cleared {
			if !form.uploads.contains_key(name) {
				record.values.insert(name.clone(), serde_json::Value::Null);
			}
		}
		record
	}

	/// The framework's own add/change view
	async fn changeform_view(
		&self,
		request: AdminRequest,
		object_id: Option<&str>,
		form_url: &str,
		extra_context: ExtraContext,
	) -> ConfirmResult<AdminResponse>;
}
