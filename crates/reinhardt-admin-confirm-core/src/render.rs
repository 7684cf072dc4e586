//! Confirmation pages
//!
//! Pages are Tera templates. The built-in ones are compiled into the crate;
//! a template directory can be layered on top to override any of them or to
//! add per-app and per-model variants.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::changes::ChangedData;
use crate::error::{ConfirmError, ConfirmResult};
use crate::model::{ModelMeta, value_to_key};
use crate::request::PostData;
use crate::settings::ConfirmSettings;

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
	(
		"admin/confirm_base.html",
		include_str!("../templates/admin/confirm_base.html"),
	),
	(
		"admin/change_confirmation.html",
		include_str!("../templates/admin/change_confirmation.html"),
	),
	(
		"admin/action_confirmation.html",
		include_str!("../templates/admin/action_confirmation.html"),
	),
];

/// Extra values merged into a page context
pub type ExtraContext = serde_json::Map<String, Value>;

/// The two kinds of confirmation page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPage {
	Change,
	Action,
}

impl ConfirmationPage {
	pub fn file_name(&self) -> &'static str {
		match self {
			ConfirmationPage::Change => "change_confirmation.html",
			ConfirmationPage::Action => "action_confirmation.html",
		}
	}
}

/// Templates tried for a page, most specific first
///
/// A custom template replaces the whole list.
///
/// # Examples
///
/// ```
/// use reinhardt_admin_confirm_core::model::ModelMeta;
/// use reinhardt_admin_confirm_core::render::{ConfirmationPage, template_candidates};
///
/// let meta = ModelMeta::new("market", "Inventory");
/// assert_eq!(
///     template_candidates(&meta, ConfirmationPage::Change, None),
///     vec![
///         "admin/market/inventory/change_confirmation.html",
///         "admin/market/change_confirmation.html",
///         "admin/change_confirmation.html",
///     ]
/// );
/// assert_eq!(
///     template_candidates(&meta, ConfirmationPage::Action, Some("custom.html")),
///     vec!["custom.html"]
/// );
/// ```
pub fn template_candidates(
	meta: &ModelMeta,
	page: ConfirmationPage,
	custom: Option<&str>,
) -> Vec<String> {
	if let Some(custom) = custom {
		return vec![custom.to_string()];
	}
	let file = page.file_name();
	vec![
		format!("admin/{}/{}/{}", meta.app_label, meta.model_name, file),
		format!("admin/{}/{}", meta.app_label, file),
		format!("admin/{}", file),
	]
}

/// Human readable rendering of a field value in the change table
///
/// # Examples
///
/// ```
/// use reinhardt_admin_confirm_core::render::display_value;
/// use serde_json::json;
///
/// assert_eq!(display_value(&json!([1, "2"])), "1, 2");
/// assert_eq!(display_value(&json!(null)), "-");
/// assert_eq!(display_value(&json!(true)), "Yes");
/// ```
pub fn display_value(value: &Value) -> String {
	match value {
		Value::Null => "-".to_string(),
		Value::Bool(true) => "Yes".to_string(),
		Value::Bool(false) => "No".to_string(),
		Value::Array(items) if items.is_empty() => "-".to_string(),
		Value::Array(items) => items.iter().map(value_to_key).collect::<Vec<_>>().join(", "),
		other => value_to_key(other),
	}
}

fn format_change_value(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
	Ok(Value::String(display_value(value)))
}

/// A rendered page together with what produced it
#[derive(Debug, Clone)]
pub struct TemplateResponse {
	/// Templates that were tried, in order
	pub template_name: Vec<String>,
	/// The template that was rendered
	pub resolved: String,
	/// The context the template saw
	pub context: Value,
	pub content: String,
}

impl TemplateResponse {
	/// Build a response for a page rendered elsewhere (e.g. by the host admin)
	pub fn new(template_name: impl Into<String>, context: Value, content: impl Into<String>) -> Self {
		let template_name = template_name.into();
		Self {
			template_name: vec![template_name.clone()],
			resolved: template_name,
			context,
			content: content.into(),
		}
	}

	/// A value of the rendering context
	pub fn context_value(&self, key: &str) -> Option<&Value> {
		self.context.get(key)
	}
}

/// A hidden input carrying one submitted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiddenInput {
	pub name: String,
	pub value: String,
}

/// Hidden inputs for every form value of a submission
///
/// Admin markers and the CSRF token are left out; repeated keys keep every
/// value.
pub fn hidden_inputs(post: &PostData) -> Vec<HiddenInput> {
	post.form_pairs()
		.map(|(name, value)| HiddenInput {
			name: name.to_string(),
			value: value.to_string(),
		})
		.collect()
}

/// Values shared by both pages
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
	pub title: String,
	pub site_title: String,
	pub site_header: String,
	pub admin_url: String,
	pub changelist_url: String,
	pub app_label: String,
	pub model_name: String,
	pub verbose_name: String,
	/// Rendered as `csrfmiddlewaretoken` in the confirmation form
	#[serde(skip_serializing_if = "Option::is_none")]
	pub csrf_token: Option<String>,
}

impl PageContext {
	pub fn new(
		meta: &ModelMeta,
		title: impl Into<String>,
		admin_url: impl Into<String>,
		changelist_url: impl Into<String>,
	) -> Self {
		Self {
			title: title.into(),
			site_title: "Site administration".to_string(),
			site_header: "Administration".to_string(),
			admin_url: admin_url.into(),
			changelist_url: changelist_url.into(),
			app_label: meta.app_label.clone(),
			model_name: meta.model_name.clone(),
			verbose_name: meta.verbose_name.clone(),
			csrf_token: None,
		}
	}

	pub fn with_csrf_token(mut self, token: Option<&str>) -> Self {
		self.csrf_token = token.map(str::to_string);
		self
	}
}

/// Context of the change confirmation page
#[derive(Debug, Clone, Serialize)]
pub struct ChangeConfirmationContext {
	#[serde(flatten)]
	pub page: PageContext,
	pub add: bool,
	pub object_name: String,
	pub object_id: Option<String>,
	pub changed_data: ChangedData,
	/// Changed fields that made the page necessary
	pub confirmation_fields: Vec<String>,
	pub form_data: Vec<HiddenInput>,
	/// Name of the save button that was pressed
	pub submit_name: String,
	/// The form has file inputs, so the resubmission relies on the cache
	pub is_multipart: bool,
	pub form_url: String,
	#[serde(flatten)]
	pub extra: ExtraContext,
}

/// One record an action is about to touch
#[derive(Debug, Clone, Serialize)]
pub struct QuerysetEntry {
	pub pk: String,
	pub repr: String,
}

/// Context of the action confirmation page
#[derive(Debug, Clone, Serialize)]
pub struct ActionConfirmationContext {
	#[serde(flatten)]
	pub page: PageContext,
	pub action: String,
	pub action_display_name: String,
	pub action_checkbox_name: String,
	pub queryset: Vec<QuerysetEntry>,
}

/// Renders confirmation pages with Tera
#[derive(Clone)]
pub struct ConfirmationRenderer {
	tera: Arc<Tera>,
}

impl ConfirmationRenderer {
	/// Renderer with the built-in templates only
	pub fn new() -> ConfirmResult<Self> {
		Self::build(None)
	}

	/// Renderer whose templates in `dir` override the built-in ones
	pub fn with_template_dir(dir: impl AsRef<Path>) -> ConfirmResult<Self> {
		Self::build(Some(dir.as_ref()))
	}

	pub fn from_settings(settings: &ConfirmSettings) -> ConfirmResult<Self> {
		Self::build(settings.template_dir.as_deref())
	}

	fn build(template_dir: Option<&Path>) -> ConfirmResult<Self> {
		let mut builtin = Tera::default();
		builtin.add_raw_templates(BUILTIN_TEMPLATES)?;

		let mut tera = match template_dir {
			Some(dir) => {
				let glob = format!("{}/**/*.html", dir.display());
				// inheritance is resolved once the built-in bases are merged in
				let mut tera = Tera::parse(&glob)?;
				tera.extend(&builtin)?;
				tracing::debug!(dir = %dir.display(), "loaded confirmation template overrides");
				tera
			}
			None => builtin,
		};
		tera.register_filter("format_change_value", format_change_value);

		Ok(Self {
			tera: Arc::new(tera),
		})
	}

	pub fn has_template(&self, name: &str) -> bool {
		self.tera.get_template_names().any(|known| known == name)
	}

	/// Render the first existing template of `candidates`
	pub fn render(
		&self,
		candidates: Vec<String>,
		context: &impl Serialize,
	) -> ConfirmResult<TemplateResponse> {
		let resolved = candidates
			.iter()
			.find(|name| self.has_template(name))
			.cloned()
			.ok_or_else(|| {
				ConfirmError::Template(format!("no template found among {:?}", candidates))
			})?;
		let context = Context::from_serialize(context)?;
		let content = self.tera.render(&resolved, &context)?;

		Ok(TemplateResponse {
			template_name: candidates,
			resolved,
			context: context.into_json(),
			content,
		})
	}

	pub fn render_change_confirmation(
		&self,
		meta: &ModelMeta,
		custom_template: Option<&str>,
		context: &ChangeConfirmationContext,
	) -> ConfirmResult<TemplateResponse> {
		let candidates = template_candidates(meta, ConfirmationPage::Change, custom_template);
		self.render(candidates, context)
	}

	pub fn render_action_confirmation(
		&self,
		meta: &ModelMeta,
		custom_template: Option<&str>,
		context: &ActionConfirmationContext,
	) -> ConfirmResult<TemplateResponse> {
		let candidates = template_candidates(meta, ConfirmationPage::Action, custom_template);
		self.render(candidates, context)
	}
}
