//! In-memory market admin used by the integration suites

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use reinhardt_admin_confirm_cache::InMemoryCache;
use reinhardt_admin_confirm_core::actions::{ActionResult, AdminAction, ConfirmAction};
use reinhardt_admin_confirm_core::constants::{ADD_ANOTHER, SAVE_AND_CONTINUE, SAVE_AS_NEW};
use reinhardt_admin_confirm_core::form::{CleanedForm, FormErrors, FormOutcome};
use reinhardt_admin_confirm_core::model::{FieldKind, Fieldset, ModelField, ModelMeta, Record};
use reinhardt_admin_confirm_core::request::{AdminRequest, AdminUser, PostData, UploadedFile};
use reinhardt_admin_confirm_core::{
	AdminConfirm, AdminResponse, ConfirmOptions, ConfirmResult, ConfirmSettings, ExtraContext,
	ModelAdmin, PermissionAction, TemplateResponse,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

pub fn item_meta() -> ModelMeta {
	ModelMeta::new("market", "Item")
		.with_field(ModelField::new("name", FieldKind::Scalar))
		.with_field(ModelField::new("price", FieldKind::Scalar))
		.with_field(ModelField::new("currency", FieldKind::Scalar))
		.with_field(ModelField::new("image", FieldKind::Image))
		.with_field(ModelField::new("file", FieldKind::File))
		.with_field(ModelField::new("description", FieldKind::Scalar))
}

pub fn shop_meta() -> ModelMeta {
	ModelMeta::new("market", "Shop").with_field(ModelField::new("name", FieldKind::Scalar))
}

pub fn inventory_meta() -> ModelMeta {
	ModelMeta::new("market", "Inventory")
		.with_field(ModelField::new("shop", FieldKind::ForeignKey))
		.with_field(ModelField::new("item", FieldKind::ForeignKey))
		.with_field(ModelField::new("quantity", FieldKind::Scalar).with_default(json!(0)))
		.with_field(
			ModelField::new("notes", FieldKind::Scalar).with_default(json!("This is the default")),
		)
}

pub fn shopping_mall_meta() -> ModelMeta {
	ModelMeta::new("market", "ShoppingMall")
		.with_verbose_name("shopping mall")
		.with_field(ModelField::new("name", FieldKind::Scalar))
		.with_field(ModelField::new("shops", FieldKind::ManyToMany))
}

/// A model admin over an in-memory table
pub struct MarketAdmin {
	meta: ModelMeta,
	required: Vec<String>,
	fieldsets: Option<Vec<Fieldset>>,
	readonly: Vec<String>,
	delete_needs_superuser: bool,
	pub rows: Mutex<BTreeMap<i64, Record>>,
	pub stored_files: Mutex<Vec<UploadedFile>>,
	next_id: AtomicI64,
}

impl MarketAdmin {
	pub fn new(meta: ModelMeta) -> Self {
		Self {
			meta,
			required: Vec::new(),
			fieldsets: None,
			readonly: Vec::new(),
			delete_needs_superuser: false,
			rows: Mutex::new(BTreeMap::new()),
			stored_files: Mutex::new(Vec::new()),
			next_id: AtomicI64::new(1),
		}
	}

	pub fn item() -> Self {
		Self::new(item_meta()).with_required(&["name", "price", "currency"])
	}

	pub fn shop() -> Self {
		let mut admin = Self::new(shop_meta()).with_required(&["name"]);
		admin.delete_needs_superuser = true;
		admin
	}

	pub fn inventory() -> Self {
		Self::new(inventory_meta()).with_required(&["shop", "item"])
	}

	pub fn shopping_mall() -> Self {
		Self::new(shopping_mall_meta()).with_required(&["name"])
	}

	pub fn with_required(mut self, fields: &[&str]) -> Self {
		self.required = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	pub fn with_fieldsets(mut self, fieldsets: Vec<Fieldset>) -> Self {
		self.fieldsets = Some(fieldsets);
		self
	}

	pub fn with_readonly(mut self, fields: &[&str]) -> Self {
		self.readonly = fields.iter().map(|f| f.to_string()).collect();
		self
	}

	/// Insert a row and return its id
	pub fn insert(&self, record: Record) -> i64 {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let mut record = record;
		record.pk = Some(json!(id));
		self.rows.lock().insert(id, record);
		id
	}

	pub fn row(&self, id: i64) -> Option<Record> {
		self.rows.lock().get(&id).cloned()
	}

	pub fn count(&self) -> usize {
		self.rows.lock().len()
	}

	fn change_url(&self, id: i64) -> String {
		format!("{}{}/change/", self.changelist_url(), id)
	}

	fn parse_scalar(raw: &str) -> Value {
		if let Ok(int) = raw.parse::<i64>() {
			json!(int)
		} else if let Ok(float) = raw.parse::<f64>() {
			json!(float)
		} else {
			json!(raw)
		}
	}

	fn parse_key(raw: &str) -> Value {
		if raw.is_empty() {
			Value::Null
		} else {
			raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| json!(raw))
		}
	}
}

#[async_trait]
impl ModelAdmin for MarketAdmin {
	fn meta(&self) -> &ModelMeta {
		&self.meta
	}

	fn fieldsets(&self, _request: &AdminRequest, _obj: Option<&Record>) -> Vec<Fieldset> {
		match &self.fieldsets {
			Some(fieldsets) => fieldsets.clone(),
			None => {
				let fields: Vec<String> = self
					.meta
					.editable_fields()
					.map(|field| field.name.clone())
					.collect();
				vec![Fieldset::new(None, fields)]
			}
		}
	}

	fn readonly_fields(&self, _request: &AdminRequest, _obj: Option<&Record>) -> Vec<String> {
		self.readonly.clone()
	}

	fn object_repr(&self, record: &Record) -> String {
		match record.get("name") {
			Value::String(name) => name.clone(),
			_ => match record.pk_string() {
				Some(pk) => format!("{} object ({})", self.meta.verbose_name, pk),
				None => format!("{} object", self.meta.verbose_name),
			},
		}
	}

	async fn get_object(
		&self,
		_request: &AdminRequest,
		object_id: &str,
		_to_field: Option<&str>,
	) -> ConfirmResult<Option<Record>> {
		Ok(object_id.parse::<i64>().ok().and_then(|id| self.row(id)))
	}

	async fn get_queryset(&self, _request: &AdminRequest, ids: &[String]) -> ConfirmResult<Vec<Record>> {
		Ok(ids
			.iter()
			.filter_map(|id| id.parse::<i64>().ok())
			.filter_map(|id| self.row(id))
			.collect())
	}

	async fn has_delete_permission(&self, request: &AdminRequest, _obj: Option<&Record>) -> bool {
		if self.delete_needs_superuser {
			return request.user.as_ref().is_some_and(|user| user.is_superuser);
		}
		request.user_has_perm(&PermissionAction::Delete.codename(&self.meta))
	}

	async fn validate_form(
		&self,
		request: &AdminRequest,
		_obj: Option<&Record>,
		fields: &[String],
	) -> ConfirmResult<FormOutcome> {
		let mut form = CleanedForm::new();
		let mut errors = FormErrors::new();
		let cleared = request.post.cleared_fields();

		for name in fields {
			let Some(field) = self.meta.get_field(name) else {
				continue;
			};
			match field.kind {
				FieldKind::File | FieldKind::Image => {
					if let Some(upload) = request.files.get(name) {
						form = form.with_upload(name.as_str(), upload.clone());
					}
					if cleared.contains(name) {
						form = form.with_cleared(name.as_str());
					}
				}
				FieldKind::ManyToMany => {
					let keys: Vec<Value> = request
						.post
						.get_list(name)
						.into_iter()
						.map(Self::parse_key)
						.collect();
					form = form.with_value(name.as_str(), Value::Array(keys));
				}
				FieldKind::ForeignKey => {
					let value = request.post.get(name).map(Self::parse_key).unwrap_or(Value::Null);
					form = form.with_value(name.as_str(), value);
				}
				FieldKind::Scalar => {
					if let Some(raw) = request.post.get(name) {
						form = form.with_value(name.as_str(), Self::parse_scalar(raw));
					}
				}
				FieldKind::AutoPk => {}
			}

			if self.required.contains(name) {
				let missing = match form.values.get(name) {
					None | Some(Value::Null) => true,
					Some(Value::String(s)) => s.is_empty(),
					_ => false,
				};
				if missing {
					errors.insert(name.clone(), vec!["This field is required.".to_string()]);
				}
			}
		}

		if errors.is_empty() {
			Ok(FormOutcome::Valid(form))
		} else {
			Ok(FormOutcome::Invalid(errors))
		}
	}

	async fn changeform_view(
		&self,
		request: AdminRequest,
		object_id: Option<&str>,
		_form_url: &str,
		extra_context: ExtraContext,
	) -> ConfirmResult<AdminResponse> {
		if !request.is_post() {
			let mut content = String::from("<form method=\"post\">");
			let marker = match object_id {
				None => "_confirm_add",
				Some(_) => "_confirm_change",
			};
			let enabled = extra_context
				.get(&marker[1..])
				.and_then(Value::as_bool)
				.unwrap_or(false);
			if enabled {
				content.push_str(&format!("<input type=\"hidden\" name=\"{}\" value=\"True\">", marker));
			}
			content.push_str("</form>");
			return Ok(AdminResponse::Template(TemplateResponse::new(
				"admin/change_form.html",
				Value::Object(extra_context),
				content,
			)));
		}

		let save_as_new = request.post.contains(SAVE_AS_NEW);
		let obj = match object_id {
			Some(id) if !save_as_new => match self.get_object(&request, id, None).await? {
				Some(obj) => Some(obj),
				None => return Ok(AdminResponse::redirect(self.admin_url())),
			},
			_ => None,
		};
		let fields: Vec<String> = self
			.meta
			.editable_fields()
			.map(|field| field.name.clone())
			.collect();

		let form = match self.validate_form(&request, obj.as_ref(), &fields).await? {
			FormOutcome::Valid(form) => form,
			FormOutcome::Invalid(errors) => {
				let mut context = extra_context;
				context.insert("errors".to_string(), json!(errors));
				return Ok(AdminResponse::Template(TemplateResponse::new(
					"admin/change_form.html",
					Value::Object(context),
					"<ul class=\"errorlist\"></ul>",
				)));
			}
		};

		let mut record = self.save_form(&form, obj.as_ref());
		self.stored_files
			.lock()
			.extend(form.uploads.values().cloned());
		let id = match obj.as_ref().and_then(|obj| obj.pk.as_ref()).and_then(Value::as_i64) {
			Some(id) => {
				record.pk = Some(json!(id));
				self.rows.lock().insert(id, record);
				id
			}
			None => self.insert(record),
		};

		let location = if request.post.contains(SAVE_AND_CONTINUE) {
			self.change_url(id)
		} else if request.post.contains(ADD_ANOTHER) {
			format!("{}add/", self.changelist_url())
		} else {
			self.changelist_url()
		};
		Ok(AdminResponse::redirect(location))
	}
}

/// Action that only reports what was selected
pub struct ShowMessage {
	pub name: &'static str,
	pub label: &'static str,
}

#[async_trait]
impl AdminAction for ShowMessage {
	fn name(&self) -> &str {
		self.name
	}

	fn allowed_permissions(&self) -> Vec<PermissionAction> {
		vec![PermissionAction::Delete]
	}

	async fn execute(&self, _request: &AdminRequest, records: &[Record]) -> ActionResult {
		ActionResult::success(format!("You selected {}", self.label), records.len())
	}
}

pub fn confirm_admin(admin: MarketAdmin, options: ConfirmOptions) -> AdminConfirm<MarketAdmin> {
	AdminConfirm::in_memory(admin, options).unwrap()
}

/// Shop admin with `show_message` behind a confirmation and
/// `show_message_no_confirmation` without one
pub fn shop_admin_with_actions() -> AdminConfirm<MarketAdmin> {
	let admin = confirm_admin(MarketAdmin::shop(), ConfirmOptions::new());
	admin.actions().register(ConfirmAction::new(ShowMessage {
		name: "show_message",
		label: "with confirmation",
	}));
	admin.actions().register(ShowMessage {
		name: "show_message_no_confirmation",
		label: "without confirmation",
	});
	admin
}

pub fn shared_cache_admin(
	admin: MarketAdmin,
	options: ConfirmOptions,
	cache: Arc<InMemoryCache>,
) -> AdminConfirm<MarketAdmin> {
	AdminConfirm::new(admin, options, cache, &ConfirmSettings::default()).unwrap()
}

pub fn superuser() -> AdminUser {
	AdminUser::superuser("super")
}

pub fn post(path: &str, pairs: &[(&str, &str)]) -> AdminRequest {
	AdminRequest::post(path, PostData::from_pairs(pairs.iter().copied())).with_user(superuser())
}

pub fn image() -> UploadedFile {
	UploadedFile::new("test_image.jpg", "image/jpeg", vec![0xFFu8, 0xD8, 0xFF, 0xE0])
}
