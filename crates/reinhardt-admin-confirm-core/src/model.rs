//! Model reflection types shared with the host admin
//!
//! The admin framework owns the ORM; confirmation only needs to know which
//! fields a model has, what kind they are and what their defaults are.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a model field, as far as change detection cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
	/// Auto-generated primary key
	AutoPk,
	/// Plain value (text, number, boolean, date, ...)
	Scalar,
	/// Reference to another record, valued by its primary key
	ForeignKey,
	/// Set of related records, valued by an array of primary keys
	ManyToMany,
	/// Uploaded file, valued by its stored name
	File,
	/// Uploaded image, valued by its stored name
	Image,
}

impl FieldKind {
	/// Whether values of this kind arrive as uploads
	pub fn is_file(&self) -> bool {
		matches!(self, FieldKind::File | FieldKind::Image)
	}
}

/// A single field of a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelField {
	pub name: String,
	pub verbose_name: String,
	pub kind: FieldKind,
	/// Value a new record gets when the form leaves the field out
	pub default: Option<Value>,
	pub editable: bool,
}

impl ModelField {
	/// Create an editable field without a default
	///
	/// The verbose name is derived from the field name.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_core::model::{FieldKind, ModelField};
	///
	/// let field = ModelField::new("unit_price", FieldKind::Scalar);
	/// assert_eq!(field.verbose_name, "unit price");
	/// assert!(field.editable);
	/// ```
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		let name = name.into();
		Self {
			verbose_name: name.replace('_', " "),
			name,
			kind,
			default: None,
			editable: kind != FieldKind::AutoPk,
		}
	}

	/// Set the default value
	pub fn with_default(mut self, default: Value) -> Self {
		self.default = Some(default);
		self
	}

	/// Set the verbose name
	pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = verbose_name.into();
		self
	}

	/// Mark the field as not editable in forms
	pub fn non_editable(mut self) -> Self {
		self.editable = false;
		self
	}

	/// The default value, or null when the field has none
	pub fn default_value(&self) -> Value {
		match (&self.default, self.kind) {
			(Some(default), _) => default.clone(),
			(None, FieldKind::ManyToMany) => Value::Array(Vec::new()),
			(None, _) => Value::Null,
		}
	}
}

/// Reflection data of a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
	pub app_label: String,
	pub model_name: String,
	pub verbose_name: String,
	pub fields: Vec<ModelField>,
}

impl ModelMeta {
	/// Create reflection data with an `id` auto primary key
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_core::model::{FieldKind, ModelField, ModelMeta};
	///
	/// let meta = ModelMeta::new("market", "Item")
	///     .with_field(ModelField::new("name", FieldKind::Scalar))
	///     .with_field(ModelField::new("file", FieldKind::File));
	///
	/// assert_eq!(meta.model_name, "item");
	/// assert_eq!(meta.pk_field().unwrap().name, "id");
	/// assert!(meta.has_file_fields());
	/// ```
	pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
		let model_name = model_name.into().to_lowercase();
		Self {
			app_label: app_label.into(),
			verbose_name: model_name.clone(),
			model_name,
			fields: vec![ModelField::new("id", FieldKind::AutoPk)],
		}
	}

	/// Add a field
	pub fn with_field(mut self, field: ModelField) -> Self {
		self.fields.push(field);
		self
	}

	/// Set the verbose name
	pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = verbose_name.into();
		self
	}

	/// `app_label.model_name`
	pub fn label(&self) -> String {
		format!("{}.{}", self.app_label, self.model_name)
	}

	pub fn get_field(&self, name: &str) -> Option<&ModelField> {
		self.fields.iter().find(|field| field.name == name)
	}

	pub fn pk_field(&self) -> Option<&ModelField> {
		self.fields
			.iter()
			.find(|field| field.kind == FieldKind::AutoPk)
	}

	/// Editable fields in declaration order
	pub fn editable_fields(&self) -> impl Iterator<Item = &ModelField> {
		self.fields.iter().filter(|field| field.editable)
	}

	pub fn file_fields(&self) -> impl Iterator<Item = &ModelField> {
		self.fields.iter().filter(|field| field.kind.is_file())
	}

	pub fn has_file_fields(&self) -> bool {
		self.file_fields().next().is_some()
	}
}

/// A persisted or unsaved record
///
/// `pk` is `None` until the record has been saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
	pub pk: Option<Value>,
	pub values: IndexMap<String, Value>,
}

impl Record {
	/// Create an unsaved record
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a record with a primary key
	pub fn with_pk(pk: impl Into<Value>) -> Self {
		Self {
			pk: Some(pk.into()),
			values: IndexMap::new(),
		}
	}

	/// Set a field value
	pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.values.insert(name.into(), value.into());
		self
	}

	/// Field value, null when unset
	pub fn get(&self, name: &str) -> &Value {
		self.values.get(name).unwrap_or(&Value::Null)
	}

	/// The primary key rendered for URLs and hidden inputs
	pub fn pk_string(&self) -> Option<String> {
		self.pk.as_ref().map(value_to_key)
	}

	/// Record built from the model defaults, used as the baseline of an add
	pub fn from_defaults(meta: &ModelMeta) -> Self {
		let values = meta
			.editable_fields()
			.map(|field| (field.name.clone(), field.default_value()))
			.collect();
		Self { pk: None, values }
	}
}

/// Render a key-like value (primary key, choice) without JSON quoting
pub fn value_to_key(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

/// A titled group of form fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fieldset {
	pub name: Option<String>,
	pub fields: Vec<String>,
}

impl Fieldset {
	pub fn new(name: Option<&str>, fields: Vec<impl Into<String>>) -> Self {
		Self {
			name: name.map(str::to_string),
			fields: fields.into_iter().map(Into::into).collect(),
		}
	}
}

/// Field names of all fieldsets, in order and without duplicates
///
/// # Examples
///
/// ```
/// use reinhardt_admin_confirm_core::model::{Fieldset, flatten_fieldsets};
///
/// let fieldsets = vec![
///     Fieldset::new(None, vec!["name", "price"]),
///     Fieldset::new(Some("Advanced"), vec!["currency", "name"]),
/// ];
/// assert_eq!(flatten_fieldsets(&fieldsets), vec!["name", "price", "currency"]);
/// ```
pub fn flatten_fieldsets(fieldsets: &[Fieldset]) -> Vec<String> {
	let mut fields: Vec<String> = Vec::new();
	for name in fieldsets.iter().flat_map(|fieldset| fieldset.fields.iter()) {
		if !fields.contains(name) {
			fields.push(name.clone());
		}
	}
	fields
}
