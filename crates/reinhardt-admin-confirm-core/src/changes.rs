//! Change detection
//!
//! Compares the cleaned data of a submitted form with the persisted record
//! (or with the model defaults when adding) and reports every field whose
//! value would change.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::form::CleanedForm;
use crate::model::{FieldKind, ModelField, ModelMeta, Record, value_to_key};

/// One changed field with its old and new values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
	pub field: String,
	pub label: String,
	pub old: Value,
	pub new: Value,
}

/// Changed fields in form order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangedData(Vec<FieldChange>);

impl ChangedData {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn get(&self, field: &str) -> Option<&FieldChange> {
		self.0.iter().find(|change| change.field == field)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.get(field).is_some()
	}

	/// Names of the changed fields
	pub fn fields(&self) -> Vec<&str> {
		self.0.iter().map(|change| change.field.as_str()).collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
		self.0.iter()
	}

	fn push(&mut self, field: &ModelField, old: Value, new: Value) {
		self.0.push(FieldChange {
			field: field.name.clone(),
			label: field.verbose_name.clone(),
			old,
			new,
		});
	}
}

/// Diff a cleaned form against its baseline
///
/// `fields` are the fields shown in the form; anything else is ignored.
/// Without an `original` the submission is an add and values are compared
/// with the model defaults; blank values never count as changes then.
///
/// # Examples
///
/// ```
/// use reinhardt_admin_confirm_core::changes::detect_changes;
/// use reinhardt_admin_confirm_core::form::CleanedForm;
/// use reinhardt_admin_confirm_core::model::{FieldKind, ModelField, ModelMeta, Record};
/// use serde_json::json;
///
/// let meta = ModelMeta::new("market", "Inventory")
///     .with_field(ModelField::new("quantity", FieldKind::Scalar).with_default(json!(0)))
///     .with_field(ModelField::new("shop", FieldKind::ForeignKey));
/// let original = Record::with_pk(1).set("quantity", 5).set("shop", 2);
/// let form = CleanedForm::new().with_value("quantity", 5).with_value("shop", "3");
///
/// let changed = detect_changes(&meta, &form, Some(&original), &["quantity".to_string(), "shop".to_string()]);
/// assert_eq!(changed.fields(), vec!["shop"]);
/// ```
pub fn detect_changes(
	meta: &ModelMeta,
	form: &CleanedForm,
	original: Option<&Record>,
	fields: &[String],
) -> ChangedData {
	let mut changed = ChangedData::default();

	for name in fields {
		let Some(field) = meta.get_field(name).filter(|field| field.editable) else {
			continue;
		};
		let old = match original {
			Some(record) => record.get(name).clone(),
			None => field.default_value(),
		};

		if field.kind.is_file() {
			if let Some(upload) = form.uploads.get(name) {
				changed.push(field, old, Value::String(upload.name.clone()));
			} else if form.is_cleared(name) && !is_blank(&old) {
				changed.push(field, old, Value::Null);
			}
			continue;
		}

		let Some(new) = form.values.get(name) else {
			continue;
		};
		if original.is_none() && is_blank(new) {
			continue;
		}
		if !values_equal(field.kind, &old, new) {
			changed.push(field, old, new.clone());
		}
	}

	changed
}

/// Compare two values of a field of the given kind
pub fn values_equal(kind: FieldKind, a: &Value, b: &Value) -> bool {
	match kind {
		FieldKind::ManyToMany => key_set(a) == key_set(b),
		FieldKind::ForeignKey | FieldKind::AutoPk | FieldKind::File | FieldKind::Image => {
			value_to_key(a) == value_to_key(b)
		}
		FieldKind::Scalar => scalar_equal(a, b),
	}
}

fn scalar_equal(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => {
			x == y || matches!((x.as_f64(), y.as_f64()), (Some(x), Some(y)) if x == y)
		}
		_ => a == b,
	}
}

fn key_set(value: &Value) -> BTreeSet<String> {
	match value {
		Value::Array(items) => items.iter().map(value_to_key).collect(),
		Value::Null => BTreeSet::new(),
		other => BTreeSet::from([value_to_key(other)]),
	}
}

fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.is_empty(),
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}
