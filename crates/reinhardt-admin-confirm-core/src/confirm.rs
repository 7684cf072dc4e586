//! The two-phase add/change flow
//!
//! [`AdminConfirm`] wraps a [`ModelAdmin`]. A form posted with
//! `_confirm_add` or `_confirm_change` is validated and diffed; when a
//! confirmation field changed, the confirmation page is rendered instead of
//! saving. The page posts the same data back without the marker, so the
//! second submission goes through the host's normal save path. Forms with
//! file inputs post `_confirmation_received` instead and have their uploads
//! restored from the round-trip cache.

use reinhardt_admin_confirm_cache::{Cache, InMemoryCache};
use serde_json::Value;
use std::sync::Arc;

use crate::actions::ActionRegistry;
use crate::admin::{AdminResponse, ModelAdmin};
use crate::changes::detect_changes;
use crate::constants::{
	CACHE_CLEANUP_INTERVAL, CONFIRM_ADD, CONFIRM_CHANGE, CONFIRMATION_RECEIVED, SAVE,
	SAVE_ACTIONS, SAVE_AS_NEW, TO_FIELD_VAR,
};
use crate::error::{ConfirmError, ConfirmResult};
use crate::form::FormOutcome;
use crate::gate::{self, GateDecision};
use crate::model::flatten_fieldsets;
use crate::options::ConfirmOptions;
use crate::render::{
	ChangeConfirmationContext, ConfirmationRenderer, ExtraContext, PageContext, hidden_inputs,
};
use crate::request::AdminRequest;
use crate::roundtrip::{CachedObject, RoundTripCache};
use crate::settings::ConfirmSettings;

/// A model admin with confirmation on its change form and actions
pub struct AdminConfirm<A: ModelAdmin, C: Cache = InMemoryCache> {
	admin: A,
	options: ConfirmOptions,
	cache: RoundTripCache<C>,
	renderer: ConfirmationRenderer,
	actions: ActionRegistry,
}

impl<A: ModelAdmin, C: Cache> AdminConfirm<A, C> {
	/// Wrap `admin`, loading templates as the settings say
	pub fn new(
		admin: A,
		options: ConfirmOptions,
		cache: Arc<C>,
		settings: &ConfirmSettings,
	) -> ConfirmResult<Self> {
		Ok(Self {
			admin,
			options,
			cache: RoundTripCache::new(cache, settings),
			renderer: ConfirmationRenderer::from_settings(settings)?,
			actions: ActionRegistry::new(),
		})
	}

	/// Share a renderer between several admins
	pub fn with_renderer(mut self, renderer: ConfirmationRenderer) -> Self {
		self.renderer = renderer;
		self
	}

	pub fn admin(&self) -> &A {
		&self.admin
	}

	pub fn options(&self) -> &ConfirmOptions {
		&self.options
	}

	pub fn cache(&self) -> &RoundTripCache<C> {
		&self.cache
	}

	pub fn renderer(&self) -> &ConfirmationRenderer {
		&self.renderer
	}

	/// Actions of the changelist
	pub fn actions(&self) -> &ActionRegistry {
		&self.actions
	}

	/// Add and change view
	pub async fn changeform_view(
		&self,
		request: AdminRequest,
		object_id: Option<&str>,
		form_url: &str,
		extra_context: ExtraContext,
	) -> ConfirmResult<AdminResponse> {
		if request.is_post() {
			let wants_confirmation = match object_id {
				None => request.post.contains(CONFIRM_ADD),
				Some(_) => request.post.contains(CONFIRM_CHANGE),
			};
			if wants_confirmation {
				self.cache.clear(&request, self.admin.meta()).await?;
				return match self
					.confirmation_view(request, object_id, form_url, extra_context)
					.await
				{
					Err(err) => AdminResponse::from_error(err),
					response => response,
				};
			}
			if request.post.contains(CONFIRMATION_RECEIVED) {
				return self
					.confirmation_received_view(request, object_id, form_url, extra_context)
					.await;
			}
			self.cache.clear(&request, self.admin.meta()).await?;
		}

		self.delegate(request, object_id, form_url, extra_context).await
	}

	/// Changelist action submission
	pub async fn changelist_action(&self, request: &AdminRequest) -> ConfirmResult<AdminResponse> {
		self.actions
			.dispatch(&self.admin, &self.renderer, &self.options, request)
			.await
	}

	fn extend_context(&self, mut extra_context: ExtraContext) -> ExtraContext {
		extra_context.insert("confirm_add".to_string(), Value::Bool(self.options.confirm_add));
		extra_context.insert(
			"confirm_change".to_string(),
			Value::Bool(self.options.confirm_change),
		);
		extra_context
	}

	async fn confirmation_view(
		&self,
		request: AdminRequest,
		object_id: Option<&str>,
		form_url: &str,
		extra_context: ExtraContext,
	) -> ConfirmResult<AdminResponse> {
		let meta = self.admin.meta();

		let to_field = request.param(TO_FIELD_VAR).map(str::to_string);
		if let Some(to_field) = to_field.as_deref()
			&& !self.admin.to_field_allowed(to_field)
		{
			return Err(ConfirmError::DisallowedToField(to_field.to_string()));
		}

		let add = object_id.is_none() || request.post.contains(SAVE_AS_NEW);
		let obj = match object_id {
			Some(object_id) if !add => {
				let Some(obj) = self
					.admin
					.get_object(&request, object_id, to_field.as_deref())
					.await?
				else {
					tracing::warn!(model = %meta.label(), object_id, "object to confirm no longer exists");
					return Ok(AdminResponse::redirect_with_message(
						self.admin.admin_url(),
						format!(
							"{} with ID “{}” doesn’t exist. Perhaps it was deleted?",
							meta.verbose_name, object_id
						),
					));
				};
				if !self.admin.has_change_permission(&request, Some(&obj)).await {
					return Err(ConfirmError::PermissionDenied(format!("change {}", meta.label())));
				}
				Some(obj)
			}
			_ => {
				if !self.admin.has_add_permission(&request).await {
					return Err(ConfirmError::PermissionDenied(format!("add {}", meta.label())));
				}
				None
			}
		};

		let fieldsets = self.admin.fieldsets(&request, obj.as_ref());
		let readonly = self.admin.readonly_fields(&request, obj.as_ref());
		let form_fields: Vec<String> = flatten_fieldsets(&fieldsets)
			.into_iter()
			.filter(|field| !readonly.contains(field))
			.collect();

		let form = match self
			.admin
			.validate_form(&request, obj.as_ref(), &form_fields)
			.await?
		{
			FormOutcome::Valid(form) => form,
			FormOutcome::Invalid(errors) => {
				tracing::debug!(model = %meta.label(), errors = errors.len(), "invalid form, skipping confirmation");
				return self.delegate(request, object_id, form_url, extra_context).await;
			}
		};

		let new_object = self.admin.save_form(&form, obj.as_ref());
		let changed = detect_changes(meta, &form, obj.as_ref(), &form_fields);
		let confirmation_fields: Vec<String> = gate::confirmation_fields(&self.options, &fieldsets)
			.into_iter()
			.filter(|field| !readonly.contains(field))
			.collect();
		let GateDecision::Confirm(fields) = gate::evaluate(&changed, &confirmation_fields) else {
			tracing::debug!(model = %meta.label(), object_id, "no confirmation field changed");
			return self.delegate(request, object_id, form_url, extra_context).await;
		};

		let is_multipart = form_fields
			.iter()
			.filter_map(|name| meta.get_field(name))
			.any(|field| field.kind.is_file());
		if is_multipart {
			let cached = CachedObject {
				model: meta.label(),
				object_id: object_id.map(str::to_string),
				record: new_object.clone(),
			};
			self.cache.store(&request, &cached, &request.files).await?;
		}

		let submit_name = SAVE_ACTIONS
			.into_iter()
			.find(|action| request.post.contains(action))
			.unwrap_or(SAVE);
		let title = format!(
			"Confirm {} {}",
			if add { "Add" } else { "Change" },
			meta.verbose_name
		);
		let object_name = match &obj {
			Some(obj) => self.admin.object_repr(obj),
			None => self.admin.object_repr(&new_object),
		};

		tracing::info!(
			model = %meta.label(),
			object_id,
			add,
			fields = ?fields,
			"rendering change confirmation"
		);
		let context = ChangeConfirmationContext {
			page: PageContext::new(
				meta,
				title,
				self.admin.admin_url(),
				self.admin.changelist_url(),
			)
			.with_csrf_token(request.csrf_token()),
			add,
			object_name,
			object_id: object_id.map(str::to_string),
			changed_data: changed,
			confirmation_fields: fields,
			form_data: hidden_inputs(&request.post),
			submit_name: submit_name.to_string(),
			is_multipart,
			form_url: form_url.to_string(),
			extra: extra_context,
		};
		let response = self.renderer.render_change_confirmation(
			meta,
			self.options.change_confirmation_template.as_deref(),
			&context,
		)?;
		Ok(AdminResponse::Template(response))
	}

	async fn confirmation_received_view(
		&self,
		mut request: AdminRequest,
		object_id: Option<&str>,
		form_url: &str,
		extra_context: ExtraContext,
	) -> ConfirmResult<AdminResponse> {
		let meta = self.admin.meta();
		// the object was cached under the URL id even when saved as new
		let restored = self.cache.restore(&request, meta, object_id).await?;
		request.post.remove(CONFIRMATION_RECEIVED);

		match restored {
			Some(restored) => {
				let cleared = request.post.cleared_fields();
				let mut reattached = Vec::new();
				for (field, upload) in restored.uploads {
					if request.files.contains_key(&field) || cleared.contains(&field) {
						continue;
					}
					request.files.insert(field.clone(), upload);
					reattached.push(field);
				}
				tracing::info!(
					model = %meta.label(),
					object_id,
					reattached = ?reattached,
					"saving confirmed submission"
				);
			}
			None => {
				tracing::warn!(
					model = %meta.label(),
					object_id,
					"confirmation state missing or expired, saving without cached uploads"
				);
			}
		}

		let cache_scope = request.clone();
		let response = self.delegate(request, object_id, form_url, extra_context).await;
		self.cache.clear(&cache_scope, meta).await?;
		response
	}

	async fn delegate(
		&self,
		request: AdminRequest,
		object_id: Option<&str>,
		form_url: &str,
		extra_context: ExtraContext,
	) -> ConfirmResult<AdminResponse> {
		self.admin
			.changeform_view(request, object_id, form_url, self.extend_context(extra_context))
			.await
	}
}

impl<A: ModelAdmin> AdminConfirm<A, InMemoryCache> {
	/// Wrap `admin` with a private in-memory cache and default settings
	///
	/// The cache sweeps expired entries every [`CACHE_CLEANUP_INTERVAL`] when
	/// created inside a tokio runtime.
	pub fn in_memory(admin: A, options: ConfirmOptions) -> ConfirmResult<Self> {
		let cache = InMemoryCache::new().with_auto_cleanup(CACHE_CLEANUP_INTERVAL);
		Self::new(admin, options, Arc::new(cache), &ConfirmSettings::default())
	}
}

