//! State carried between the first submission and its confirmation
//!
//! The unsaved object, the submitted post data and the uploads are cached
//! under fixed keys. The keys can be scoped by a configured prefix and by
//! the session of the request, so concurrent editors do not share state.

use indexmap::IndexMap;
use reinhardt_admin_confirm_cache::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{CACHE_KEY_FILE_PREFIX, CACHE_KEY_OBJECT, CACHE_KEY_POST};
use crate::error::ConfirmResult;
use crate::file_cache::FileCache;
use crate::model::{ModelMeta, Record};
use crate::request::{AdminRequest, PostData, UploadedFile};
use crate::settings::ConfirmSettings;

/// The unsaved object built from the first submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedObject {
	/// `app_label.model_name` of the object
	pub model: String,
	/// Id from the change URL, `None` on the add form
	pub object_id: Option<String>,
	pub record: Record,
}

/// Everything restored for a confirmed submission
#[derive(Debug, Clone)]
pub struct RestoredSubmission {
	pub object: CachedObject,
	pub post: PostData,
	pub uploads: IndexMap<String, UploadedFile>,
}

/// Round-trip cache over any [`Cache`] backend
pub struct RoundTripCache<C: Cache> {
	cache: Arc<C>,
	files: FileCache<C>,
	timeout: Duration,
	key_prefix: Option<String>,
}

impl<C: Cache> RoundTripCache<C> {
	pub fn new(cache: Arc<C>, settings: &ConfirmSettings) -> Self {
		let timeout = settings.cache_timeout();
		Self {
			files: FileCache::new(Arc::clone(&cache), timeout),
			cache,
			timeout,
			key_prefix: settings.cache_key_prefix.clone(),
		}
	}

	pub fn backend(&self) -> &Arc<C> {
		&self.cache
	}

	pub fn files(&self) -> &FileCache<C> {
		&self.files
	}

	/// Full cache key for a base key in the scope of a request
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_cache::InMemoryCache;
	/// use reinhardt_admin_confirm_core::request::{AdminRequest, PostData};
	/// use reinhardt_admin_confirm_core::roundtrip::RoundTripCache;
	/// use reinhardt_admin_confirm_core::ConfirmSettings;
	/// use std::sync::Arc;
	///
	/// let settings = ConfirmSettings {
	///     cache_key_prefix: Some("site".to_string()),
	///     ..Default::default()
	/// };
	/// let cache = RoundTripCache::new(Arc::new(InMemoryCache::new()), &settings);
	///
	/// let request = AdminRequest::post("/admin/", PostData::new()).with_session_key("abc");
	/// assert_eq!(cache.key(&request, "object"), "site:abc:object");
	///
	/// let anonymous = AdminRequest::post("/admin/", PostData::new());
	/// assert_eq!(cache.key(&anonymous, "object"), "site:object");
	/// ```
	pub fn key(&self, request: &AdminRequest, base: &str) -> String {
		[
			self.key_prefix.as_deref(),
			request.session_key.as_deref(),
			Some(base),
		]
		.into_iter()
		.flatten()
		.collect::<Vec<_>>()
		.join(":")
	}

	fn file_key(&self, request: &AdminRequest, field: &str) -> String {
		self.key(request, &format!("{}__{}", CACHE_KEY_FILE_PREFIX, field))
	}

	/// Cache the first submission
	pub async fn store(
		&self,
		request: &AdminRequest,
		object: &CachedObject,
		uploads: &IndexMap<String, UploadedFile>,
	) -> ConfirmResult<()> {
		self.cache
			.set(&self.key(request, CACHE_KEY_OBJECT), object, Some(self.timeout))
			.await?;
		self.cache
			.set(&self.key(request, CACHE_KEY_POST), &request.post, Some(self.timeout))
			.await?;
		for (field, upload) in uploads {
			self.files.set(&self.file_key(request, field), upload).await?;
		}

		tracing::debug!(
			model = %object.model,
			object_id = ?object.object_id,
			uploads = uploads.len(),
			"stored confirmation state"
		);
		Ok(())
	}

	/// Restore the state cached for this resubmission
	///
	/// Nothing is returned when the cached object belongs to another model or
	/// object, or when a form value of the resubmission differs from the
	/// value that was confirmed.
	pub async fn restore(
		&self,
		request: &AdminRequest,
		meta: &ModelMeta,
		object_id: Option<&str>,
	) -> ConfirmResult<Option<RestoredSubmission>> {
		let object: Option<CachedObject> = self.cache.get(&self.key(request, CACHE_KEY_OBJECT)).await?;
		let post: Option<PostData> = self.cache.get(&self.key(request, CACHE_KEY_POST)).await?;
		let (Some(object), Some(post)) = (object, post) else {
			tracing::debug!(model = %meta.label(), "no confirmation state cached");
			return Ok(None);
		};

		if object.model != meta.label() || object.object_id.as_deref() != object_id {
			tracing::warn!(
				cached_model = %object.model,
				cached_object_id = ?object.object_id,
				model = %meta.label(),
				object_id = ?object_id,
				"cached confirmation state belongs to another object"
			);
			return Ok(None);
		}
		if let Some(key) = first_mismatch(&request.post, &post) {
			tracing::warn!(model = %meta.label(), key, "resubmitted data differs from confirmed data");
			return Ok(None);
		}

		let mut uploads = IndexMap::new();
		for field in meta.file_fields() {
			if let Some(upload) = self.files.get(&self.file_key(request, &field.name)).await? {
				uploads.insert(field.name.clone(), upload);
			}
		}

		Ok(Some(RestoredSubmission {
			object,
			post,
			uploads,
		}))
	}

	/// Drop the state cached for a request
	pub async fn clear(&self, request: &AdminRequest, meta: &ModelMeta) -> ConfirmResult<()> {
		let keys = [
			self.key(request, CACHE_KEY_OBJECT),
			self.key(request, CACHE_KEY_POST),
		];
		self.cache.delete_many(&keys).await?;
		for field in meta.file_fields() {
			self.files.delete(&self.file_key(request, &field.name)).await?;
		}
		Ok(())
	}
}

/// First form key whose values differ between two submissions
fn first_mismatch<'a>(submitted: &'a PostData, cached: &PostData) -> Option<&'a str> {
	submitted
		.form_pairs()
		.map(|(key, _)| key)
		.find(|key| submitted.get_list(key) != cached.get_list(key))
}
