//! Submitted request data
//!
//! A thin view of what the admin framework hands to a change-form or action
//! view: the method, multi-valued form data, uploads and the current user.

use bytes::Bytes;
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{CLEAR_SUFFIX, CSRF_TOKEN, is_reserved_key};

/// Ordered, multi-valued form data
///
/// Keys may repeat (multiple selects, checkboxes); `get` returns the last
/// value for a key the way form frameworks usually do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostData(Vec<(String, String)>);

impl PostData {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build from key/value pairs
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_admin_confirm_core::request::PostData;
	///
	/// let post = PostData::from_pairs([("shops", "1"), ("shops", "2"), ("name", "Mall")]);
	/// assert_eq!(post.get("shops"), Some("2"));
	/// assert_eq!(post.get_list("shops"), vec!["1", "2"]);
	/// assert_eq!(post.keys(), vec!["shops", "name"]);
	/// ```
	pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self(
			pairs
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}

	/// Add a value, keeping existing values of the same key
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.push((key.into(), value.into()));
	}

	/// Replace every value of a key with a single value
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		self.remove(&key);
		self.0.push((key, value.into()));
	}

	/// Builder form of [`PostData::append`]
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.append(key, value);
		self
	}

	/// Remove every value of a key
	pub fn remove(&mut self, key: &str) {
		self.0.retain(|(k, _)| k != key);
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0
			.iter()
			.rev()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	pub fn get_list(&self, key: &str) -> Vec<&str> {
		self.0
			.iter()
			.filter(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
			.collect()
	}

	pub fn contains(&self, key: &str) -> bool {
		self.0.iter().any(|(k, _)| k == key)
	}

	/// Distinct keys in first-seen order
	pub fn keys(&self) -> Vec<&str> {
		let mut keys: Vec<&str> = Vec::new();
		for (k, _) in &self.0 {
			if !keys.contains(&k.as_str()) {
				keys.push(k.as_str());
			}
		}
		keys
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Pairs whose keys are form fields rather than admin markers
	pub fn form_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
		self.iter().filter(|(k, _)| !is_reserved_key(k))
	}

	/// File fields whose clear checkbox was ticked
	pub fn cleared_fields(&self) -> Vec<String> {
		self.keys()
			.into_iter()
			.filter_map(|k| k.strip_suffix(CLEAR_SUFFIX))
			.map(str::to_string)
			.collect()
	}
}

/// A file received with a multipart submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
	pub name: String,
	pub size: usize,
	pub content_type: String,
	pub charset: Option<String>,
	pub content: Bytes,
}

impl UploadedFile {
	/// Create an upload from its name, content type and bytes
	pub fn new(
		name: impl Into<String>,
		content_type: impl Into<String>,
		content: impl Into<Bytes>,
	) -> Self {
		let content = content.into();
		Self {
			name: name.into(),
			size: content.len(),
			content_type: content_type.into(),
			charset: None,
			content,
		}
	}
}

/// The authenticated user making the request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUser {
	pub username: String,
	pub is_staff: bool,
	pub is_superuser: bool,
	/// Permission codenames such as `market.change_shop`
	pub permissions: HashSet<String>,
}

impl AdminUser {
	/// A staff user without any permission
	pub fn staff(username: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			is_staff: true,
			..Default::default()
		}
	}

	/// A user that passes every permission check
	pub fn superuser(username: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			is_staff: true,
			is_superuser: true,
			permissions: HashSet::new(),
		}
	}

	/// Grant a permission codename
	pub fn with_permission(mut self, codename: impl Into<String>) -> Self {
		self.permissions.insert(codename.into());
		self
	}

	pub fn has_perm(&self, codename: &str) -> bool {
		self.is_superuser || self.permissions.contains(codename)
	}
}

/// A request reaching an admin view
#[derive(Debug, Clone)]
pub struct AdminRequest {
	pub method: Method,
	pub path: String,
	pub query: PostData,
	pub post: PostData,
	pub files: IndexMap<String, UploadedFile>,
	pub user: Option<AdminUser>,
	/// Session identifier, used to scope the round-trip cache when set
	pub session_key: Option<String>,
	/// CSRF token issued by the host for this session
	pub csrf_token: Option<String>,
}

impl AdminRequest {
	/// A GET request for a path
	pub fn get(path: impl Into<String>) -> Self {
		Self {
			method: Method::GET,
			path: path.into(),
			query: PostData::new(),
			post: PostData::new(),
			files: IndexMap::new(),
			user: None,
			session_key: None,
			csrf_token: None,
		}
	}

	/// A POST request for a path with form data
	pub fn post(path: impl Into<String>, post: PostData) -> Self {
		Self {
			method: Method::POST,
			post,
			..Self::get(path)
		}
	}

	pub fn with_user(mut self, user: AdminUser) -> Self {
		self.user = Some(user);
		self
	}

	pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
		self.files.insert(field.into(), file);
		self
	}

	pub fn with_query(mut self, query: PostData) -> Self {
		self.query = query;
		self
	}

	pub fn with_session_key(mut self, session_key: impl Into<String>) -> Self {
		self.session_key = Some(session_key.into());
		self
	}

	pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
		self.csrf_token = Some(token.into());
		self
	}

	/// Token a form rendered for this request must post back
	///
	/// The host-issued token wins; otherwise the token the current
	/// submission carried is reused.
	pub fn csrf_token(&self) -> Option<&str> {
		self.csrf_token
			.as_deref()
			.or_else(|| self.post.get(CSRF_TOKEN))
			.filter(|token| !token.is_empty())
	}

	pub fn is_post(&self) -> bool {
		self.method == Method::POST
	}

	/// A post value, falling back to the query string
	pub fn param(&self, key: &str) -> Option<&str> {
		self.post.get(key).or_else(|| self.query.get(key))
	}

	/// Whether the user holds a permission codename
	pub fn user_has_perm(&self, codename: &str) -> bool {
		self.user.as_ref().is_some_and(|user| user.has_perm(codename))
	}
}
