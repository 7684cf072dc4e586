//! Reserved form keys and cache defaults

use std::time::Duration;

/// Save button of the change form
pub const SAVE: &str = "_save";
/// "Save as new" button of the change form
pub const SAVE_AS_NEW: &str = "_saveasnew";
/// "Save and add another" button
pub const ADD_ANOTHER: &str = "_addanother";
/// "Save and continue editing" button
pub const SAVE_AND_CONTINUE: &str = "_continue";
/// Save buttons in the order they are looked up in a submission
pub const SAVE_ACTIONS: [&str; 4] = [SAVE, SAVE_AS_NEW, ADD_ANOTHER, SAVE_AND_CONTINUE];

/// Marker posted by an add form that wants confirmation
pub const CONFIRM_ADD: &str = "_confirm_add";
/// Marker posted by a change form that wants confirmation
pub const CONFIRM_CHANGE: &str = "_confirm_change";
/// Marker posted by a confirmation page that relies on the round-trip cache
pub const CONFIRMATION_RECEIVED: &str = "_confirmation_received";
/// Marker posted by the action confirmation page
pub const CONFIRM_ACTION: &str = "_confirm_action";

/// Name of the selected-records checkbox of the changelist
pub const ACTION_CHECKBOX_NAME: &str = "_selected_action";
/// Name of the action selector of the changelist
pub const ACTION_NAME: &str = "action";
/// Query/post key naming the field a popup refers to
pub const TO_FIELD_VAR: &str = "_to_field";
/// CSRF token key; never copied as a form value, the page renders its own
pub const CSRF_TOKEN: &str = "csrfmiddlewaretoken";
/// Suffix of the checkbox that clears a file input
pub const CLEAR_SUFFIX: &str = "-clear";

/// Cache key of the unsaved object
pub const CACHE_KEY_OBJECT: &str = "admin_confirm__confirmation_object";
/// Cache key of the submitted post data
pub const CACHE_KEY_POST: &str = "admin_confirm__confirmation_request_post";
/// Prefix of the per-field upload cache keys
pub const CACHE_KEY_FILE_PREFIX: &str = "admin_confirm__file_cache";

/// How long the round-trip state stays available
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(10);
/// How often the in-memory cache sweeps out expired round-trip state
pub const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Whether a posted key is reserved by the admin rather than a form field
pub fn is_reserved_key(key: &str) -> bool {
	key.starts_with('_') || key == CSRF_TOKEN
}
