//! # Admin Confirm
//!
//! Confirmation pages for admin add, change and bulk action submissions.
//!
//! An admin that opts in shows the user a summary of what is about to change
//! before anything is saved. Changed fields are diffed against the stored
//! record (or the model defaults on add), unsaved uploads are parked in a
//! short-lived cache, and the user confirms or goes back to edit.
//!
//! ## Feature Flags
//!
//! - `cache` - Round-trip cache backends
//! - `core` (default) - Change detection, the confirmation gate, pages and actions
//!
//! ## Example
//!
//! ```rust,ignore
//! use admin_confirm::ExtraContext;
//! use admin_confirm::prelude::*;
//!
//! let options = ConfirmOptions::builder()
//!     .confirm_change(true)
//!     .confirmation_fields(vec!["price", "currency"])
//!     .build();
//! let confirm = AdminConfirm::in_memory(ItemAdmin::default(), options)?;
//!
//! let response = confirm
//!     .changeform_view(request, Some("1"), "", ExtraContext::new())
//!     .await?;
//! ```

#[cfg(feature = "cache")]
pub mod cache {
	//! Round-trip cache backends
	pub use reinhardt_admin_confirm_cache::*;
}

#[cfg(feature = "core")]
pub use reinhardt_admin_confirm_core::{
	actions, admin, changes, confirm, constants, error, file_cache, form, gate, model, options,
	render, request, roundtrip, settings, utils,
};

#[cfg(feature = "core")]
pub use reinhardt_admin_confirm_core::{
	ActionRegistry, ActionResult, AdminAction, AdminConfirm, AdminResponse, ChangedData,
	ConfirmAction, ConfirmError, ConfirmOptions, ConfirmOptionsBuilder, ConfirmResult,
	ConfirmSettings, ConfirmationRenderer, ExtraContext, FieldChange, GateDecision, ModelAdmin,
	PermissionAction, TemplateResponse, detect_changes,
};

/// Re-exports for glob imports
pub mod prelude {
	#[cfg(feature = "cache")]
	pub use reinhardt_admin_confirm_cache::{Cache, InMemoryCache};

	#[cfg(feature = "core")]
	pub use reinhardt_admin_confirm_core::{
		ActionResult, AdminAction, AdminConfirm, AdminResponse, ConfirmAction, ConfirmOptions,
		ConfirmSettings, ModelAdmin, PermissionAction,
		model::{FieldKind, Fieldset, ModelField, ModelMeta, Record},
		request::{AdminRequest, AdminUser, PostData, UploadedFile},
	};
}
