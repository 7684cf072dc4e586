//! # reinhardt-admin-confirm-core
//!
//! Confirmation step for admin add/change forms and changelist actions.
//!
//! Wrap a [`ModelAdmin`] in an [`AdminConfirm`] and its change form stops at
//! a confirmation page whenever one of the configured confirmation fields
//! would change. The page shows the old and new values and posts the
//! original submission back for the final save. Uploaded files survive the
//! round trip through a short-lived server-side cache.
//!
//! Actions wrapped in [`ConfirmAction`] render a confirmation page listing
//! the selected records before they run.
//!
//! ## Modules
//!
//! - [`changes`]: diff of a cleaned form against the persisted record
//! - [`gate`]: decides whether a submission needs confirmation
//! - [`roundtrip`] and [`file_cache`]: state carried between the two posts
//! - [`render`]: Tera confirmation pages
//! - [`confirm`]: the two-phase add/change flow
//! - [`actions`]: changelist actions and their confirmation

pub mod actions;
pub mod admin;
pub mod changes;
pub mod confirm;
pub mod constants;
pub mod error;
pub mod file_cache;
pub mod form;
pub mod gate;
pub mod model;
pub mod options;
pub mod render;
pub mod request;
pub mod roundtrip;
pub mod settings;
pub mod utils;

pub use actions::{ActionRegistry, ActionResult, AdminAction, ConfirmAction};
pub use admin::{AdminResponse, ModelAdmin, PermissionAction};
pub use changes::{ChangedData, FieldChange, detect_changes};
pub use confirm::AdminConfirm;
pub use error::{ConfirmError, ConfirmResult};
pub use gate::GateDecision;
pub use options::{ConfirmOptions, ConfirmOptionsBuilder};
pub use render::{ConfirmationRenderer, ExtraContext, TemplateResponse};
pub use settings::ConfirmSettings;
