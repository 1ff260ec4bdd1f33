//! App Store Connect API client for lingosync.
//!
//! Authenticated CRUD against the App Store Connect REST API: per-request
//! ES256 bearer tokens, a generic request core, and thin typed wrappers for
//! the resources the sync pipeline touches. Retry policy deliberately does
//! not live here; callers own recovery.

pub mod auth;
pub mod client;
pub mod error;
pub mod store;
pub mod types;

pub use client::AppStoreConnect;
pub use error::{ConnectError, Result};
pub use store::MetadataStore;
pub use types::{
    App, AppInfoResource, AppInfoText, BetaGroup, Build, LocalizedAppInfo,
    LocalizedVersionContent, VersionContentDraft, VersionContentUpdate, EDITABLE_STATE,
};
