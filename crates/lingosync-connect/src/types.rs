//! Domain and wire types for the App Store Connect API.
//!
//! The API speaks JSON:API: resources arrive as `{id, attributes}` records
//! wrapped in a `data` envelope, and writes go out as
//! `{data: {type, id?, attributes, relationships?}}`. Wire structs stay
//! private to the crate; callers see the flattened domain types.

use serde::{Deserialize, Serialize};

/// Lifecycle state in which an app-info resource accepts writes.
pub const EDITABLE_STATE: &str = "PREPARE_FOR_SUBMISSION";

// ============================================================================
// Domain types
// ============================================================================

/// An app record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub id: String,
    pub name: Option<String>,
    pub bundle_id: Option<String>,
    pub primary_locale: Option<String>,
}

/// One locale's store listing attached to an app-store-version.
///
/// Unique per (version, locale). `remote_id` is populated for records read
/// from the store and absent for drafts that exist only locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedVersionContent {
    pub remote_id: Option<String>,
    pub locale: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub promotional_text: Option<String>,
    pub marketing_url: Option<String>,
    pub support_url: Option<String>,
    pub whats_new: Option<String>,
}

/// One locale's name and subtitle attached to an app-info resource.
///
/// Unique per (app-info resource, locale).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedAppInfo {
    pub remote_id: Option<String>,
    pub locale: String,
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub parent_app_info_id: String,
}

/// An app-info resource with its lifecycle state.
///
/// Apps can carry several of these, but at most one is editable at a time
/// and only the editable one is a valid create/update target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfoResource {
    pub id: String,
    pub state: Option<String>,
}

impl AppInfoResource {
    /// Whether localizations may be created or updated on this resource.
    pub fn is_editable(&self) -> bool {
        self.state.as_deref() == Some(EDITABLE_STATE)
    }
}

/// A TestFlight build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub id: String,
    pub version: Option<String>,
    pub processing_state: Option<String>,
}

/// A TestFlight beta group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetaGroup {
    pub id: String,
    pub name: Option<String>,
    pub is_internal: Option<bool>,
}

// ============================================================================
// Write payloads
// ============================================================================

/// Attribute payload for updating an existing version localization.
///
/// Absent fields are omitted from the request body and left untouched
/// remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionContentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotional_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whats_new: Option<String>,
}

/// Attribute payload for creating a version localization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionContentDraft {
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotional_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whats_new: Option<String>,
}

impl VersionContentDraft {
    /// Builds a create payload for `locale` from an update payload.
    pub fn from_update(locale: impl Into<String>, update: VersionContentUpdate) -> Self {
        Self {
            locale: locale.into(),
            description: update.description,
            keywords: update.keywords,
            promotional_text: update.promotional_text,
            marketing_url: update.marketing_url,
            support_url: update.support_url,
            whats_new: update.whats_new,
        }
    }
}

/// Name/subtitle payload for app-info localization writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SingleResponse<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppData {
    pub id: String,
    pub attributes: AppAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppAttributes {
    pub name: Option<String>,
    pub bundle_id: Option<String>,
    pub primary_locale: Option<String>,
}

impl From<AppData> for App {
    fn from(data: AppData) -> Self {
        App {
            id: data.id,
            name: data.attributes.name,
            bundle_id: data.attributes.bundle_id,
            primary_locale: data.attributes.primary_locale,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppStoreVersionData {
    pub id: String,
    pub attributes: AppStoreVersionAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppStoreVersionAttributes {
    #[allow(dead_code)]
    pub version_string: Option<String>,
    pub whats_new: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionLocalizationData {
    pub id: String,
    pub attributes: VersionLocalizationAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionLocalizationAttributes {
    pub locale: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub promotional_text: Option<String>,
    pub marketing_url: Option<String>,
    pub support_url: Option<String>,
    pub whats_new: Option<String>,
}

impl From<VersionLocalizationData> for LocalizedVersionContent {
    fn from(data: VersionLocalizationData) -> Self {
        let attrs = data.attributes;
        LocalizedVersionContent {
            remote_id: Some(data.id),
            locale: attrs.locale,
            description: attrs.description,
            keywords: attrs.keywords,
            promotional_text: attrs.promotional_text,
            marketing_url: attrs.marketing_url,
            support_url: attrs.support_url,
            whats_new: attrs.whats_new,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppInfoData {
    pub id: String,
    pub attributes: AppInfoAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppInfoAttributes {
    pub app_store_state: Option<String>,
}

impl From<AppInfoData> for AppInfoResource {
    fn from(data: AppInfoData) -> Self {
        AppInfoResource {
            id: data.id,
            state: data.attributes.app_store_state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppInfoLocalizationData {
    pub id: String,
    pub attributes: AppInfoLocalizationAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppInfoLocalizationAttributes {
    pub locale: String,
    pub name: Option<String>,
    pub subtitle: Option<String>,
}

impl AppInfoLocalizationData {
    pub(crate) fn into_domain(self, parent_app_info_id: &str) -> LocalizedAppInfo {
        LocalizedAppInfo {
            remote_id: Some(self.id),
            locale: self.attributes.locale,
            name: self.attributes.name,
            subtitle: self.attributes.subtitle,
            parent_app_info_id: parent_app_info_id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BuildData {
    pub id: String,
    pub attributes: BuildAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BuildAttributes {
    pub version: Option<String>,
    pub processing_state: Option<String>,
}

impl From<BuildData> for Build {
    fn from(data: BuildData) -> Self {
        Build {
            id: data.id,
            version: data.attributes.version,
            processing_state: data.attributes.processing_state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BetaGroupData {
    pub id: String,
    pub attributes: BetaGroupAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BetaGroupAttributes {
    pub name: Option<String>,
    pub is_internal_group: Option<bool>,
}

impl From<BetaGroupData> for BetaGroup {
    fn from(data: BetaGroupData) -> Self {
        BetaGroup {
            id: data.id,
            name: data.attributes.name,
            is_internal: data.attributes.is_internal_group,
        }
    }
}
