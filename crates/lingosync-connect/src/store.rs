//! The store seam consumed by the reconciliation engine.

use async_trait::async_trait;

use crate::client::AppStoreConnect;
use crate::error::Result;
use crate::types::{
    AppInfoResource, AppInfoText, LocalizedAppInfo, LocalizedVersionContent, VersionContentDraft,
    VersionContentUpdate,
};

/// Remote metadata-store operations the reconciliation engine relies on.
///
/// [`AppStoreConnect`] is the production implementation; engine tests
/// substitute an in-memory fake.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// The id of the app's most recent App Store version.
    async fn latest_version_id(&self, app_id: &str) -> Result<String>;

    /// All localized listings attached to a version.
    async fn version_localizations(
        &self,
        version_id: &str,
    ) -> Result<Vec<LocalizedVersionContent>>;

    /// Creates a localized listing for a version.
    async fn create_version_localization(
        &self,
        version_id: &str,
        draft: &VersionContentDraft,
    ) -> Result<LocalizedVersionContent>;

    /// Updates an existing localized listing.
    async fn update_version_localization(
        &self,
        localization_id: &str,
        update: &VersionContentUpdate,
    ) -> Result<()>;

    /// The app's app-info resources, with lifecycle state.
    async fn app_infos(&self, app_id: &str) -> Result<Vec<AppInfoResource>>;

    /// Localized name/subtitle records attached to an app-info resource.
    async fn app_info_localizations(&self, app_info_id: &str) -> Result<Vec<LocalizedAppInfo>>;

    /// Creates a localized name/subtitle record on an app-info resource.
    async fn create_app_info_localization(
        &self,
        app_info_id: &str,
        locale: &str,
        text: &AppInfoText,
    ) -> Result<LocalizedAppInfo>;

    /// Updates an existing localized name/subtitle record.
    async fn update_app_info_localization(
        &self,
        localization_id: &str,
        text: &AppInfoText,
    ) -> Result<()>;
}

#[async_trait]
impl MetadataStore for AppStoreConnect {
    async fn latest_version_id(&self, app_id: &str) -> Result<String> {
        AppStoreConnect::latest_version_id(self, app_id).await
    }

    async fn version_localizations(
        &self,
        version_id: &str,
    ) -> Result<Vec<LocalizedVersionContent>> {
        AppStoreConnect::version_localizations(self, version_id).await
    }

    async fn create_version_localization(
        &self,
        version_id: &str,
        draft: &VersionContentDraft,
    ) -> Result<LocalizedVersionContent> {
        AppStoreConnect::create_version_localization(self, version_id, draft).await
    }

    async fn update_version_localization(
        &self,
        localization_id: &str,
        update: &VersionContentUpdate,
    ) -> Result<()> {
        AppStoreConnect::update_version_localization(self, localization_id, update).await
    }

    async fn app_infos(&self, app_id: &str) -> Result<Vec<AppInfoResource>> {
        AppStoreConnect::app_infos(self, app_id).await
    }

    async fn app_info_localizations(&self, app_info_id: &str) -> Result<Vec<LocalizedAppInfo>> {
        AppStoreConnect::app_info_localizations(self, app_info_id).await
    }

    async fn create_app_info_localization(
        &self,
        app_info_id: &str,
        locale: &str,
        text: &AppInfoText,
    ) -> Result<LocalizedAppInfo> {
        AppStoreConnect::create_app_info_localization(self, app_info_id, locale, text).await
    }

    async fn update_app_info_localization(
        &self,
        localization_id: &str,
        text: &AppInfoText,
    ) -> Result<()> {
        AppStoreConnect::update_app_info_localization(self, localization_id, text).await
    }
}
