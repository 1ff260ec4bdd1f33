//! App Store Connect API client.

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::auth::TokenSigner;
use crate::error::{ConnectError, Result};
use crate::types::*;

const API_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// App Store Connect API client.
///
/// Every request carries a freshly minted bearer token. The client performs
/// no retries and no backoff; recovery policy belongs to the caller.
pub struct AppStoreConnect {
    signer: TokenSigner,
    client: Client,
    base_url: String,
}

impl AppStoreConnect {
    /// Creates a client from an API key id, issuer id, and PEM private key
    /// content.
    pub fn new(
        key_id: impl Into<String>,
        issuer_id: impl Into<String>,
        private_key_pem: &str,
    ) -> Result<Self> {
        Ok(Self {
            signer: TokenSigner::new(key_id, issuer_id, private_key_pem)?,
            client: Client::new(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Make an authenticated API request and deserialize the response.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let response = self.send(method, path, query, body).await?;
        Ok(response.json().await?)
    }

    /// Make an authenticated API request, discarding the response body.
    async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<()> {
        self.send(method, path, None, body).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self.signer.bearer_token()?;
        let url = format!("{}{}", self.base_url, path);

        debug!("API request: {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json");

        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    // ------------------------------------------------------------------
    // Apps
    // ------------------------------------------------------------------

    /// Lists the apps visible to this key.
    pub async fn list_apps(&self) -> Result<Vec<App>> {
        let response: ListResponse<AppData> =
            self.request(Method::GET, "/apps", None, None).await?;
        Ok(response.data.into_iter().map(App::from).collect())
    }

    /// Fetches a single app.
    pub async fn get_app(&self, app_id: &str) -> Result<App> {
        let response: SingleResponse<AppData> = self
            .request(Method::GET, &format!("/apps/{app_id}"), None, None)
            .await?;
        Ok(response.data.into())
    }

    // ------------------------------------------------------------------
    // App Store versions
    // ------------------------------------------------------------------

    /// The id of the app's most recent App Store version.
    pub async fn latest_version_id(&self, app_id: &str) -> Result<String> {
        let response: ListResponse<AppStoreVersionData> = self
            .request(
                Method::GET,
                &format!("/apps/{app_id}/appStoreVersions"),
                None,
                None,
            )
            .await?;

        response
            .data
            .first()
            .map(|version| version.id.clone())
            .ok_or_else(|| ConnectError::NotFound(format!("no App Store versions for app {app_id}")))
    }

    /// Release notes attached to a version, when present.
    pub async fn whats_new(&self, version_id: &str) -> Result<Option<String>> {
        let response: SingleResponse<AppStoreVersionData> = self
            .request(
                Method::GET,
                &format!("/appStoreVersions/{version_id}"),
                None,
                None,
            )
            .await?;
        Ok(response.data.attributes.whats_new)
    }

    // ------------------------------------------------------------------
    // Version localizations
    // ------------------------------------------------------------------

    /// All localized listings attached to a version.
    pub async fn version_localizations(
        &self,
        version_id: &str,
    ) -> Result<Vec<LocalizedVersionContent>> {
        let response: ListResponse<VersionLocalizationData> = self
            .request(
                Method::GET,
                &format!("/appStoreVersions/{version_id}/appStoreVersionLocalizations"),
                None,
                None,
            )
            .await?;
        Ok(response.data.into_iter().map(Into::into).collect())
    }

    /// Creates a localized listing for a version.
    pub async fn create_version_localization(
        &self,
        version_id: &str,
        draft: &VersionContentDraft,
    ) -> Result<LocalizedVersionContent> {
        let body = json!({
            "data": {
                "type": "appStoreVersionLocalizations",
                "attributes": draft,
                "relationships": {
                    "appStoreVersion": {
                        "data": {
                            "type": "appStoreVersions",
                            "id": version_id
                        }
                    }
                }
            }
        });

        let response: SingleResponse<VersionLocalizationData> = self
            .request(
                Method::POST,
                "/appStoreVersionLocalizations",
                None,
                Some(body),
            )
            .await?;
        Ok(response.data.into())
    }

    /// Updates an existing localized listing.
    pub async fn update_version_localization(
        &self,
        localization_id: &str,
        update: &VersionContentUpdate,
    ) -> Result<()> {
        let body = json!({
            "data": {
                "type": "appStoreVersionLocalizations",
                "id": localization_id,
                "attributes": update
            }
        });

        self.request_empty(
            Method::PATCH,
            &format!("/appStoreVersionLocalizations/{localization_id}"),
            Some(body),
        )
        .await
    }

    // ------------------------------------------------------------------
    // App infos
    // ------------------------------------------------------------------

    /// The app's app-info resources, with lifecycle state.
    pub async fn app_infos(&self, app_id: &str) -> Result<Vec<AppInfoResource>> {
        let response: ListResponse<AppInfoData> = self
            .request(Method::GET, &format!("/apps/{app_id}/appInfos"), None, None)
            .await?;
        Ok(response.data.into_iter().map(Into::into).collect())
    }

    /// Localized name/subtitle records attached to an app-info resource.
    pub async fn app_info_localizations(
        &self,
        app_info_id: &str,
    ) -> Result<Vec<LocalizedAppInfo>> {
        let response: ListResponse<AppInfoLocalizationData> = self
            .request(
                Method::GET,
                &format!("/appInfos/{app_info_id}/appInfoLocalizations"),
                None,
                None,
            )
            .await?;
        Ok(response
            .data
            .into_iter()
            .map(|data| data.into_domain(app_info_id))
            .collect())
    }

    /// Creates a localized name/subtitle record on an app-info resource.
    pub async fn create_app_info_localization(
        &self,
        app_info_id: &str,
        locale: &str,
        text: &AppInfoText,
    ) -> Result<LocalizedAppInfo> {
        let mut attributes = serde_json::to_value(text)?;
        attributes["locale"] = json!(locale);

        let body = json!({
            "data": {
                "type": "appInfoLocalizations",
                "attributes": attributes,
                "relationships": {
                    "appInfo": {
                        "data": {
                            "type": "appInfos",
                            "id": app_info_id
                        }
                    }
                }
            }
        });

        let response: SingleResponse<AppInfoLocalizationData> = self
            .request(Method::POST, "/appInfoLocalizations", None, Some(body))
            .await?;
        Ok(response.data.into_domain(app_info_id))
    }

    /// Updates an existing localized name/subtitle record.
    pub async fn update_app_info_localization(
        &self,
        localization_id: &str,
        text: &AppInfoText,
    ) -> Result<()> {
        let body = json!({
            "data": {
                "type": "appInfoLocalizations",
                "id": localization_id,
                "attributes": text
            }
        });

        self.request_empty(
            Method::PATCH,
            &format!("/appInfoLocalizations/{localization_id}"),
            Some(body),
        )
        .await
    }

    // ------------------------------------------------------------------
    // TestFlight
    // ------------------------------------------------------------------

    /// Lists the app's TestFlight builds.
    pub async fn list_builds(&self, app_id: &str) -> Result<Vec<Build>> {
        let response: ListResponse<BuildData> = self
            .request(Method::GET, &format!("/apps/{app_id}/builds"), None, None)
            .await?;
        Ok(response.data.into_iter().map(Into::into).collect())
    }

    /// Lists the app's beta groups.
    pub async fn list_beta_groups(&self, app_id: &str) -> Result<Vec<BetaGroup>> {
        let response: ListResponse<BetaGroupData> = self
            .request(Method::GET, &format!("/apps/{app_id}/betaGroups"), None, None)
            .await?;
        Ok(response.data.into_iter().map(Into::into).collect())
    }

    /// Invites a tester into a beta group by email.
    pub async fn create_beta_invite(&self, beta_group_id: &str, email: &str) -> Result<()> {
        let body = beta_invite_body(beta_group_id, email);
        self.request_empty(Method::POST, "/betaTesterInvitations", Some(body))
            .await
    }
}

/// Relationship body for a beta-tester invitation.
fn beta_invite_body(beta_group_id: &str, email: &str) -> serde_json::Value {
    json!({
        "data": {
            "type": "betaTesterInvitations",
            "relationships": {
                "betaGroup": {
                    "data": { "type": "betaGroups", "id": beta_group_id }
                },
                "betaTester": {
                    "data": { "type": "betaTesters", "attributes": { "email": email } }
                }
            }
        }
    })
}
