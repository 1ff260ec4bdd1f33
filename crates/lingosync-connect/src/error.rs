//! Connect client error types.

use thiserror::Error;

/// Text the API embeds in the error body when an app does not list the
/// requested language. There is no machine-readable code for this case, so
/// the body text is the only available discriminator.
const UNSUPPORTED_LOCALE_MARKER: &str = "The language specified is not listed for localization";

/// Errors from the App Store Connect client.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Credentials could not be loaded or used for signing.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Non-2xx response from the API, with the raw error body.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// A resource was missing from an otherwise successful response.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT signing error.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ConnectError {
    /// True for concurrent-edit conflicts: the API rejected a write because
    /// the target resource already exists or changed underneath the caller.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ConnectError::Api { status: 409, .. })
    }

    /// True when the store rejected a locale the app does not list.
    ///
    /// Classified by matching the error body text, since the API offers no
    /// stable error code for this case.
    pub fn is_unsupported_locale(&self) -> bool {
        matches!(self, ConnectError::Api { body, .. } if body.contains(UNSUPPORTED_LOCALE_MARKER))
    }
}

/// Result type for connect operations.
pub type Result<T> = std::result::Result<T, ConnectError>;
