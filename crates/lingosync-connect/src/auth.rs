//! Request signing for the App Store Connect API.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::error::{ConnectError, Result};

/// Token lifetime; the API rejects anything above 20 minutes.
const TOKEN_LIFETIME_MINUTES: i64 = 20;

/// JWT claims for App Store Connect API authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    iat: i64,
    exp: i64,
    aud: String,
}

/// Mints short-lived ES256 bearer tokens from an App Store Connect API key.
///
/// A fresh token is signed for every request; signing is stateless and
/// cheap next to the network round-trip, so there is no cache to invalidate.
pub struct TokenSigner {
    key_id: String,
    issuer_id: String,
    encoding_key: EncodingKey,
}

impl TokenSigner {
    /// Creates a signer from the key id, issuer id, and PEM private key
    /// content.
    pub fn new(
        key_id: impl Into<String>,
        issuer_id: impl Into<String>,
        private_key_pem: &str,
    ) -> Result<Self> {
        let encoding_key = EncodingKey::from_ec_pem(private_key_pem.as_bytes())
            .map_err(|e| ConnectError::InvalidCredentials(format!("invalid API key: {e}")))?;

        Ok(Self {
            key_id: key_id.into(),
            issuer_id: issuer_id.into(),
            encoding_key,
        })
    }

    /// Signs a fresh bearer token.
    pub fn bearer_token(&self) -> Result<String> {
        let now = Utc::now();

        let claims = Claims {
            iss: self.issuer_id.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
            aud: "appstoreconnect-v1".to_string(),
        };

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        Ok(encode(&header, &claims, &self.encoding_key)?)
    }
}
