//! Caller identity: resolve a bearer token to a stable user key.
//!
//! The token is exchanged once for the caller's profile (`mail`, falling
//! back to `userPrincipalName`). Resolutions are cached by
//! `SHA256(token)` so the raw token is never kept in memory. When the
//! profile lookup fails the caller still gets a stable key,
//! `token-{first 12 hex chars of the digest}`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::IdentityConfig;
use crate::error::AppError;

const ANONYMOUS: &str = "anonymous";
const TOKEN_KEY_HEX: usize = 12;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    mail: Option<String>,
    user_principal_name: Option<String>,
}

impl Profile {
    fn key(self) -> Option<String> {
        self.mail
            .into_iter()
            .chain(self.user_principal_name)
            .map(|v| v.trim().to_lowercase())
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug)]
pub struct IdentityResolver {
    client: Client,
    profile_url: String,
    resolved: Mutex<HashMap<String, String>>,
}

impl IdentityResolver {
    pub fn new(config: &IdentityConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Comms(format!("identity client: {e}")))?;
        Ok(Self { client, profile_url: config.profile_url.clone(), resolved: Mutex::new(HashMap::new()) })
    }

    /// User key for a request: the token's profile when a token is present,
    /// otherwise the caller-supplied id, otherwise `"anonymous"`.
    pub async fn resolve(&self, bearer: Option<&str>, user_id: Option<&str>) -> String {
        if let Some(token) = bearer.map(str::trim).filter(|t| !t.is_empty()) {
            return self.resolve_token(token).await;
        }
        match user_id.map(str::trim).filter(|u| !u.is_empty()) {
            Some(user_id) => user_id.to_string(),
            None => ANONYMOUS.to_string(),
        }
    }

    pub async fn resolve_token(&self, token: &str) -> String {
        let digest = hex::encode(Sha256::digest(token.as_bytes()));
        if let Some(hit) = self.lock().get(&digest) {
            return hit.clone();
        }

        let key = match self.fetch_profile(token).await {
            Ok(Some(key)) => key,
            Ok(None) => {
                debug!("profile carried no usable address");
                format!("token-{}", &digest[..TOKEN_KEY_HEX])
            }
            Err(e) => {
                warn!(error = %e, "profile lookup failed; using token digest");
                format!("token-{}", &digest[..TOKEN_KEY_HEX])
            }
        };
        self.lock().insert(digest, key.clone());
        key
    }

    async fn fetch_profile(&self, token: &str) -> Result<Option<String>, reqwest::Error> {
        let profile: Profile = self
            .client
            .get(&self.profile_url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(profile.key())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
