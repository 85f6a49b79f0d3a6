use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::credential::StoredCredential;
use crate::error::AuthError;
use crate::store::CredentialStore;

const DEFAULT_TOKEN_MINT_URL: &str = "https://api.github.com/copilot_internal/v2/token";
const USER_AGENT: &str = concat!("copilot-auth/", env!("CARGO_PKG_VERSION"));

/// Exchanges a long-lived identity token for a short-lived Copilot access
/// token and writes the result back to the credential store.
pub struct AccessTokenRefresher {
    client: reqwest::Client,
    token_mint_url: String,
}

impl Default for AccessTokenRefresher {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessTokenRefresher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            token_mint_url: DEFAULT_TOKEN_MINT_URL.to_string(),
        }
    }

    pub fn with_token_mint_url(mut self, url: impl Into<String>) -> Self {
        self.token_mint_url = url.into();
        self
    }

    /// Mint a fresh access token with `identity_token` as the bearer
    /// credential.
    ///
    /// On success the store receives a whole-record save that preserves the
    /// given identity token and replaces only the access fields.
    /// 401 means the identity token itself must be re-obtained; 403 means
    /// the account lacks entitlement and re-authenticating will not help.
    pub async fn refresh(
        &self,
        identity_token: &str,
        store: &dyn CredentialStore,
    ) -> Result<String, AuthError> {
        let resp = self
            .client
            .get(&self.token_mint_url)
            .header("Accept", "application/json")
            .header("Authorization", format!("token {identity_token}"))
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::IdentityTokenInvalid);
        }
        if status == StatusCode::FORBIDDEN {
            return Err(AuthError::AccessForbidden);
        }
        if !status.is_success() {
            return Err(AuthError::Protocol(format!(
                "access token mint failed with status {status}"
            )));
        }
        let payload: TokenMintResponse = resp
            .json()
            .await
            .map_err(|err| AuthError::Protocol(format!("malformed mint response: {err}")))?;
        store.save(&StoredCredential {
            identity_token: identity_token.to_string(),
            access_token: payload.token.clone(),
            access_token_expires_at: payload.expires_at,
        })?;
        debug!(expires_at = payload.expires_at, "access token refreshed");
        Ok(payload.token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenMintResponse {
    token: String,
    /// Unix seconds.
    expires_at: i64,
}
