//! Authorization-code flow orchestration.
//!
//! One login attempt walks `start` → provider redirect → `handle_callback`:
//! state validation, code-for-token exchange, profile fetch, normalization.
//! Issued states live in the credential store as individual
//! `oauthstate:{state}` entries (value = provider kind) and are consumed on
//! use, so two tabs racing through the same provider each keep a working
//! state. A failed attempt is simply abandoned; nothing persists beyond the
//! consumed state entry.

use reqwest::{Client, header::ACCEPT};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::provider::{ProviderRegistry, endpoints};
use super::{NormalizedProfile, ProviderKind};
use crate::APP_USER_AGENT;
use crate::error::AuthError;
use crate::store::CredentialStore;

pub const DEFAULT_STATE_TTL_SECONDS: u64 = 10 * 60;

pub struct Federation {
    registry: ProviderRegistry,
    store: Arc<dyn CredentialStore>,
    http: Client,
    state_ttl: Duration,
}

impl Federation {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        registry: ProviderRegistry,
        store: Arc<dyn CredentialStore>,
        state_ttl_seconds: u64,
    ) -> Result<Self, AuthError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("http client: {err}")))?;
        Ok(Self {
            registry,
            store,
            http,
            state_ttl: Duration::from_secs(state_ttl_seconds),
        })
    }

    #[must_use]
    pub const fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn state_key(state: &str) -> String {
        format!("oauthstate:{state}")
    }

    /// Begin an authorization attempt: generate state, record it, return the
    /// provider's authorize URL to redirect the user to.
    ///
    /// # Errors
    /// `NotFound` for unconfigured providers; store failures propagate.
    pub async fn start(&self, kind: ProviderKind) -> Result<String, AuthError> {
        let client = self.registry.get(kind)?;
        let authorization = client.new_authorization()?;
        self.store
            .set(
                &Self::state_key(&authorization.state),
                kind.as_str(),
                self.state_ttl,
            )
            .await?;
        info!(provider = %kind, "authorization attempt started");
        Ok(authorization.url)
    }

    /// Complete the attempt: consume the state, exchange the code, fetch and
    /// normalize the profile.
    ///
    /// # Errors
    /// `InvalidState` before any outbound call when the state is unknown,
    /// expired, or bound to a different provider; `UpstreamAuth` when the
    /// provider rejects the exchange or the profile fetch.
    pub async fn handle_callback(
        &self,
        kind: ProviderKind,
        code: &str,
        state: &str,
    ) -> Result<NormalizedProfile, AuthError> {
        let client = self.registry.get(kind)?;

        // CSRF check first; the code is not touched unless the state proves
        // this callback belongs to an attempt we started. The entry is only
        // consumed once the kind matches, so a callback aimed at the wrong
        // provider leaves the real attempt's state intact.
        let key = Self::state_key(state);
        match self.store.get(&key).await? {
            Some(ref bound) if bound == kind.as_str() => {
                self.store.delete(&key).await?;
            }
            _ => {
                info!(provider = %kind, "callback with unknown or mismatched state");
                return Err(AuthError::InvalidState);
            }
        }

        let access_token = self.exchange_code(client, code).await?;
        let profile = self.fetch_profile(kind, &access_token).await?;
        info!(provider = %kind, "authorization attempt completed");
        Ok(profile)
    }

    async fn exchange_code(
        &self,
        client: &super::ProviderClient,
        code: &str,
    ) -> Result<String, AuthError> {
        let table = endpoints(client.kind());
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", client.redirect_uri()),
            ("client_id", client.client_id()),
            ("client_secret", client.client_secret().expose_secret()),
        ];

        let response = self
            .http
            .post(table.token_url)
            // GitHub answers with form-encoding unless JSON is requested.
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|err| AuthError::UpstreamAuth(format!("token exchange failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = %client.kind(), %status, "token exchange rejected: {body}");
            return Err(AuthError::UpstreamAuth(body));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|err| AuthError::UpstreamAuth(format!("invalid token response: {err}")))?;
        json["access_token"].as_str().map_or_else(
            || {
                error!(provider = %client.kind(), "token response without access_token");
                Err(AuthError::UpstreamAuth(
                    "no access token in response".to_string(),
                ))
            },
            |token| Ok(token.to_string()),
        )
    }

    async fn fetch_profile(
        &self,
        kind: ProviderKind,
        access_token: &str,
    ) -> Result<NormalizedProfile, AuthError> {
        let table = endpoints(kind);
        let response = self
            .http
            .get(table.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| AuthError::UpstreamAuth(format!("profile fetch failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = %kind, %status, "profile fetch rejected: {body}");
            return Err(AuthError::UpstreamAuth(body));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|err| AuthError::UpstreamAuth(format!("invalid profile response: {err}")))?;
        normalize_profile(kind, &data)
    }
}

/// Flatten provider-specific field names into the uniform profile shape.
pub(crate) fn normalize_profile(
    kind: ProviderKind,
    data: &Value,
) -> Result<NormalizedProfile, AuthError> {
    let missing = |field: &str| {
        AuthError::UpstreamAuth(format!("profile missing {field} for {kind}"))
    };

    let (provider_user_id, display_name, email) = match kind {
        ProviderKind::Google => (
            data["sub"].as_str().ok_or_else(|| missing("sub"))?.to_string(),
            data["name"].as_str().unwrap_or_default().to_string(),
            data["email"].as_str().ok_or_else(|| missing("email"))?.to_string(),
        ),
        ProviderKind::Microsoft => (
            data["id"].as_str().ok_or_else(|| missing("id"))?.to_string(),
            data["displayName"].as_str().unwrap_or_default().to_string(),
            data["mail"]
                .as_str()
                .or_else(|| data["userPrincipalName"].as_str())
                .ok_or_else(|| missing("mail"))?
                .to_string(),
        ),
        ProviderKind::Facebook => (
            data["id"].as_str().ok_or_else(|| missing("id"))?.to_string(),
            data["name"].as_str().unwrap_or_default().to_string(),
            data["email"].as_str().ok_or_else(|| missing("email"))?.to_string(),
        ),
        ProviderKind::Github => {
            // GitHub ids are numeric; names may be unset, the login is not.
            let id = data["id"]
                .as_i64()
                .map(|id| id.to_string())
                .or_else(|| data["id"].as_str().map(str::to_string))
                .ok_or_else(|| missing("id"))?;
            let name = data["name"]
                .as_str()
                .or_else(|| data["login"].as_str())
                .unwrap_or_default()
                .to_string();
            let email = data["email"]
                .as_str()
                .ok_or_else(|| missing("email"))?
                .to_string();
            (id, name, email)
        }
    };

    Ok(NormalizedProfile {
        provider_user_id,
        email,
        display_name,
    })
}
