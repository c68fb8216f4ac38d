//! Per-provider `OAuth2` configuration and authorization-URL construction.
//!
//! The registry is an explicit map from [`ProviderKind`] to a configured
//! client, populated at startup. A kind the operator has not configured is
//! simply absent: lookups answer `NotFound`, so the route behaves as if it
//! does not exist rather than as a disabled feature.

use rand::{RngCore, rngs::OsRng};
use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt::Write as _;
use url::Url;

use super::ProviderKind;
use crate::error::AuthError;

/// Static endpoint table; these never vary per deployment.
pub(crate) struct ProviderEndpoints {
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub profile_url: &'static str,
    pub scopes: &'static [&'static str],
}

pub(crate) const fn endpoints(kind: ProviderKind) -> ProviderEndpoints {
    match kind {
        ProviderKind::Google => ProviderEndpoints {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://www.googleapis.com/oauth2/v4/token",
            profile_url: "https://www.googleapis.com/oauth2/v3/userinfo",
            scopes: &[
                "https://www.googleapis.com/auth/userinfo.email",
                "https://www.googleapis.com/auth/userinfo.profile",
            ],
        },
        ProviderKind::Microsoft => ProviderEndpoints {
            authorize_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            profile_url: "https://graph.microsoft.com/v1.0/me",
            scopes: &["openid", "profile", "email"],
        },
        ProviderKind::Facebook => ProviderEndpoints {
            authorize_url: "https://facebook.com/v9.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v9.0/oauth/access_token",
            profile_url: "https://graph.facebook.com/v16.0/me?fields=email,name",
            scopes: &["email", "public_profile"],
        },
        ProviderKind::Github => ProviderEndpoints {
            authorize_url: "https://github.com/login/oauth/authorize",
            token_url: "https://github.com/login/oauth/access_token",
            profile_url: "https://api.github.com/user",
            scopes: &["user:email", "read:user"],
        },
    }
}

/// Client id/secret pair from configuration. A provider is enabled only when
/// the operator supplied both.
#[derive(Debug)]
pub struct ClientCredentials {
    pub id: String,
    pub secret: SecretString,
}

/// Fresh CSRF state: 16 random bytes, hex-encoded. One per authorization
/// attempt; the returned value is the only thing the callback may trust.
///
/// # Errors
/// Returns an error if the system RNG fails.
pub fn generate_state() -> Result<String, AuthError> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("rng failure: {err}")))?;
    let mut state = String::with_capacity(32);
    for byte in bytes {
        let _ = write!(state, "{byte:02x}");
    }
    Ok(state)
}

pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// One configured provider: endpoints plus the deployment's client identity
/// and the callback URL that routes the provider back to us.
pub struct ProviderClient {
    kind: ProviderKind,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

impl ProviderClient {
    #[must_use]
    pub fn new(kind: ProviderKind, credentials: ClientCredentials, base_url: &str) -> Self {
        // The provider name is embedded in the redirect so callbacks can be
        // routed back to the right provider handler.
        let redirect_uri = format!(
            "{}/api/auth/ext/{}/callback",
            base_url.trim_end_matches('/'),
            kind
        );
        Self {
            kind,
            client_id: credentials.id,
            client_secret: credentials.secret,
            redirect_uri,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        self.kind
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) const fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Build the provider's authorize URL with a fresh state.
    ///
    /// # Errors
    /// Returns an error if the RNG fails or the static endpoint cannot parse
    /// (which would be a programming error caught by the tests below).
    pub fn new_authorization(&self) -> Result<AuthorizationRequest, AuthError> {
        let state = generate_state()?;
        let table = endpoints(self.kind);
        let mut url = Url::parse(table.authorize_url)
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("bad authorize URL: {err}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &table.scopes.join(" "))
            .append_pair("state", &state);
        Ok(AuthorizationRequest {
            url: url.to_string(),
            state,
        })
    }
}

/// Enabled providers, keyed by kind. Built once at startup from config.
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, ProviderClient>,
}

impl ProviderRegistry {
    /// Build the registry from whichever credential pairs the operator set.
    #[must_use]
    pub fn new(
        base_url: &str,
        credentials: Vec<(ProviderKind, ClientCredentials)>,
    ) -> Self {
        let providers = credentials
            .into_iter()
            .map(|(kind, creds)| (kind, ProviderClient::new(kind, creds, base_url)))
            .collect();
        Self { providers }
    }

    /// Look up a configured provider.
    ///
    /// # Errors
    /// `NotFound` for unconfigured kinds, deliberately indistinguishable
    /// from a route that does not exist.
    pub fn get(&self, kind: ProviderKind) -> Result<&ProviderClient, AuthError> {
        self.providers.get(&kind).ok_or(AuthError::NotFound)
    }

    #[must_use]
    pub fn enabled(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds
    }
}
