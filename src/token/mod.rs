//! Access/refresh token lifecycle: issuance, validation, rotation, revocation.
//!
//! Access tokens are stateless HS256 JWTs asserting an account id. Refresh
//! tokens are opaque 32-byte random strings stored under `refresh:{account}`
//! in the credential store. Exactly one refresh token per account is live at
//! a time: issuance overwrites the slot, so a concurrent sign-in or refresh
//! for the same account invalidates every refresh token issued before it.
//! That single-slot trade-off is what makes replay detection a plain string
//! compare: any non-current token presented to [`TokenIssuer::rotate`] is
//! treated as compromise and rejected.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AuthError;
use crate::store::CredentialStore;

pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: u64 = 60 * 60 * 24 * 30;
pub const VERIFICATION_CODE_TTL_SECONDS: u64 = 60 * 60 * 24;

/// Claims carried by an access token. Validity derives purely from the
/// signature and `exp`; access tokens are never looked up in the store.
#[derive(Serialize, Deserialize, Debug)]
pub struct AccessClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token_type: String,
    pub expires_in: i64,
    pub access_token: String,
    pub refresh_token: String,
}

/// Opaque high-entropy refresh token, URL-safe base64 over 32 `OsRng` bytes.
///
/// # Errors
/// Returns an error if the system RNG fails.
pub fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("rng failure: {err}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl: Duration,
    store: Arc<dyn CredentialStore>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(
        secret: &SecretString,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: u64,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            access_ttl_seconds,
            refresh_ttl: Duration::from_secs(refresh_ttl_seconds),
            store,
        }
    }

    #[must_use]
    pub const fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn refresh_key(account_id: Uuid) -> String {
        format!("refresh:{account_id}")
    }

    pub(crate) fn verification_key(account_id: Uuid) -> String {
        format!("verify:{account_id}")
    }

    /// Mint a signed access token alone. Used for email links, where no
    /// refresh token should be rotated as a side effect.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_access(&self, account_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: account_id.to_string(),
            iat: now,
            exp: now + self.access_ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("jwt signing failed: {err}")))
    }

    /// Mint a signed access token plus a fresh refresh token, overwriting any
    /// refresh token previously stored for the account.
    ///
    /// # Errors
    /// Propagates store unavailability as a transient failure.
    pub async fn issue_pair(&self, account_id: Uuid) -> Result<TokenPair, AuthError> {
        let access_token = self.issue_access(account_id)?;
        let refresh_token = generate_refresh_token()?;
        self.store
            .set(
                &Self::refresh_key(account_id),
                &refresh_token,
                self.refresh_ttl,
            )
            .await?;

        Ok(TokenPair {
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_seconds,
            access_token,
            refresh_token,
        })
    }

    /// Exchange the current refresh token for a new pair. The presented token
    /// must equal the stored one exactly; rotation is re-issuance, which
    /// discards the old token by overwrite.
    ///
    /// # Errors
    /// `Unauthenticated` when no token is stored or the presented one is not
    /// current; transient store failures propagate.
    pub async fn rotate(
        &self,
        presented: &str,
        account_id: Uuid,
    ) -> Result<TokenPair, AuthError> {
        let stored = self.store.get(&Self::refresh_key(account_id)).await?;
        match stored {
            Some(current) if current == presented => self.issue_pair(account_id).await,
            _ => Err(AuthError::Unauthenticated),
        }
    }

    /// Drop the refresh token and any pending verification code. Idempotent;
    /// missing keys are fine.
    ///
    /// # Errors
    /// Propagates store unavailability.
    pub async fn revoke(&self, account_id: Uuid) -> Result<(), AuthError> {
        self.store.delete(&Self::refresh_key(account_id)).await?;
        self.store
            .delete(&Self::verification_key(account_id))
            .await?;
        Ok(())
    }

    /// Validate signature and expiry, returning the account id.
    ///
    /// # Errors
    /// `TokenExpired` when only the TTL has elapsed, `InvalidToken` for any
    /// structural or signature problem; callers need the distinction for
    /// 401-vs-re-login UX.
    pub fn verify_access(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation).map_err(
            |err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            },
        )?;
        data.claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Extract the subject from an access token whose TTL may already have
    /// elapsed. The signature is still verified; only expiry is skipped. Used
    /// by the refresh endpoint, where an expired access token is the normal
    /// case.
    ///
    /// # Errors
    /// `InvalidToken` on any structural or signature problem.
    pub fn subject_for_refresh(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        data.claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::Result;

    fn issuer(access_ttl: i64) -> TokenIssuer {
        TokenIssuer::new(
            &SecretString::from("test-secret"),
            access_ttl,
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn issued_access_token_verifies_to_account() -> Result<()> {
        let issuer = issuer(60);
        let account_id = Uuid::now_v7();
        let pair = issuer.issue_pair(account_id).await?;
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 60);
        assert_eq!(issuer.verify_access(&pair.access_token)?, account_id);
        Ok(())
    }

    #[tokio::test]
    async fn rotate_with_current_token_yields_a_new_one() -> Result<()> {
        let issuer = issuer(60);
        let account_id = Uuid::now_v7();
        let first = issuer.issue_pair(account_id).await?;
        let second = issuer.rotate(&first.refresh_token, account_id).await?;
        assert_ne!(first.refresh_token, second.refresh_token);
        let third = issuer.rotate(&second.refresh_token, account_id).await?;
        assert_ne!(second.refresh_token, third.refresh_token);
        Ok(())
    }

    #[tokio::test]
    async fn rotate_rejects_stale_token() -> Result<()> {
        let issuer = issuer(60);
        let account_id = Uuid::now_v7();
        let first = issuer.issue_pair(account_id).await?;
        let _second = issuer.rotate(&first.refresh_token, account_id).await?;
        // The first token lost validity the moment the slot was overwritten.
        let replay = issuer.rotate(&first.refresh_token, account_id).await;
        assert!(matches!(replay, Err(AuthError::Unauthenticated)));
        Ok(())
    }

    #[tokio::test]
    async fn rotate_rejects_arbitrary_string() -> Result<()> {
        let issuer = issuer(60);
        let account_id = Uuid::now_v7();
        issuer.issue_pair(account_id).await?;
        let result = issuer.rotate("not-the-token", account_id).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
        Ok(())
    }

    #[tokio::test]
    async fn revoke_is_idempotent_and_kills_refresh() -> Result<()> {
        let issuer = issuer(60);
        let account_id = Uuid::now_v7();
        let pair = issuer.issue_pair(account_id).await?;
        issuer.revoke(account_id).await?;
        issuer.revoke(account_id).await?;
        let result = issuer.rotate(&pair.refresh_token, account_id).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
        Ok(())
    }

    #[tokio::test]
    async fn expired_access_token_is_distinguished_from_garbage() -> Result<()> {
        let issuer = issuer(-10);
        let account_id = Uuid::now_v7();
        let pair = issuer.issue_pair(account_id).await?;
        assert!(matches!(
            issuer.verify_access(&pair.access_token),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            issuer.verify_access("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn expired_access_token_still_names_subject_for_refresh() -> Result<()> {
        let issuer = issuer(-10);
        let account_id = Uuid::now_v7();
        let pair = issuer.issue_pair(account_id).await?;
        assert_eq!(issuer.subject_for_refresh(&pair.access_token)?, account_id);
        Ok(())
    }

    #[tokio::test]
    async fn subject_for_refresh_still_checks_signature() -> Result<()> {
        let issuer = issuer(60);
        let other = TokenIssuer::new(
            &SecretString::from("different-secret"),
            60,
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            Arc::new(MemoryStore::new()),
        );
        let pair = other.issue_pair(Uuid::now_v7()).await?;
        assert!(matches!(
            issuer.subject_for_refresh(&pair.access_token),
            Err(AuthError::InvalidToken)
        ));
        Ok(())
    }

    #[test]
    fn refresh_tokens_are_high_entropy_and_unique() -> Result<()> {
        let first = generate_refresh_token().map_err(|e| anyhow::anyhow!(e.to_string()))?;
        let second = generate_refresh_token().map_err(|e| anyhow::anyhow!(e.to_string()))?;
        assert_ne!(first, second);
        let decoded = URL_SAFE_NO_PAD.decode(first.as_bytes())?;
        assert_eq!(decoded.len(), 32);
        Ok(())
    }

    #[test]
    fn token_pair_serializes_camel_case() -> Result<()> {
        let pair = TokenPair {
            token_type: "Bearer".to_string(),
            expires_in: 60,
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let value = serde_json::to_value(&pair)?;
        assert_eq!(value["tokenType"], "Bearer");
        assert_eq!(value["expiresIn"], 60);
        assert_eq!(value["accessToken"], "a");
        assert_eq!(value["refreshToken"], "r");
        Ok(())
    }
}
