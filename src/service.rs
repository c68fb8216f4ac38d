//! Authentication service façade.
//!
//! Every credential-bearing operation goes through here; handlers only
//! translate HTTP to these calls and back. Sign-in failures collapse to a
//! single `Unauthenticated` so responses never reveal whether the email or
//! the password was wrong.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::account::{Account, IdentityRepository, NewAccount};
use crate::error::AuthError;
use crate::mail::{MailMessage, MailTransport};
use crate::password;
use crate::token::{TokenIssuer, TokenPair, VERIFICATION_CODE_TTL_SECONDS};
use crate::store::CredentialStore;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Validated-at-the-door registration input. Email is normalized to
/// lowercase before any lookup or insert.
#[derive(Clone, Debug)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: SecretString,
}

pub struct AuthService {
    repo: Arc<dyn IdentityRepository>,
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    mailer: Arc<dyn MailTransport>,
    client_url: String,
}

impl AuthService {
    #[must_use]
    pub fn new(
        repo: Arc<dyn IdentityRepository>,
        store: Arc<dyn CredentialStore>,
        issuer: TokenIssuer,
        mailer: Arc<dyn MailTransport>,
        client_url: &str,
    ) -> Self {
        Self {
            repo,
            store,
            issuer,
            mailer,
            client_url: client_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub const fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a local account. The account starts unverified; verification
    /// is a separate authenticated step.
    ///
    /// # Errors
    /// `InvalidInput` on malformed email or weak password, `AlreadyExists`
    /// when the email is taken.
    pub async fn sign_up(&self, registration: Registration) -> Result<Account, AuthError> {
        let email = normalize_email(&registration.email)?;
        let password = registration.password.expose_secret();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        if registration.first_name.trim().is_empty() {
            return Err(AuthError::InvalidInput(
                "First name must not be empty".to_string(),
            ));
        }

        let account = self
            .repo
            .create(NewAccount {
                email,
                first_name: registration.first_name.trim().to_string(),
                last_name: registration.last_name.trim().to_string(),
                password_hash: password::hash(password)?,
                is_verified: false,
            })
            .await?;
        info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// # Errors
    /// `Unauthenticated` on any credential failure, with no distinction
    /// between unknown email and wrong password.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<TokenPair, AuthError> {
        let email = normalize_email(email)?;
        let Some(account) = self.repo.find_by_email(&email).await? else {
            return Err(AuthError::Unauthenticated);
        };
        if !password::verify(password.expose_secret(), &account.password_hash) {
            return Err(AuthError::Unauthenticated);
        }
        info!(account_id = %account.id, "sign-in");
        self.issuer.issue_pair(account.id).await
    }

    /// Email a password-reset link. The link carries the access token of a
    /// freshly issued pair; issuing the pair overwrites the account's refresh
    /// slot, so a pending reset invalidates the current session's refresh
    /// token.
    ///
    /// # Errors
    /// `NotFound` for unknown emails, `Mail` when delivery fails.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email)?;
        let Some(account) = self.repo.find_by_email(&email).await? else {
            warn!("password reset requested for unknown email");
            return Err(AuthError::NotFound);
        };
        let pair = self.issuer.issue_pair(account.id).await?;
        let token = pair.access_token;
        let link = format!("{}/reset-password?token={token}", self.client_url);
        self.mailer
            .send(&MailMessage {
                to: account.email.clone(),
                subject: "Reset your password".to_string(),
                html_body: format!(
                    "<p>Hi {},</p><p>Reset your password here: <a href=\"{link}\">{link}</a></p>",
                    account.first_name
                ),
            })
            .map_err(AuthError::Mail)?;
        info!(account_id = %account.id, "password reset email sent");
        Ok(())
    }

    /// Send a verification email to the authenticated account. The code is a
    /// UUID v4 kept under `verify:{account_id}` for 24 hours; re-sending
    /// replaces it.
    ///
    /// # Errors
    /// `AlreadyVerified` when there is nothing to verify.
    pub async fn verify_email(&self, account_id: Uuid) -> Result<(), AuthError> {
        let account = self.require_account(account_id).await?;
        if account.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let code = Uuid::new_v4().to_string();
        self.store
            .set(
                &TokenIssuer::verification_key(account_id),
                &code,
                Duration::from_secs(VERIFICATION_CODE_TTL_SECONDS),
            )
            .await?;

        let token = self.issuer.issue_access(account_id)?;
        let link = format!(
            "{}/verify-email?token={token}&code={code}",
            self.client_url
        );
        self.mailer
            .send(&MailMessage {
                to: account.email.clone(),
                subject: "Verify your email".to_string(),
                html_body: format!(
                    "<p>Hi {},</p><p>Confirm your address here: <a href=\"{link}\">{link}</a></p>",
                    account.first_name
                ),
            })
            .map_err(AuthError::Mail)?;
        info!(%account_id, "verification email sent");
        Ok(())
    }

    /// Confirm the emailed code. The stored code survives a mismatch and is
    /// consumed on success.
    ///
    /// # Errors
    /// `InvalidCode` on mismatch or when no code is pending.
    pub async fn confirm_email(&self, account_id: Uuid, code: &str) -> Result<(), AuthError> {
        let key = TokenIssuer::verification_key(account_id);
        match self.store.get(&key).await? {
            Some(stored) if stored == code => {}
            _ => return Err(AuthError::InvalidCode),
        }
        self.repo.mark_verified(account_id).await?;
        self.store.delete(&key).await?;
        info!(%account_id, "email verified");
        Ok(())
    }

    /// # Errors
    /// `Unauthenticated` when the current password does not verify,
    /// `InvalidInput` when the new password equals the current one or is too
    /// weak.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), AuthError> {
        let account = self.require_account(account_id).await?;
        if !password::verify(current.expose_secret(), &account.password_hash) {
            return Err(AuthError::Unauthenticated);
        }
        // Plaintext comparison: hashes of equal passwords differ by salt.
        if new.expose_secret() == current.expose_secret() {
            return Err(AuthError::InvalidInput(
                "New password must differ from the current one".to_string(),
            ));
        }
        if new.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let hash = password::hash(new.expose_secret())?;
        self.repo.update_password(account_id, &hash).await?;
        info!(%account_id, "password changed");
        Ok(())
    }

    /// Exchange the current refresh token for a fresh pair. The account id
    /// comes from the access token's signature; its expiry is ignored, since
    /// refreshing an expired session is the normal case.
    ///
    /// # Errors
    /// `InvalidToken` on a bad access token, `Unauthenticated` when the
    /// refresh token is not the current one.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, AuthError> {
        let account_id = self.issuer.subject_for_refresh(access_token)?;
        self.issuer.rotate(refresh_token, account_id).await
    }

    /// Drop the session server-side. Idempotent: logging out twice, or with
    /// no live session, succeeds.
    ///
    /// # Errors
    /// Propagates store unavailability.
    pub async fn logout(&self, account_id: Uuid) -> Result<(), AuthError> {
        self.issuer.revoke(account_id).await?;
        info!(%account_id, "logout");
        Ok(())
    }

    /// # Errors
    /// `NotFound` when the token's subject no longer exists.
    pub async fn profile(&self, account_id: Uuid) -> Result<Account, AuthError> {
        self.require_account(account_id).await
    }

    async fn require_account(&self, account_id: Uuid) -> Result<Account, AuthError> {
        self.repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    // One local part, one domain with a dot, no whitespace. Deliverability
    // is proven by the verification email, not the syntax check.
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern")
    });
    let email = email.trim().to_lowercase();
    if pattern.is_match(&email) {
        Ok(email)
    } else {
        Err(AuthError::InvalidInput("Invalid email address".to_string()))
    }
}
