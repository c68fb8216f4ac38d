//! Find-or-create for federated sign-in.
//!
//! Email is the join key: a provider profile whose email matches an existing
//! account attaches to it instead of minting a duplicate. Accounts created
//! here are born verified (the provider vouched for the email) and carry the
//! unusable-password sentinel until the user sets one.

use std::sync::Arc;
use tracing::info;

use super::{Account, IdentityRepository, NewAccount, ProviderLink, RepoError};
use crate::error::AuthError;
use crate::oauth2::{NormalizedProfile, ProviderKind};
use crate::password::UNUSABLE_PASSWORD;

pub struct AccountLinker {
    repo: Arc<dyn IdentityRepository>,
}

impl AccountLinker {
    #[must_use]
    pub fn new(repo: Arc<dyn IdentityRepository>) -> Self {
        Self { repo }
    }

    /// Resolve a normalized provider profile to a local account, creating the
    /// account and/or the provider link as needed. Idempotent: a second
    /// callback with the same profile returns the same account.
    ///
    /// # Errors
    /// Repository failures propagate as transient errors.
    pub async fn find_or_create(
        &self,
        provider: ProviderKind,
        profile: &NormalizedProfile,
    ) -> Result<Account, AuthError> {
        let email = profile.email.trim().to_lowercase();

        if let Some(account) = self.repo.find_by_email(&email).await? {
            self.ensure_link(provider, profile, account.id).await?;
            return Ok(account);
        }

        let (first_name, last_name) = split_display_name(&profile.display_name);
        let created = self
            .repo
            .create(NewAccount {
                email: email.clone(),
                first_name,
                last_name,
                password_hash: UNUSABLE_PASSWORD.to_string(),
                is_verified: true,
            })
            .await;

        let account = match created {
            Ok(account) => {
                info!(provider = %provider, account_id = %account.id, "federated account created");
                account
            }
            // Lost a create race: someone registered the email between our
            // lookup and insert. Their row wins; we link to it.
            Err(RepoError::Conflict) => self
                .repo
                .find_by_email(&email)
                .await?
                .ok_or_else(|| {
                    AuthError::Repository(anyhow::anyhow!(
                        "account conflicted on create yet absent on re-read"
                    ))
                })?,
            Err(err) => return Err(err.into()),
        };

        self.ensure_link(provider, profile, account.id).await?;
        Ok(account)
    }

    async fn ensure_link(
        &self,
        provider: ProviderKind,
        profile: &NormalizedProfile,
        account_id: uuid::Uuid,
    ) -> Result<(), AuthError> {
        if self
            .repo
            .find_link(provider, &profile.provider_user_id)
            .await?
            .is_some()
        {
            return Ok(());
        }
        let result = self
            .repo
            .create_link(ProviderLink {
                provider,
                provider_user_id: profile.provider_user_id.clone(),
                account_id,
            })
            .await;
        match result {
            Ok(()) => {
                info!(provider = %provider, %account_id, "provider link attached");
                Ok(())
            }
            // Concurrent callback attached it first; same outcome.
            Err(RepoError::Conflict) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn split_display_name(display_name: &str) -> (String, String) {
    let trimmed = display_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::MemoryRepository;
    use anyhow::Result;

    fn profile(id: &str, email: &str, name: &str) -> NormalizedProfile {
        NormalizedProfile {
            provider_user_id: id.to_string(),
            email: email.to_string(),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn unknown_profile_creates_verified_account_with_link() -> Result<()> {
        let repo = Arc::new(MemoryRepository::new());
        let linker = AccountLinker::new(repo.clone());
        let account = linker
            .find_or_create(
                ProviderKind::Google,
                &profile("108", "Ada@Example.com", "Ada King Lovelace"),
            )
            .await?;
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.first_name, "Ada");
        assert_eq!(account.last_name, "King Lovelace");
        assert!(account.is_verified);
        assert_eq!(account.password_hash, UNUSABLE_PASSWORD);
        let link = repo.find_link(ProviderKind::Google, "108").await?;
        assert_eq!(link.map(|l| l.account_id), Some(account.id));
        Ok(())
    }

    #[tokio::test]
    async fn matching_email_links_to_existing_account() -> Result<()> {
        let repo = Arc::new(MemoryRepository::new());
        let existing = repo
            .create(NewAccount {
                email: "ada@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                password_hash: "$argon2id$hash".to_string(),
                is_verified: false,
            })
            .await?;
        let linker = AccountLinker::new(repo.clone());
        let account = linker
            .find_or_create(ProviderKind::Github, &profile("583231", "ada@example.com", "ada"))
            .await?;
        assert_eq!(account.id, existing.id);
        // The existing credentials are untouched.
        assert_eq!(account.password_hash, "$argon2id$hash");
        let link = repo.find_link(ProviderKind::Github, "583231").await?;
        assert_eq!(link.map(|l| l.account_id), Some(existing.id));
        Ok(())
    }

    #[tokio::test]
    async fn repeated_callback_is_idempotent() -> Result<()> {
        let repo = Arc::new(MemoryRepository::new());
        let linker = AccountLinker::new(repo);
        let p = profile("108", "ada@example.com", "Ada Lovelace");
        let first = linker.find_or_create(ProviderKind::Google, &p).await?;
        let second = linker.find_or_create(ProviderKind::Google, &p).await?;
        assert_eq!(first.id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn two_providers_share_one_account_by_email() -> Result<()> {
        let repo = Arc::new(MemoryRepository::new());
        let linker = AccountLinker::new(repo.clone());
        let via_google = linker
            .find_or_create(ProviderKind::Google, &profile("108", "ada@example.com", "Ada Lovelace"))
            .await?;
        let via_github = linker
            .find_or_create(ProviderKind::Github, &profile("583231", "ada@example.com", "ada"))
            .await?;
        assert_eq!(via_google.id, via_github.id);
        assert!(repo.find_link(ProviderKind::Google, "108").await?.is_some());
        assert!(repo.find_link(ProviderKind::Github, "583231").await?.is_some());
        Ok(())
    }

    #[test]
    fn single_word_display_name_becomes_first_name() {
        assert_eq!(split_display_name("ada"), ("ada".to_string(), String::new()));
        assert_eq!(
            split_display_name("  Ada   Lovelace "),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(split_display_name(""), (String::new(), String::new()));
    }
}
