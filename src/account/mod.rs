//! Account and provider-link model plus the repository seam.
//!
//! The repository is a trait so the façade and the linker never know which
//! backing storage is in play; the in-memory implementation serves the dev
//! server and the test suite.

pub mod linker;
pub mod memory;

pub use linker::AccountLinker;
pub use memory::MemoryRepository;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AuthError;
use crate::oauth2::ProviderKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// An account row. The password hash never leaves the process: it is skipped
/// on serialization, so no handler can leak it by accident.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_verified: bool,
    pub role: Role,
}

/// Input for account creation; the repository assigns the id.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_verified: bool,
}

impl NewAccount {
    pub(crate) fn into_account(self, id: Uuid) -> Account {
        Account {
            id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            is_verified: self.is_verified,
            role: Role::User,
        }
    }
}

/// Binding between an external identity and a local account. The pair
/// (provider, `provider_user_id`) is unique; one account may carry a link per
/// provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderLink {
    pub provider: ProviderKind,
    pub provider_user_id: String,
    pub account_id: Uuid,
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// Unique constraint hit: duplicate email or duplicate provider link.
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl From<RepoError> for AuthError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict => Self::AlreadyExists,
            RepoError::Unavailable(source) => Self::Repository(source),
        }
    }
}

/// Storage seam for accounts and provider links.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError>;
    /// # Errors
    /// `Conflict` when the email is already taken.
    async fn create(&self, account: NewAccount) -> Result<Account, RepoError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError>;
    async fn mark_verified(&self, id: Uuid) -> Result<(), RepoError>;
    async fn find_link(
        &self,
        provider: ProviderKind,
        provider_user_id: &str,
    ) -> Result<Option<ProviderLink>, RepoError>;
    /// # Errors
    /// `Conflict` when the (provider, user id) pair is already linked.
    async fn create_link(&self, link: ProviderLink) -> Result<(), RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn serialized_account_never_carries_the_hash() -> Result<()> {
        let account = Account {
            id: Uuid::now_v7(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            is_verified: true,
            role: Role::User,
        };
        let value = serde_json::to_value(&account)?;
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "ada@example.com");
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["isVerified"], true);
        assert_eq!(value["role"], "user");
        Ok(())
    }

    #[test]
    fn conflict_maps_to_already_exists() {
        let err: AuthError = RepoError::Conflict.into();
        assert!(matches!(err, AuthError::AlreadyExists));
    }
}
