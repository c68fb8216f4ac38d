//! In-process identity repository for the dev server and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Account, IdentityRepository, NewAccount, ProviderLink, RepoError};
use crate::oauth2::ProviderKind;

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    links: HashMap<(ProviderKind, String), ProviderLink>,
}

pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityRepository for MemoryRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, RepoError> {
        let mut inner = self.inner.lock().await;
        if inner
            .accounts
            .values()
            .any(|existing| existing.email == account.email)
        {
            return Err(RepoError::Conflict);
        }
        // v7 keeps ids time-ordered, matching what a real backend would do.
        let account = account.into_account(Uuid::now_v7());
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().await;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| RepoError::Unavailable(anyhow::anyhow!("unknown account {id}")))?;
        account.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().await;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| RepoError::Unavailable(anyhow::anyhow!("unknown account {id}")))?;
        account.is_verified = true;
        Ok(())
    }

    async fn find_link(
        &self,
        provider: ProviderKind,
        provider_user_id: &str,
    ) -> Result<Option<ProviderLink>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .links
            .get(&(provider, provider_user_id.to_string()))
            .cloned())
    }

    async fn create_link(&self, link: ProviderLink) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().await;
        let key = (link.provider, link.provider_user_id.clone());
        if inner.links.contains_key(&key) {
            return Err(RepoError::Conflict);
        }
        inner.links.insert(key, link);
        Ok(())
    }
}
