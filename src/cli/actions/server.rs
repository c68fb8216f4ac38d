use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};

use crate::account::{AccountLinker, MemoryRepository};
use crate::api::{self, AppState};
use crate::mail::LogMailer;
use crate::oauth2::{ClientCredentials, Federation, ProviderKind, ProviderRegistry};
use crate::service::AuthService;
use crate::store::{CredentialStore, MemoryStore};
use crate::token::TokenIssuer;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub base_url: String,
    pub web_url: String,
    pub client_url: String,
    pub token_secret: SecretString,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: u64,
    pub state_ttl_seconds: u64,
    pub provider_credentials: Vec<(ProviderKind, ClientCredentials)>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
    let repo = Arc::new(MemoryRepository::new());

    let issuer = TokenIssuer::new(
        &args.token_secret,
        args.access_ttl_seconds,
        args.refresh_ttl_seconds,
        store.clone(),
    );

    let registry = ProviderRegistry::new(&args.base_url, args.provider_credentials);
    let enabled = registry.enabled();
    if enabled.is_empty() {
        warn!("No OAuth2 providers configured; federated sign-in is disabled");
    } else {
        info!(?enabled, "OAuth2 providers configured");
    }
    let federation = Federation::new(registry, store.clone(), args.state_ttl_seconds)
        .map_err(|err| anyhow::anyhow!("failed to build federation client: {err}"))?;

    let service = AuthService::new(
        repo.clone(),
        store.clone(),
        issuer,
        Arc::new(LogMailer),
        &args.client_url,
    );
    let linker = AccountLinker::new(repo);

    let state = Arc::new(AppState {
        service,
        federation,
        linker,
        store,
        web_url: args.web_url,
    });

    api::serve(args.port, state).await
}
