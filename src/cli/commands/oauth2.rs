use anyhow::{Result, bail};
use clap::{Arg, Command};
use secrecy::SecretString;

use crate::oauth2::{ClientCredentials, ProviderKind};

const fn id_arg(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Google => "google-client-id",
        ProviderKind::Microsoft => "microsoft-client-id",
        ProviderKind::Facebook => "facebook-client-id",
        ProviderKind::Github => "github-client-id",
    }
}

const fn secret_arg(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Google => "google-client-secret",
        ProviderKind::Microsoft => "microsoft-client-secret",
        ProviderKind::Facebook => "facebook-client-secret",
        ProviderKind::Github => "github-client-secret",
    }
}

const fn id_env(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Google => "ENTRADA_GOOGLE_CLIENT_ID",
        ProviderKind::Microsoft => "ENTRADA_MICROSOFT_CLIENT_ID",
        ProviderKind::Facebook => "ENTRADA_FACEBOOK_CLIENT_ID",
        ProviderKind::Github => "ENTRADA_GITHUB_CLIENT_ID",
    }
}

const fn secret_env(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Google => "ENTRADA_GOOGLE_CLIENT_SECRET",
        ProviderKind::Microsoft => "ENTRADA_MICROSOFT_CLIENT_SECRET",
        ProviderKind::Facebook => "ENTRADA_FACEBOOK_CLIENT_SECRET",
        ProviderKind::Github => "ENTRADA_GITHUB_CLIENT_SECRET",
    }
}

pub fn with_args(mut command: Command) -> Command {
    for kind in ProviderKind::ALL {
        command = command
            .arg(
                Arg::new(id_arg(kind))
                    .long(id_arg(kind))
                    .help("OAuth2 client id")
                    .env(id_env(kind)),
            )
            .arg(
                Arg::new(secret_arg(kind))
                    .long(secret_arg(kind))
                    .help("OAuth2 client secret")
                    .env(secret_env(kind)),
            );
    }
    command
}

/// Collect the provider credentials the operator configured. A provider needs
/// both halves; a lone id or secret is a configuration mistake, not a
/// silently disabled provider.
///
/// # Errors
/// Returns an error when only one half of a credential pair is set.
pub fn parse(matches: &clap::ArgMatches) -> Result<Vec<(ProviderKind, ClientCredentials)>> {
    let mut credentials = Vec::new();
    for kind in ProviderKind::ALL {
        let id = matches.get_one::<String>(id_arg(kind)).cloned();
        let secret = matches.get_one::<String>(secret_arg(kind)).cloned();
        match (id, secret) {
            (Some(id), Some(secret)) => credentials.push((
                kind,
                ClientCredentials {
                    id,
                    secret: SecretString::from(secret),
                },
            )),
            (None, None) => {}
            _ => bail!(
                "provider {kind} needs both --{} and --{}",
                id_arg(kind),
                secret_arg(kind)
            ),
        }
    }
    Ok(credentials)
}
