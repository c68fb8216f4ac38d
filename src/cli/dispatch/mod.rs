//! Command-line argument dispatch and server initialization.
//!
//! Parses validated CLI matches into the server action with its full
//! configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, oauth2};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let auth_opts = auth::Options::parse(matches)?;
    let provider_credentials = oauth2::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        base_url: auth_opts.base_url,
        web_url: auth_opts.web_url,
        client_url: auth_opts.client_url,
        token_secret: auth_opts.token_secret,
        access_ttl_seconds: auth_opts.access_ttl_seconds,
        refresh_ttl_seconds: auth_opts.refresh_ttl_seconds,
        state_ttl_seconds: auth_opts.state_ttl_seconds,
        provider_credentials,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth2::ProviderKind;

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("ENTRADA_GOOGLE_CLIENT_ID", Some("google-id")),
                ("ENTRADA_GOOGLE_CLIENT_SECRET", Some("google-secret")),
                ("ENTRADA_MICROSOFT_CLIENT_ID", None::<&str>),
                ("ENTRADA_MICROSOFT_CLIENT_SECRET", None::<&str>),
                ("ENTRADA_FACEBOOK_CLIENT_ID", None::<&str>),
                ("ENTRADA_FACEBOOK_CLIENT_SECRET", None::<&str>),
                ("ENTRADA_GITHUB_CLIENT_ID", None::<&str>),
                ("ENTRADA_GITHUB_CLIENT_SECRET", None::<&str>),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec![
                    "entrada",
                    "--port",
                    "9000",
                    "--token-secret",
                    "s3cret",
                    "--web-url",
                    "https://app.entrada.dev",
                ]);
                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 9000);
                assert_eq!(args.web_url, "https://app.entrada.dev");
                assert_eq!(args.client_url, "https://app.entrada.dev");
                assert_eq!(args.provider_credentials.len(), 1);
                assert_eq!(args.provider_credentials[0].0, ProviderKind::Google);
                Ok(())
            },
        )
    }
}
