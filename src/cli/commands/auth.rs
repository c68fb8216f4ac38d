use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_ACCESS_TTL: &str = "access-token-ttl-seconds";
pub const ARG_REFRESH_TTL: &str = "refresh-token-ttl-seconds";
pub const ARG_STATE_TTL: &str = "oauth-state-ttl-seconds";
pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_WEB_URL: &str = "web-url";
pub const ARG_CLIENT_URL: &str = "client-url";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Public base URL of this API, used to build OAuth2 redirect URIs")
                .env("ENTRADA_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_WEB_URL)
                .long(ARG_WEB_URL)
                .help("Frontend URL; CORS origin and federated-login redirect target")
                .env("ENTRADA_WEB_URL")
                .default_value("http://localhost:5173"),
        )
        .arg(
            Arg::new(ARG_CLIENT_URL)
                .long(ARG_CLIENT_URL)
                .help("Base URL for links in outbound emails (defaults to web-url)")
                .env("ENTRADA_CLIENT_URL"),
        )
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("HMAC secret for signing access tokens")
                .env("ENTRADA_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TTL)
                .long(ARG_ACCESS_TTL)
                .help("Access token TTL in seconds")
                .env("ENTRADA_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL)
                .long(ARG_REFRESH_TTL)
                .help("Refresh token TTL in seconds")
                .env("ENTRADA_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_STATE_TTL)
                .long(ARG_STATE_TTL)
                .help("OAuth2 state TTL in seconds")
                .env("ENTRADA_OAUTH_STATE_TTL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub base_url: String,
    pub web_url: String,
    pub client_url: String,
    pub token_secret: SecretString,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: u64,
    pub state_ttl_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error when a required argument is absent from the matches.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .cloned()
            .context("missing required argument: --base-url")?;
        let web_url = matches
            .get_one::<String>(ARG_WEB_URL)
            .cloned()
            .context("missing required argument: --web-url")?;
        let client_url = matches
            .get_one::<String>(ARG_CLIENT_URL)
            .cloned()
            .unwrap_or_else(|| web_url.clone());
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --token-secret")?;
        Ok(Self {
            base_url,
            web_url,
            client_url,
            token_secret,
            access_ttl_seconds: matches
                .get_one::<i64>(ARG_ACCESS_TTL)
                .copied()
                .unwrap_or(60),
            refresh_ttl_seconds: matches
                .get_one::<u64>(ARG_REFRESH_TTL)
                .copied()
                .unwrap_or(2_592_000),
            state_ttl_seconds: matches
                .get_one::<u64>(ARG_STATE_TTL)
                .copied()
                .unwrap_or(600),
        })
    }
}
