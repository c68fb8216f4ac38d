pub mod auth;
pub mod logging;
pub mod oauth2;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("entrada")
        .about("Authentication and Federated Identity")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ENTRADA_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = auth::with_args(command);
    let command = oauth2::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "entrada");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Authentication and Federated Identity".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_port_and_urls() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "entrada",
            "--port",
            "9000",
            "--token-secret",
            "s3cret",
            "--base-url",
            "https://api.entrada.dev",
            "--web-url",
            "https://app.entrada.dev",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(9000));
        let options = auth::Options::parse(&matches).expect("auth options");
        assert_eq!(options.base_url, "https://api.entrada.dev");
        assert_eq!(options.web_url, "https://app.entrada.dev");
        // client-url falls back to web-url
        assert_eq!(options.client_url, "https://app.entrada.dev");
        assert_eq!(options.token_secret.expose_secret(), "s3cret");
        assert_eq!(options.access_ttl_seconds, 60);
        assert_eq!(options.refresh_ttl_seconds, 2_592_000);
        assert_eq!(options.state_ttl_seconds, 600);
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("ENTRADA_PORT", Some("443")),
                ("ENTRADA_TOKEN_SECRET", Some("from-env")),
                ("ENTRADA_CLIENT_URL", Some("https://links.entrada.dev")),
                ("ENTRADA_ACCESS_TOKEN_TTL_SECONDS", Some("120")),
                ("ENTRADA_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["entrada"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(443));
                let options = auth::Options::parse(&matches).expect("auth options");
                assert_eq!(options.token_secret.expose_secret(), "from-env");
                assert_eq!(options.client_url, "https://links.entrada.dev");
                assert_eq!(options.access_ttl_seconds, 120);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_token_secret_required() {
        temp_env::with_vars([("ENTRADA_TOKEN_SECRET", None::<&str>)], || {
            let command = new();
            let result = command.try_get_matches_from(vec!["entrada"]);
            assert_eq!(
                result.map(|_| ()).map_err(|e| e.kind()),
                Err(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("ENTRADA_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "entrada".to_string(),
                    "--token-secret".to_string(),
                    "s3cret".to_string(),
                ];
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_provider_credentials_need_both_halves() {
        temp_env::with_vars(
            [
                ("ENTRADA_GOOGLE_CLIENT_ID", Some("google-id")),
                ("ENTRADA_GOOGLE_CLIENT_SECRET", None::<&str>),
                ("ENTRADA_GITHUB_CLIENT_ID", Some("github-id")),
                ("ENTRADA_GITHUB_CLIENT_SECRET", Some("github-secret")),
            ],
            || {
                let command = new();
                let matches =
                    command.get_matches_from(vec!["entrada", "--token-secret", "s3cret"]);
                assert!(oauth2::parse(&matches).is_err());
            },
        );
    }

    #[test]
    fn test_provider_credentials_parsed_when_complete() {
        temp_env::with_vars(
            [
                ("ENTRADA_GOOGLE_CLIENT_ID", None::<&str>),
                ("ENTRADA_GOOGLE_CLIENT_SECRET", None::<&str>),
                ("ENTRADA_GITHUB_CLIENT_ID", Some("github-id")),
                ("ENTRADA_GITHUB_CLIENT_SECRET", Some("github-secret")),
            ],
            || {
                let command = new();
                let matches =
                    command.get_matches_from(vec!["entrada", "--token-secret", "s3cret"]);
                let credentials = oauth2::parse(&matches).expect("provider credentials");
                assert_eq!(credentials.len(), 1);
                assert_eq!(credentials[0].0, crate::oauth2::ProviderKind::Github);
                assert_eq!(credentials[0].1.id, "github-id");
            },
        );
    }
}
