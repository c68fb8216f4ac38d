use super::handlers::{auth, health, oauth2};
use utoipa::openapi::{InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Same router wiring as the server; only the generated spec is returned.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// New endpoints go through `.routes(routes!(...))` so they are both served
/// and documented. Routes added outside (`/`, `OPTIONS /health`) are
/// intentionally undocumented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path.
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::password::sign_up))
        .routes(routes!(auth::password::sign_in))
        .routes(routes!(auth::password::forgot_password))
        .routes(routes!(auth::password::change_password))
        .routes(routes!(auth::verification::verify_email))
        .routes(routes!(auth::verification::confirm_email))
        .routes(routes!(auth::session::refresh))
        .routes(routes!(auth::session::logout))
        .routes(routes!(auth::session::profile))
        .routes(routes!(oauth2::start))
        .routes(routes!(oauth2::callback))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Cargo.toml metadata instead of the utoipa-axum defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.license = cargo_license();

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Local credentials and session lifecycle".to_string());

    let mut oauth2_tag = Tag::new("oauth2");
    oauth2_tag.description = Some("Federated sign-in via external providers".to_string());

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(vec![auth_tag, oauth2_tag]))
        .build()
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
