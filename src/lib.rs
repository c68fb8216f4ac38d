//! # Entrada (Authentication & Federated Identity)
//!
//! `entrada` authenticates end users and issues/rotates the credentials used
//! for subsequent API access. It supports password-based sign-in and
//! federated (`OAuth2` authorization-code) login against Google, Microsoft,
//! Facebook and GitHub.
//!
//! ## Token lifecycle
//!
//! Access tokens are short-lived signed JWTs; validity derives purely from the
//! signature and TTL. Refresh tokens are opaque high-entropy strings tracked
//! in a TTL key-value store, one live token per account: every issuance
//! overwrites the previous slot, so rotation doubles as replay detection.
//! Presenting any non-current refresh token is treated as compromise.
//!
//! ## Federation
//!
//! Each login attempt round-trips a random CSRF `state` through the provider.
//! Issued states are individual short-TTL store entries consumed on callback,
//! so concurrent attempts against the same provider do not collide. Provider
//! identities are mapped onto local accounts by the account linker: one
//! account may hold links to several providers, and a federated login for an
//! email that already has a password account attaches a new link instead of
//! creating a duplicate.
//!
//! Persistence engines are out of scope: the identity repository, credential
//! store, and mail transport are trait collaborators with in-memory/logging
//! implementations used by the dev server and the test suite.

pub mod account;
pub mod api;
pub mod cli;
pub mod error;
pub mod mail;
pub mod oauth2;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
