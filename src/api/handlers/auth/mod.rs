//! Handlers for local credentials, sessions, and email verification.

pub mod password;
pub mod session;
pub mod types;
pub mod verification;
