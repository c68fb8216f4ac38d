//! `OAuth2` federation: provider registry and the authorization-code flow.

pub mod flow;
pub mod provider;

pub use flow::Federation;
pub use provider::{ClientCredentials, ProviderClient, ProviderRegistry};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported external identity providers. The lowercase name doubles as the
/// URL path segment and the state-entry payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Microsoft,
    Facebook,
    Github,
}

impl ProviderKind {
    pub const ALL: [Self; 4] = [Self::Google, Self::Microsoft, Self::Facebook, Self::Github];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::Facebook => "facebook",
            Self::Github => "github",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "microsoft" => Ok(Self::Microsoft),
            "facebook" => Ok(Self::Facebook),
            "github" => Ok(Self::Github),
            _ => Err(()),
        }
    }
}

/// Provider-agnostic profile shape handed to the account linker after the
/// provider-specific field names have been normalized away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedProfile {
    pub provider_user_id: String,
    pub email: String,
    pub display_name: String,
}
