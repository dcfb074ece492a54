//! API key resolution.
//!
//! Order of precedence:
//!
//! 1. `api_key` in the provider configuration
//! 2. the `RESEND_API_KEY` environment variable
//!
//! A configured value that is not known yet fails before the environment is
//! consulted, so the user sees why their key was rejected instead of a
//! generic "missing" error. An explicitly configured empty string does not
//! fall back to the environment.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::ResendClient;
use crate::config::{Environment, ProviderConfig, API_KEY_ENV};
use crate::error::ProviderError;
use crate::value::AttrValue;

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The provider configuration block.
    Config,
    /// The `RESEND_API_KEY` environment variable.
    Environment,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => f.write_str("provider configuration"),
            Self::Environment => f.write_str(API_KEY_ENV),
        }
    }
}

/// Resolve the API key to authenticate with.
pub fn resolve_api_key(
    configured: AttrValue<SecretString>,
    env: &dyn Environment,
) -> Result<(SecretString, KeySource), ProviderError> {
    let (key, source) = match configured {
        AttrValue::Pending => return Err(ProviderError::UnknownApiKey),
        AttrValue::Present(key) => (key, KeySource::Config),
        AttrValue::Absent => (
            SecretString::from(env.var(API_KEY_ENV).unwrap_or_default()),
            KeySource::Environment,
        ),
    };

    if key.expose_secret().is_empty() {
        return Err(ProviderError::MissingApiKey);
    }

    Ok((key, source))
}

/// Resolve credentials and client settings, then build the client.
pub fn connect(
    config: ProviderConfig,
    env: &dyn Environment,
) -> Result<ResendClient, ProviderError> {
    let client_config = config.client_config(env)?;
    let (key, source) = resolve_api_key(config.api_key, env)?;
    debug!(%source, base_url = %client_config.base_url, "Resolved Resend API key");

    ResendClient::new(key, &client_config)
        .map_err(|e| ProviderError::Configuration(e.to_string()))
}
