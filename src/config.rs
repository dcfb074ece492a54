//! Provider-level configuration.
//!
//! The host sends the provider block as a JSON object. Two attributes are
//! understood:
//!
//! - `api_key`: sensitive, falls back to `RESEND_API_KEY`
//! - `base_url`: falls back to `RESEND_BASE_URL`, then the production API
//!
//! Environment access goes through [`Environment`] so tests never touch the
//! real process environment.

use std::collections::HashMap;

use secrecy::SecretString;
use serde_json::Value;

use crate::client::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};
use crate::value::{json_type_name, AttrValue};

/// Environment variable holding the fallback API key.
pub const API_KEY_ENV: &str = "RESEND_API_KEY";

/// Environment variable holding the fallback API root.
pub const BASE_URL_ENV: &str = "RESEND_BASE_URL";

/// Read-only view of environment variables.
pub trait Environment: Send + Sync {
    /// Look up a variable; `None` when unset or not valid UTF-8.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Parsed provider configuration block.
#[derive(Debug)]
pub struct ProviderConfig {
    /// API key from configuration.
    pub api_key: AttrValue<SecretString>,
    /// API root override from configuration.
    pub base_url: AttrValue<String>,
}

impl ProviderConfig {
    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Manage Resend API keys and sending domains.")
            .with_attribute(
                "api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!(
                        "Resend API key. Falls back to the {} environment variable.",
                        API_KEY_ENV
                    )),
            )
            .with_attribute(
                "base_url",
                Attribute::optional_string().with_description(format!(
                    "Resend API root. Falls back to {}, then {}.",
                    BASE_URL_ENV, DEFAULT_BASE_URL
                )),
            )
    }

    /// Parse the configuration object sent by the host.
    ///
    /// `null` is treated as an empty block.
    pub fn from_json(config: &Value) -> Result<Self, ProviderError> {
        let obj = match config {
            Value::Null => {
                return Ok(Self {
                    api_key: AttrValue::Absent,
                    base_url: AttrValue::Absent,
                })
            },
            Value::Object(map) => map,
            other => {
                return Err(ProviderError::TypeMismatch {
                    expected: "object",
                    actual: json_type_name(other).to_string(),
                })
            },
        };

        Ok(Self {
            api_key: AttrValue::string_from_json("api_key", obj.get("api_key"))?
                .map(SecretString::from),
            base_url: AttrValue::string_from_json("base_url", obj.get("base_url"))?,
        })
    }

    /// Client settings for this configuration.
    ///
    /// An empty `base_url` falls through to the environment and then the
    /// default, same as an absent one.
    pub fn client_config(&self, env: &dyn Environment) -> Result<ClientConfig, ProviderError> {
        let base_url = match &self.base_url {
            AttrValue::Pending => {
                return Err(ProviderError::Configuration(
                    "base_url is not known until apply; set it statically or use RESEND_BASE_URL"
                        .to_string(),
                ))
            },
            AttrValue::Present(url) if !url.is_empty() => url.clone(),
            AttrValue::Present(_) | AttrValue::Absent => env
                .var(BASE_URL_ENV)
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        Ok(ClientConfig::default().with_base_url(base_url))
    }
}
