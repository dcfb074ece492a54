//! `resend_api_key`: API keys that authenticate against Resend.
//!
//! The API returns the key's token exactly once, from create. There is no
//! endpoint that reads a single key back, so read is a pass-through and every
//! configurable attribute forces replacement.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{call, ignore_not_found, require_id, Resource};
use crate::client::{CreateApiKeyRequest, Permission, ResendClient};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation::validate;
use crate::value::is_unknown;

/// State of a `resend_api_key`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyModel {
    /// Key id.
    pub id: Option<String>,
    /// Secret token; only known after create.
    pub token: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Access level.
    pub permission: Option<Permission>,
    /// Domain the key may send from.
    pub domain_id: Option<String>,
}

impl fmt::Debug for ApiKeyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyModel")
            .field("id", &self.id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .field("permission", &self.permission)
            .field("domain_id", &self.domain_id)
            .finish()
    }
}

/// Adapter for `resend_api_key`.
#[derive(Debug, Clone)]
pub struct ApiKeyResource {
    client: Arc<ResendClient>,
}

impl ApiKeyResource {
    /// Create the adapter around a shared client.
    pub fn new(client: Arc<ResendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ApiKeyResource {
    type Model = ApiKeyModel;

    const TYPE_NAME: &'static str = "resend_api_key";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("An API key to authenticate communications with Resend.")
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The API key ID."),
            )
            .with_attribute(
                "token",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The API key token. Only available after creation."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The API key name."),
            )
            .with_attribute(
                "permission",
                Attribute::optional_string()
                    .with_force_new()
                    .with_allowed_values(Permission::ALL)
                    .with_description(
                        "full_access can manage every resource; sending_access can only send \
                         emails.",
                    ),
            )
            .with_attribute(
                "domain_id",
                Attribute::optional_string().with_force_new().with_description(
                    "Restrict the key to sending from one domain. Only used with sending_access.",
                ),
            )
    }

    fn validate(config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validate(&Self::schema(), config);

        let domain_id = config.get("domain_id").filter(|v| !v.is_null());
        let permission = config.get("permission").filter(|v| !v.is_null());
        let restricted = match permission {
            Some(p) if is_unknown(p) => true,
            Some(p) => p.as_str() == Some(Permission::SendingAccess.as_str()),
            None => false,
        };
        if domain_id.is_some() && !restricted {
            diagnostics.push(
                Diagnostic::warning("domain_id has no effect")
                    .with_detail(
                        "Resend only restricts keys to a domain when permission is \
                         \"sending_access\".",
                    )
                    .with_attribute("domain_id"),
            );
        }

        diagnostics
    }

    async fn create(
        &self,
        planned: ApiKeyModel,
        cancel: &CancellationToken,
    ) -> Result<ApiKeyModel, ProviderError> {
        let name = planned
            .name
            .clone()
            .ok_or_else(|| ProviderError::Validation("name is required".to_string()))?;

        let request = CreateApiKeyRequest {
            name,
            permission: planned.permission,
            domain_id: planned.domain_id.clone(),
        };
        let created = call("create key", cancel, self.client.create_api_key(&request)).await?;
        info!(id = %created.id, "Created API key");

        Ok(ApiKeyModel {
            id: Some(created.id),
            token: Some(created.token),
            ..planned
        })
    }

    async fn read(
        &self,
        current: ApiKeyModel,
        _cancel: &CancellationToken,
    ) -> Result<ApiKeyModel, ProviderError> {
        // The API cannot return the token again, so there is nothing to refresh.
        Ok(current)
    }

    async fn update(
        &self,
        prior: ApiKeyModel,
        planned: ApiKeyModel,
        _cancel: &CancellationToken,
    ) -> Result<ApiKeyModel, ProviderError> {
        debug!(id = ?prior.id, "API key update is a no-op");
        Ok(ApiKeyModel {
            id: planned.id.or(prior.id),
            token: planned.token.or(prior.token),
            ..planned
        })
    }

    async fn delete(
        &self,
        current: ApiKeyModel,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError> {
        let id = require_id(current.id.as_deref(), Self::TYPE_NAME)?;
        let result = call("delete key", cancel, self.client.remove_api_key(id)).await;
        ignore_not_found(result, Self::TYPE_NAME, id)?;
        info!(id, "Deleted API key");
        Ok(())
    }

    fn import(&self, id: &str) -> (ApiKeyModel, Vec<Diagnostic>) {
        let model = ApiKeyModel {
            id: Some(id.to_string()),
            ..Default::default()
        };
        let warning = Diagnostic::warning("Partial import").with_detail(
            "Resend does not expose an existing API key's token, name, permission or domain_id. \
             Only the id is imported; set the remaining attributes in configuration to match the \
             remote key.",
        );
        (model, vec![warning])
    }
}
