//! `resend_domain`: sending domains.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{call, ignore_not_found, require_id, Resource};
use crate::client::{CreateDomainRequest, Domain, ResendClient, REGIONS};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// State of a `resend_domain`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainModel {
    /// Domain id.
    pub id: Option<String>,
    /// Domain name.
    pub name: Option<String>,
    /// Sending region.
    pub region: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Verification status.
    pub status: Option<String>,
    /// Detected DNS provider.
    pub dns_provider: Option<String>,
}

impl DomainModel {
    /// Copy server-side fields from an API response.
    ///
    /// Fields the response leaves out keep their current value.
    fn refresh(&mut self, domain: Domain) {
        self.id = Some(domain.id);
        self.name = Some(domain.name);
        self.region = domain.region.or(self.region.take());
        self.created_at = domain.created_at.or(self.created_at.take());
        self.status = domain.status.or(self.status.take());
        self.dns_provider = domain.dns_provider.or(self.dns_provider.take());
    }
}

/// Adapter for `resend_domain`.
#[derive(Debug, Clone)]
pub struct DomainResource {
    client: Arc<ResendClient>,
}

impl DomainResource {
    /// Create the adapter around a shared client.
    pub fn new(client: Arc<ResendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for DomainResource {
    type Model = DomainModel;

    const TYPE_NAME: &'static str = "resend_domain";

    fn schema() -> Schema {
        Schema::v0()
            .with_description("A domain Resend can send email from.")
            .with_attribute(
                "id",
                Attribute::computed_string()
                    .with_description("The unique identifier of the domain within Resend."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The domain name, e.g. mail.example.com."),
            )
            .with_attribute(
                "region",
                Attribute::optional_computed_string()
                    .with_force_new()
                    .with_allowed_values(REGIONS)
                    .with_description("The region emails are sent from."),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string()
                    .with_description("When the domain was created."),
            )
            .with_attribute(
                "status",
                Attribute::computed_string().with_description("Verification status."),
            )
            .with_attribute(
                "dns_provider",
                Attribute::computed_string()
                    .with_description("The DNS provider detected for the domain."),
            )
    }

    async fn create(
        &self,
        planned: DomainModel,
        cancel: &CancellationToken,
    ) -> Result<DomainModel, ProviderError> {
        let name = planned
            .name
            .clone()
            .ok_or_else(|| ProviderError::Validation("name is required".to_string()))?;

        let request = CreateDomainRequest {
            name,
            region: planned.region.clone(),
        };
        let domain = call("create domain", cancel, self.client.create_domain(&request)).await?;
        info!(id = %domain.id, name = %domain.name, "Created domain");

        let mut state = planned;
        state.refresh(domain);
        Ok(state)
    }

    async fn read(
        &self,
        mut current: DomainModel,
        cancel: &CancellationToken,
    ) -> Result<DomainModel, ProviderError> {
        let id = require_id(current.id.as_deref(), Self::TYPE_NAME)?;
        let domain = call("read domain", cancel, self.client.get_domain(id)).await?;
        current.refresh(domain);
        Ok(current)
    }

    async fn update(
        &self,
        _prior: DomainModel,
        _planned: DomainModel,
        _cancel: &CancellationToken,
    ) -> Result<DomainModel, ProviderError> {
        Err(ProviderError::Unsupported {
            resource_type: Self::TYPE_NAME,
            operation: "update",
        })
    }

    async fn delete(
        &self,
        current: DomainModel,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError> {
        let id = require_id(current.id.as_deref(), Self::TYPE_NAME)?;
        let result = call("delete domain", cancel, self.client.remove_domain(id)).await;
        ignore_not_found(result, Self::TYPE_NAME, id)?;
        info!(id, "Deleted domain");
        Ok(())
    }

    fn import(&self, id: &str) -> (DomainModel, Vec<Diagnostic>) {
        let model = DomainModel {
            id: Some(id.to_string()),
            ..Default::default()
        };
        (model, Vec::new())
    }
}
