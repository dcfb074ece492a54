//! Resource lifecycle adapters.
//!
//! Each resource type implements [`Resource`]: a typed model, a schema, and
//! the create/read/update/delete/import operations against the Resend API.
//! The provider decodes host JSON into the model, calls the adapter, and
//! encodes the result back.

mod api_key;
mod domain;

use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::client::ClientError;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::validation::validate;

pub use api_key::{ApiKeyModel, ApiKeyResource};
pub use domain::{DomainModel, DomainResource};

/// Lifecycle contract for one resource type.
///
/// Every operation receives the provider's cancellation token and must fail
/// with [`ProviderError::Canceled`] if it fires before the remote call ends.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Typed state of one resource instance.
    type Model: Serialize + DeserializeOwned + Send + 'static;

    /// Resource type name as seen by the host, e.g. `resend_domain`.
    const TYPE_NAME: &'static str;

    /// Schema of the resource.
    fn schema() -> Schema;

    /// Validate a resource configuration.
    fn validate(config: &Value) -> Vec<Diagnostic> {
        validate(&Self::schema(), config)
    }

    /// Create the remote object described by `planned`.
    async fn create(
        &self,
        planned: Self::Model,
        cancel: &CancellationToken,
    ) -> Result<Self::Model, ProviderError>;

    /// Refresh `current` from the remote side.
    async fn read(
        &self,
        current: Self::Model,
        cancel: &CancellationToken,
    ) -> Result<Self::Model, ProviderError>;

    /// Apply an in-place update.
    async fn update(
        &self,
        prior: Self::Model,
        planned: Self::Model,
        cancel: &CancellationToken,
    ) -> Result<Self::Model, ProviderError>;

    /// Delete the remote object. Deleting something already gone succeeds.
    async fn delete(
        &self,
        current: Self::Model,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError>;

    /// Seed state for an existing remote object from its id.
    ///
    /// Returns the seeded model plus any warnings for the user.
    fn import(&self, id: &str) -> (Self::Model, Vec<Diagnostic>);
}

/// Run one remote call, racing it against cancellation.
async fn call<T, F>(
    operation: &'static str,
    cancel: &CancellationToken,
    request: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProviderError::Canceled { operation }),
        result = request => result.map_err(|e| {
            if e.is_timeout() {
                warn!(operation, "Resend API request timed out");
            }
            ProviderError::remote(operation, e)
        }),
    }
}

/// Treat "already gone" as a successful delete.
fn ignore_not_found(
    result: Result<(), ProviderError>,
    resource_type: &'static str,
    id: &str,
) -> Result<(), ProviderError> {
    match result {
        Err(e) if e.is_not_found() => {
            warn!(resource_type, id, "Remote object already deleted");
            Ok(())
        },
        other => other,
    }
}

/// The id of a model that must already exist remotely.
fn require_id<'a>(id: Option<&'a str>, resource_type: &str) -> Result<&'a str, ProviderError> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::Validation(format!("{} state has no id", resource_type)))
}
