//! The Resend provider.
//!
//! [`ResendProvider`] owns the shared API client and routes each host request
//! to the adapter for its resource type. Adapters only exist after a
//! successful `Configure`; until then every lifecycle call fails with
//! [`ProviderError::NotConfigured`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ResendClient;
use crate::config::{Environment, ProcessEnv, ProviderConfig};
use crate::credentials::connect;
use crate::error::ProviderError;
use crate::plan::plan;
use crate::resources::{ApiKeyResource, DomainResource, Resource};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
use crate::validation::validate;
use crate::value::{json_type_name, strip_unknown};

/// Resource types this provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    ApiKey,
    Domain,
}

impl Kind {
    fn of(resource_type: &str) -> Result<Self, ProviderError> {
        if resource_type == ApiKeyResource::TYPE_NAME {
            Ok(Self::ApiKey)
        } else if resource_type == DomainResource::TYPE_NAME {
            Ok(Self::Domain)
        } else {
            Err(ProviderError::UnknownResource(resource_type.to_string()))
        }
    }

    fn schema(self) -> Schema {
        match self {
            Self::ApiKey => ApiKeyResource::schema(),
            Self::Domain => DomainResource::schema(),
        }
    }

    fn validate(self, config: &Value) -> Vec<Diagnostic> {
        match self {
            Self::ApiKey => ApiKeyResource::validate(config),
            Self::Domain => DomainResource::validate(config),
        }
    }
}

/// Adapters bound to the configured client.
#[derive(Debug)]
struct Resources {
    api_keys: ApiKeyResource,
    domains: DomainResource,
}

impl Resources {
    fn new(client: Arc<ResendClient>) -> Self {
        Self {
            api_keys: ApiKeyResource::new(Arc::clone(&client)),
            domains: DomainResource::new(client),
        }
    }
}

/// Run `$body` with `$r` bound to the adapter for `$kind`.
macro_rules! with_resource {
    ($self:ident, $kind:expr, $r:ident => $body:expr) => {{
        let resources = $self.resources()?;
        match $kind {
            Kind::ApiKey => {
                let $r = &resources.api_keys;
                $body
            },
            Kind::Domain => {
                let $r = &resources.domains;
                $body
            },
        }
    }};
}

/// Provider for Resend API keys and domains.
pub struct ResendProvider {
    env: Box<dyn Environment>,
    resources: OnceLock<Resources>,
    cancel: CancellationToken,
}

impl ResendProvider {
    /// Create a provider that reads fallbacks from the process environment.
    pub fn new() -> Self {
        Self::with_env(ProcessEnv)
    }

    /// Create a provider with a custom environment lookup.
    pub fn with_env(env: impl Environment + 'static) -> Self {
        Self {
            env: Box::new(env),
            resources: OnceLock::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Returns `true` once `Configure` has succeeded.
    pub fn is_configured(&self) -> bool {
        self.resources.get().is_some()
    }

    /// Returns `true` once `Stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn resources(&self) -> Result<&Resources, ProviderError> {
        self.resources.get().ok_or(ProviderError::NotConfigured)
    }
}

impl Default for ResendProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResendProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendProvider")
            .field("configured", &self.is_configured())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

fn already_configured() -> Diagnostic {
    Diagnostic::warning("Provider already configured").with_detail(
        "The provider keeps the API client from its first configuration; later configuration \
         is ignored.",
    )
}

/// Decode host state into a model. Unknown values become null first.
fn decode<M: DeserializeOwned>(mut state: Value) -> Result<M, ProviderError> {
    if !state.is_object() {
        return Err(ProviderError::TypeMismatch {
            expected: "object",
            actual: json_type_name(&state).to_string(),
        });
    }
    strip_unknown(&mut state);
    Ok(serde_json::from_value(state)?)
}

fn encode<M: Serialize>(model: &M) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

async fn create_with<R: Resource>(
    resource: &R,
    planned: Value,
    cancel: &CancellationToken,
) -> Result<Value, ProviderError> {
    let model = decode(planned)?;
    encode(&resource.create(model, cancel).await?)
}

async fn read_with<R: Resource>(
    resource: &R,
    current: Value,
    cancel: &CancellationToken,
) -> Result<Value, ProviderError> {
    let model = decode(current)?;
    encode(&resource.read(model, cancel).await?)
}

async fn update_with<R: Resource>(
    resource: &R,
    prior: Value,
    planned: Value,
    cancel: &CancellationToken,
) -> Result<Value, ProviderError> {
    let prior = decode(prior)?;
    let planned = decode(planned)?;
    encode(&resource.update(prior, planned, cancel).await?)
}

async fn delete_with<R: Resource>(
    resource: &R,
    current: Value,
    cancel: &CancellationToken,
) -> Result<(), ProviderError> {
    resource.delete(decode(current)?, cancel).await
}

fn import_with<R: Resource>(resource: &R, id: &str) -> Result<ImportedResource, ProviderError> {
    let (model, diagnostics) = resource.import(id);
    let mut imported = ImportedResource::new(R::TYPE_NAME, encode(&model)?);
    imported.diagnostics = diagnostics;
    Ok(imported)
}

#[async_trait::async_trait]
impl ProviderService for ResendProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(ApiKeyResource::TYPE_NAME, ApiKeyResource::schema())
            .with_resource(DomainResource::TYPE_NAME, DomainResource::schema())
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.schema().resources.keys().cloned().collect(),
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&ProviderConfig::schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        if self.is_configured() {
            warn!("Provider already configured, ignoring new configuration");
            return Ok(vec![already_configured()]);
        }

        let config = ProviderConfig::from_json(&config)?;
        let client = Arc::new(connect(config, self.env.as_ref())?);
        let base_url = client.base_url().to_string();

        if self.resources.set(Resources::new(client)).is_err() {
            warn!("Concurrent configure lost the race, keeping the first client");
            return Ok(vec![already_configured()]);
        }

        info!(%base_url, "Provider configured");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        info!("Canceling in-flight operations");
        self.cancel.cancel();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(Kind::of(resource_type)?.validate(&config))
    }

    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let current = Kind::of(resource_type)?.schema().version;
        match u64::try_from(version) {
            Ok(v) if v <= current => {
                debug!(resource_type, version, "State is current");
                Ok(state)
            },
            _ => Err(ProviderError::Validation(format!(
                "cannot upgrade {} state from version {}; latest schema version is {}",
                resource_type, version, current
            ))),
        }
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = Kind::of(resource_type)?.schema();
        plan(&schema, prior_state.as_ref(), &proposed_state)
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let kind = Kind::of(resource_type)?;
        with_resource!(self, kind, r => create_with(r, planned_state, &self.cancel).await)
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let kind = Kind::of(resource_type)?;
        with_resource!(self, kind, r => read_with(r, current_state, &self.cancel).await)
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let kind = Kind::of(resource_type)?;
        with_resource!(self, kind, r => {
            update_with(r, prior_state, planned_state, &self.cancel).await
        })
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let kind = Kind::of(resource_type)?;
        with_resource!(self, kind, r => delete_with(r, current_state, &self.cancel).await)
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let kind = Kind::of(resource_type)?;
        if id.trim().is_empty() {
            return Err(ProviderError::Validation(
                "import id must not be empty".to_string(),
            ));
        }
        with_resource!(self, kind, r => Ok(vec![import_with(r, id)?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{API_KEY_ENV, BASE_URL_ENV};
    use crate::value::UNKNOWN_VALUE;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn env(server: &MockServer) -> HashMap<String, String> {
        HashMap::from([
            (API_KEY_ENV.to_string(), "re_env".to_string()),
            (BASE_URL_ENV.to_string(), server.uri()),
        ])
    }

    async fn configured() -> (MockServer, ResendProvider) {
        let server = MockServer::start().await;
        let provider = ResendProvider::with_env(env(&server));
        let diagnostics = provider.configure(Value::Null).await.unwrap();
        assert!(diagnostics.is_empty());
        (server, provider)
    }

    #[test]
    fn test_schema_lists_both_resources() {
        let provider = ResendProvider::with_env(HashMap::new());
        let schema = provider.schema();
        assert!(schema.resources.contains_key("resend_api_key"));
        assert!(schema.resources.contains_key("resend_domain"));
        assert!(schema.provider.attribute("api_key").unwrap().flags.sensitive);

        let metadata = provider.metadata();
        assert_eq!(metadata.resources, vec!["resend_api_key", "resend_domain"]);
        assert!(metadata.capabilities.plan_destroy);
    }

    #[tokio::test]
    async fn test_configure_without_key() {
        let provider = ResendProvider::with_env(HashMap::new());
        let err = provider.configure(json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_configure_twice_warns() {
        let (_server, provider) = configured().await;
        let diagnostics = provider
            .configure(json!({"api_key": "re_other"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_error());
    }

    #[tokio::test]
    async fn test_config_key_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domains/dom-1"))
            .and(header("authorization", "Bearer re_cfg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "dom-1",
                "name": "mail.example.com",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ResendProvider::with_env(env(&server));
        provider
            .configure(json!({"api_key": "re_cfg"}))
            .await
            .unwrap();
        let state = provider
            .read("resend_domain", json!({"id": "dom-1"}))
            .await
            .unwrap();
        assert_eq!(state["name"], "mail.example.com");
    }

    #[tokio::test]
    async fn test_lifecycle_before_configure() {
        let provider = ResendProvider::with_env(HashMap::new());
        let err = provider
            .create("resend_domain", json!({"name": "mail.example.com"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let (_server, provider) = configured().await;
        let err = provider
            .read("resend_webhook", json!({"id": "wh-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(ref t) if t == "resend_webhook"));

        let err = provider
            .validate_resource_config("resend_webhook", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let provider = ResendProvider::with_env(HashMap::new());
        let diagnostics = provider
            .validate_resource_config("resend_domain", json!({"name": "x.dev", "region": "mars"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("region"));
    }

    #[tokio::test]
    async fn test_plan_needs_no_configuration() {
        let provider = ResendProvider::with_env(HashMap::new());
        let result = provider
            .plan("resend_api_key", None, json!({"name": "ci"}), json!({"name": "ci"}))
            .await
            .unwrap();
        assert_eq!(result.planned_state["token"], UNKNOWN_VALUE);
    }

    #[tokio::test]
    async fn test_create_strips_unknown_values() {
        let (server, provider) = configured().await;
        Mock::given(method("POST"))
            .and(path("/api-keys"))
            .and(wiremock::matchers::body_json(json!({"name": "ci"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "key-1",
                "token": "re_secret",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = provider
            .create(
                "resend_api_key",
                json!({"name": "ci", "id": UNKNOWN_VALUE, "token": UNKNOWN_VALUE}),
            )
            .await
            .unwrap();
        assert_eq!(state["id"], "key-1");
        assert_eq!(state["token"], "re_secret");
        assert_eq!(state["permission"], Value::Null);
    }

    #[tokio::test]
    async fn test_decode_rejects_non_object() {
        let (_server, provider) = configured().await;
        let err = provider
            .read("resend_api_key", json!(["key-1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_upgrade_state() {
        let provider = ResendProvider::with_env(HashMap::new());
        let state = json!({"id": "dom-1"});
        let upgraded = provider
            .upgrade_resource_state("resend_domain", 0, state.clone())
            .await
            .unwrap();
        assert_eq!(upgraded, state);

        let err = provider
            .upgrade_resource_state("resend_domain", 3, state)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_carries_warning() {
        let (_server, provider) = configured().await;
        let imported = provider
            .import_resource("resend_api_key", "abc123")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].resource_type, "resend_api_key");
        assert_eq!(imported[0].state["id"], "abc123");
        assert_eq!(imported[0].state["token"], Value::Null);
        assert_eq!(imported[0].diagnostics.len(), 1);

        let err = provider
            .import_resource("resend_domain", " ")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_stop_cancels_operations() {
        let (server, provider) = configured().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        provider.stop().await.unwrap();
        assert!(provider.is_stopped());
        let err = provider
            .delete("resend_domain", json!({"id": "dom-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Canceled { .. }));
    }

    #[test]
    fn test_debug_hides_environment() {
        let provider = ResendProvider::with_env(HashMap::from([(
            API_KEY_ENV.to_string(),
            "re_secret".to_string(),
        )]));
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("re_secret"));
        assert!(debug.contains("configured: false"));
    }
}
