//! Error types for the Resend provider.

use thiserror::Error;

use crate::client::ClientError;
use crate::schema::Diagnostic;

/// Errors that can occur while serving provider operations.
///
/// Every variant is reported to the host as an error [`Diagnostic`]; see
/// [`ProviderError::to_diagnostic`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Neither the configuration nor `RESEND_API_KEY` supplied a key.
    #[error("Missing API key")]
    MissingApiKey,

    /// The configured key depends on a value that is not known yet.
    #[error("Unknown API key")]
    UnknownApiKey,

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A config or state value had an unexpected JSON shape.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// What the provider expected.
        expected: &'static str,
        /// What it got.
        actual: String,
    },

    /// A call to the Resend API failed.
    #[error("Unable to {operation}, got error: {source}")]
    Remote {
        /// Short description of the attempted call, e.g. `create key`.
        operation: &'static str,
        /// The underlying client error.
        #[source]
        source: ClientError,
    },

    /// The resource type does not support the requested operation.
    #[error("{resource_type} does not support {operation}")]
    Unsupported {
        /// The resource type name.
        resource_type: &'static str,
        /// The lifecycle operation.
        operation: &'static str,
    },

    /// The operation was interrupted because the provider is stopping.
    #[error("Operation canceled: {operation}")]
    Canceled {
        /// The interrupted operation.
        operation: &'static str,
    },

    /// A resource operation arrived before a successful `Configure`.
    #[error("Provider is not configured")]
    NotConfigured,

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binding the listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl ProviderError {
    /// Build a [`ProviderError::Remote`] for `operation`.
    pub fn remote(operation: &'static str, source: ClientError) -> Self {
        Self::Remote { operation, source }
    }

    /// Returns `true` if the remote side reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote { source, .. } if source.is_not_found())
    }

    /// Render this error as an error diagnostic for the host.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::MissingApiKey => Diagnostic::error("Missing API key")
                .with_detail(
                    "The provider cannot create the Resend API client because the API key is \
                     missing or empty. Set the api_key value in the provider configuration or \
                     use the RESEND_API_KEY environment variable.",
                )
                .with_attribute("api_key"),
            Self::UnknownApiKey => Diagnostic::error("Unknown API key")
                .with_detail(
                    "The provider cannot create the Resend API client because the api_key value \
                     is not known until apply. Set the value statically in the provider \
                     configuration or use the RESEND_API_KEY environment variable.",
                )
                .with_attribute("api_key"),
            Self::Remote { .. } => Diagnostic::error("Client Error").with_detail(self.to_string()),
            Self::Unsupported {
                resource_type,
                operation,
            } => Diagnostic::error("Unsupported Operation").with_detail(format!(
                "The Resend API offers no way to {} a {} in place. Change a force-new \
                 attribute to replace it instead.",
                operation, resource_type
            )),
            Self::Canceled { .. } => {
                Diagnostic::error("Operation Canceled").with_detail(self.to_string())
            },
            Self::NotConfigured => Diagnostic::error("Provider Not Configured").with_detail(
                "Configure must succeed before resources can be managed.",
            ),
            Self::Configuration(msg) => {
                Diagnostic::error("Invalid Provider Configuration").with_detail(msg.as_str())
            },
            Self::TypeMismatch { .. } => {
                Diagnostic::error("Unexpected Value Type").with_detail(self.to_string())
            },
            Self::UnknownResource(name) => Diagnostic::error("Unknown Resource Type")
                .with_detail(format!("This provider does not manage '{}' resources.", name)),
            Self::Validation(msg) => Diagnostic::error("Validation Error").with_detail(msg.as_str()),
            Self::Serialization(_) => {
                Diagnostic::error("Invalid JSON").with_detail(self.to_string())
            },
            Self::Io(_) | Self::Transport(_) => {
                Diagnostic::error("Internal Error").with_detail(self.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::UnknownResource("resend_contact".to_string());
        assert_eq!(err.to_string(), "Unknown resource type: resend_contact");

        let err = ProviderError::TypeMismatch {
            expected: "object",
            actual: "array".to_string(),
        };
        assert_eq!(err.to_string(), "Type mismatch: expected object, got array");

        let err = ProviderError::Canceled {
            operation: "create domain",
        };
        assert_eq!(err.to_string(), "Operation canceled: create domain");
    }

    #[test]
    fn test_remote_diagnostic() {
        let err = ProviderError::remote(
            "create key",
            ClientError::Api {
                status: 403,
                name: Some("restricted_api_key".to_string()),
                message: "This API key is restricted".to_string(),
            },
        );
        let diag = err.to_diagnostic();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.summary, "Client Error");
        assert_eq!(
            diag.detail.as_deref(),
            Some("Unable to create key, got error: Resend API error (HTTP 403): This API key is restricted")
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_credential_diagnostics_name_attribute() {
        for err in [ProviderError::MissingApiKey, ProviderError::UnknownApiKey] {
            let diag = err.to_diagnostic();
            assert_eq!(diag.summary, err.to_string());
            assert_eq!(diag.attribute.as_deref(), Some("api_key"));
            assert!(diag.detail.unwrap().contains("RESEND_API_KEY"));
        }
    }

    #[test]
    fn test_unsupported_diagnostic() {
        let diag = ProviderError::Unsupported {
            resource_type: "resend_domain",
            operation: "update",
        }
        .to_diagnostic();
        assert_eq!(diag.summary, "Unsupported Operation");
        assert!(diag.detail.unwrap().contains("update a resend_domain"));
    }

    #[test]
    fn test_is_not_found() {
        let err = ProviderError::remote(
            "delete domain",
            ClientError::Api {
                status: 404,
                name: None,
                message: "gone".to_string(),
            },
        );
        assert!(err.is_not_found());
        assert!(!ProviderError::NotConfigured.is_not_found());
    }
}
