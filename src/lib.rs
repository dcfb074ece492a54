//! Hemmer provider for Resend
//!
//! This crate implements a Hemmer provider plugin that manages two kinds of
//! [Resend](https://resend.com) objects:
//!
//! - `resend_api_key`: API keys, optionally restricted to sending from one
//!   domain
//! - `resend_domain`: sending domains
//!
//! The binary is spawned by the host engine, prints a handshake line, and then
//! serves the provider protocol over gRPC on a loopback port.
//!
//! # Overview
//!
//! - **Protocol Buffers types**: pre-compiled types for the provider protocol
//! - **Schemas**: provider, `resend_api_key` and `resend_domain` schemas
//! - **Resend client**: a small `reqwest` client for the endpoints the
//!   resources need
//! - **Credential resolution**: `api_key` from configuration, falling back to
//!   `RESEND_API_KEY`
//! - **Server helpers**: handshake, gRPC server and graceful shutdown
//! - **Logging**: structured logging with `tracing`, on stderr
//!
//! # Quick Start
//!
//! ```no_run
//! use hemmer_provider_resend::{init_logging, serve, ResendProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hemmer_provider_resend::ProviderError> {
//!     init_logging();
//!     serve(ResendProvider::new()).await
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! When the provider starts via [`serve`], it outputs a handshake string to
//! stdout:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `HEMMER_PROVIDER|<protocol_version>|<address>`
//!
//! # Provider Protocol
//!
//! - **GetMetadata**: Returns provider capabilities and resource names
//! - **GetSchema**: Returns full schema for provider config and resources
//! - **ValidateProviderConfig**: Validates provider configuration
//! - **Configure**: Resolves the API key and builds the Resend client
//! - **Stop**: Cancels in-flight operations
//! - **ValidateResourceConfig**: Validates resource configuration
//! - **UpgradeResourceState**: Migrates state from older schema versions
//! - **Plan**: Calculates required changes
//! - **Create/Read/Update/Delete**: CRUD operations for resources
//! - **ImportResourceState**: Imports existing Resend objects
//!
//! Every failure is reported to the host as diagnostics.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;
pub mod value;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

// Re-export main types at crate root
pub use client::{ClientConfig, ClientError, ResendClient};
pub use config::{Environment, ProcessEnv, ProviderConfig};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::ResendProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate};
pub use value::{AttrValue, UNKNOWN_VALUE};
