//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` configuration object against a [`Schema`].
//! Unknown values (see [`crate::value::UNKNOWN_VALUE`]) pass type and
//! allowed-value checks; they are resolved by the host before apply.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_resend::schema::{Attribute, Schema};
//! use hemmer_provider_resend::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "region",
//!         Attribute::optional_string().with_allowed_values(["us-east-1", "eu-west-1"]),
//!     );
//!
//! assert!(validate(&schema, &json!({"name": "mail.example.com"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "mail.example.com", "region": "mars"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("region"));
//! ```

use serde_json::Value;

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use crate::value::{is_unknown, json_type_name};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - The value must be an object (or null, which is treated as empty)
/// - Required attributes must be present and non-null
/// - Computed-only attributes must not be set
/// - Attribute types must match the schema
/// - Attributes with allowed values must use one of them
/// - Attributes the schema does not declare are rejected
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let empty = serde_json::Map::new();
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", json_type_name(other))),
            );
            return diagnostics;
        },
    };

    for (name, attr) in &schema.attributes {
        validate_attribute(name, attr, obj.get(name), &mut diagnostics);
    }

    for name in obj.keys() {
        if !schema.attributes.contains_key(name) {
            diagnostics.push(
                Diagnostic::error(format!("Unsupported attribute '{}'", name))
                    .with_detail("This attribute is not part of the schema")
                    .with_attribute(name.as_str()),
            );
        }
    }

    diagnostics
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attribute(
    name: &str,
    attr: &Attribute,
    value: Option<&Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let value = match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", name))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(name),
                );
            }
            return;
        },
        Some(v) => v,
    };

    if attr.flags.is_computed_only() {
        diagnostics.push(
            Diagnostic::error(format!("Attribute '{}' is read-only", name))
                .with_detail("This value is set by the provider and cannot be configured")
                .with_attribute(name),
        );
        return;
    }

    if is_unknown(value) {
        return;
    }

    match attr.attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(
                    Diagnostic::error(format!("Invalid type for '{}'", name))
                        .with_detail(format!("Expected string, got {}", json_type_name(value)))
                        .with_attribute(name),
                );
                return;
            }
        },
    }

    if !attr.allowed_values.is_empty() {
        if let Some(s) = value.as_str() {
            if !attr.allowed_values.iter().any(|allowed| allowed == s) {
                diagnostics.push(
                    Diagnostic::error(format!("Invalid value for '{}'", name))
                        .with_detail(format!(
                            "Got \"{}\", expected one of: {}",
                            s,
                            attr.allowed_values.join(", ")
                        ))
                        .with_attribute(name),
                );
            }
        }
    }
}
