//! Tri-state attribute values.
//!
//! Configuration and planned state can carry three kinds of "value": nothing
//! at all, a value the host does not know yet (it depends on a resource that
//! has not been applied), or a concrete value. Collapsing the first two loses
//! information the credential check needs, so they stay distinct here.
//!
//! On the wire an unknown value is the string [`UNKNOWN_VALUE`].

use serde_json::Value;

use crate::error::ProviderError;

/// Sentinel string the host uses for values that are known only after apply.
pub const UNKNOWN_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// An attribute value that may be absent, pending, or present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttrValue<T> {
    /// Not provided (missing or null).
    #[default]
    Absent,
    /// Provided, but not resolved yet.
    Pending,
    /// Provided and resolved.
    Present(T),
}

impl<T> AttrValue<T> {
    /// Returns `true` for [`AttrValue::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns `true` for [`AttrValue::Pending`].
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The resolved value, if any.
    pub fn present(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Pending => None,
        }
    }

    /// Transform the resolved value, keeping `Absent` and `Pending` as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AttrValue<U> {
        match self {
            Self::Absent => AttrValue::Absent,
            Self::Pending => AttrValue::Pending,
            Self::Present(value) => AttrValue::Present(f(value)),
        }
    }
}

impl AttrValue<String> {
    /// Read a string attribute out of a JSON object.
    ///
    /// `attribute` names the field for error reporting.
    pub fn string_from_json(
        attribute: &'static str,
        value: Option<&Value>,
    ) -> Result<Self, ProviderError> {
        match value {
            None | Some(Value::Null) => Ok(Self::Absent),
            Some(Value::String(s)) if s == UNKNOWN_VALUE => Ok(Self::Pending),
            Some(Value::String(s)) => Ok(Self::Present(s.clone())),
            Some(other) => Err(ProviderError::TypeMismatch {
                expected: "string",
                actual: format!("{} for attribute '{}'", json_type_name(other), attribute),
            }),
        }
    }
}

/// Returns `true` if the value is the unknown sentinel.
pub fn is_unknown(value: &Value) -> bool {
    value.as_str() == Some(UNKNOWN_VALUE)
}

/// The unknown sentinel as a JSON value.
pub fn unknown() -> Value {
    Value::String(UNKNOWN_VALUE.to_string())
}

/// Replace every unknown sentinel in a state object with null.
///
/// Typed models treat "not known yet" the same as "not set"; the adapters
/// fill those fields in from the remote response.
pub fn strip_unknown(value: &mut Value) {
    match value {
        Value::Object(map) => map.values_mut().for_each(strip_unknown),
        Value::Array(items) => items.iter_mut().for_each(strip_unknown),
        other if is_unknown(other) => *other = Value::Null,
        _ => {},
    }
}

/// Human-readable name of a JSON value's type.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_from_json_states() {
        assert_eq!(
            AttrValue::string_from_json("api_key", None).unwrap(),
            AttrValue::Absent
        );
        assert_eq!(
            AttrValue::string_from_json("api_key", Some(&Value::Null)).unwrap(),
            AttrValue::Absent
        );
        assert_eq!(
            AttrValue::string_from_json("api_key", Some(&unknown())).unwrap(),
            AttrValue::Pending
        );
        assert_eq!(
            AttrValue::string_from_json("api_key", Some(&json!(""))).unwrap(),
            AttrValue::Present(String::new())
        );
    }

    #[test]
    fn test_string_from_json_rejects_other_types() {
        let err = AttrValue::string_from_json("api_key", Some(&json!(42))).unwrap_err();
        assert!(matches!(err, ProviderError::TypeMismatch { .. }));
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_strip_unknown() {
        let mut state = json!({
            "id": UNKNOWN_VALUE,
            "name": "ci",
            "nested": [UNKNOWN_VALUE, "kept"],
        });
        strip_unknown(&mut state);
        assert_eq!(state, json!({"id": null, "name": "ci", "nested": [null, "kept"]}));
    }

    #[test]
    fn test_present() {
        assert_eq!(AttrValue::Present(3).present(), Some(3));
        assert_eq!(AttrValue::<u8>::Pending.present(), None);
        assert!(AttrValue::<u8>::Absent.is_absent());
        assert!(AttrValue::<u8>::Pending.is_pending());
    }
}
