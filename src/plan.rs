//! Schema-driven planning.
//!
//! Given prior state and the proposed configuration, work out what the next
//! apply will do to a single resource instance:
//!
//! - no prior state: create, computed attributes become unknown
//! - proposed `null`: destroy
//! - otherwise: update, computed attributes carry over from prior state, as
//!   do optional+computed attributes left unset in configuration
//!
//! A change to any force-new attribute turns the update into a replacement.

use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};
use crate::value::{json_type_name, unknown};

/// Plan a change to one resource instance.
pub fn plan(
    schema: &Schema,
    prior_state: Option<&Value>,
    proposed_state: &Value,
) -> Result<PlanResult, ProviderError> {
    let prior = match prior_state {
        None | Some(Value::Null) => None,
        Some(state) => Some(as_object(state)?),
    };

    match (prior, proposed_state) {
        (None, Value::Null) => Ok(PlanResult::no_change(Value::Null)),
        (Some(prior), Value::Null) => Ok(plan_destroy(prior)),
        (None, proposed) => Ok(plan_create(schema, as_object(proposed)?)),
        (Some(prior), proposed) => Ok(plan_update(schema, prior, as_object(proposed)?)),
    }
}

fn plan_create(schema: &Schema, proposed: &Map<String, Value>) -> PlanResult {
    let mut planned = proposed.clone();
    for (name, attr) in &schema.attributes {
        if attr.flags.computed && is_null(planned.get(name)) {
            planned.insert(name.clone(), unknown());
        }
    }

    let changes = planned
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| AttributeChange::added(name.as_str(), value.clone()))
        .collect();

    PlanResult::with_changes(Value::Object(planned), changes, false)
}

fn plan_destroy(prior: &Map<String, Value>) -> PlanResult {
    let changes = prior
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| AttributeChange::removed(name.as_str(), value.clone()))
        .collect();

    PlanResult::with_changes(Value::Null, changes, false)
}

fn plan_update(
    schema: &Schema,
    prior: &Map<String, Value>,
    proposed: &Map<String, Value>,
) -> PlanResult {
    let mut planned = proposed.clone();
    let mut changes = Vec::new();
    let mut requires_replace = false;
    let mut server_owned = Vec::new();

    for (name, attr) in &schema.attributes {
        let before = prior.get(name).cloned().unwrap_or(Value::Null);

        // Unset optional+computed values keep whatever the server chose.
        if attr.flags.is_computed_only()
            || (attr.flags.computed && is_null(planned.get(name)))
        {
            planned.insert(name.clone(), before);
            server_owned.push(name);
            continue;
        }

        let after = planned.get(name).cloned().unwrap_or(Value::Null);
        if before != after {
            requires_replace |= attr.force_new;
            changes.push(AttributeChange::modified(name.as_str(), before, after));
        }
    }

    if requires_replace {
        for name in server_owned {
            planned.insert(name.clone(), unknown());
        }
    }

    PlanResult::with_changes(Value::Object(planned), changes, requires_replace)
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ProviderError> {
    value
        .as_object()
        .ok_or_else(|| ProviderError::TypeMismatch {
            expected: "object",
            actual: json_type_name(value).to_string(),
        })
}

fn is_null(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use crate::value::UNKNOWN_VALUE;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("token", Attribute::computed_string().sensitive())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("note", Attribute::optional_string())
    }

    fn domain_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute(
                "region",
                Attribute::optional_computed_string().with_force_new(),
            )
    }

    #[test]
    fn test_create_marks_computed_unknown() {
        let result = plan(&schema(), None, &json!({"name": "ci"})).unwrap();
        assert!(!result.requires_replace);
        assert_eq!(result.planned_state["id"], UNKNOWN_VALUE);
        assert_eq!(result.planned_state["token"], UNKNOWN_VALUE);
        assert_eq!(result.planned_state["name"], "ci");

        let mut paths: Vec<_> = result.changes.iter().map(|c| c.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["id", "name", "token"]);
        assert!(result.changes.iter().all(|c| c.before.is_none()));
    }

    #[test]
    fn test_destroy() {
        let prior = json!({"id": "key-1", "name": "ci", "note": null});
        let result = plan(&schema(), Some(&prior), &Value::Null).unwrap();
        assert_eq!(result.planned_state, Value::Null);
        assert_eq!(result.changes.len(), 2);
        assert!(result.changes.iter().all(|c| c.after.is_none()));
    }

    #[test]
    fn test_nothing_to_destroy() {
        let result = plan(&schema(), None, &Value::Null).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_update_carries_computed() {
        let prior = json!({"id": "key-1", "token": "re_tok", "name": "ci", "note": null});
        let proposed = json!({"name": "ci", "note": "hello"});
        let result = plan(&schema(), Some(&prior), &proposed).unwrap();

        assert!(!result.requires_replace);
        assert_eq!(result.planned_state["id"], "key-1");
        assert_eq!(result.planned_state["token"], "re_tok");
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "note");
    }

    #[test]
    fn test_update_no_changes() {
        let prior = json!({"id": "key-1", "token": "re_tok", "name": "ci"});
        let result = plan(&schema(), Some(&prior), &json!({"name": "ci"})).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.planned_state, prior);
    }

    #[test]
    fn test_force_new_change_replaces() {
        let prior = json!({"id": "key-1", "token": "re_tok", "name": "ci"});
        let result = plan(&schema(), Some(&prior), &json!({"name": "deploy"})).unwrap();

        assert!(result.requires_replace);
        assert_eq!(result.planned_state["id"], UNKNOWN_VALUE);
        assert_eq!(result.planned_state["token"], UNKNOWN_VALUE);
        assert_eq!(
            result.changes,
            vec![AttributeChange::modified("name", json!("ci"), json!("deploy"))]
        );
    }

    #[test]
    fn test_rejects_non_object_state() {
        let err = plan(&schema(), None, &json!("ci")).unwrap_err();
        assert!(matches!(err, ProviderError::TypeMismatch { .. }));
    }

    #[test]
    fn test_create_marks_unset_server_default_unknown() {
        let result = plan(&domain_schema(), None, &json!({"name": "mail.example.com"})).unwrap();
        assert_eq!(result.planned_state["region"], UNKNOWN_VALUE);

        let result = plan(
            &domain_schema(),
            None,
            &json!({"name": "mail.example.com", "region": "eu-west-1"}),
        )
        .unwrap();
        assert_eq!(result.planned_state["region"], "eu-west-1");
    }

    #[test]
    fn test_update_keeps_server_default() {
        let prior = json!({"id": "dom-1", "name": "mail.example.com", "region": "us-east-1"});
        let result = plan(
            &domain_schema(),
            Some(&prior),
            &json!({"name": "mail.example.com"}),
        )
        .unwrap();

        assert!(!result.requires_replace);
        assert!(result.is_empty());
        assert_eq!(result.planned_state, prior);
    }

    #[test]
    fn test_explicit_region_change_replaces() {
        let prior = json!({"id": "dom-1", "name": "mail.example.com", "region": "us-east-1"});
        let result = plan(
            &domain_schema(),
            Some(&prior),
            &json!({"name": "mail.example.com", "region": "eu-west-1"}),
        )
        .unwrap();

        assert!(result.requires_replace);
        assert_eq!(result.planned_state["region"], "eu-west-1");
        assert_eq!(result.planned_state["id"], UNKNOWN_VALUE);
    }

    #[test]
    fn test_replace_makes_unset_server_default_unknown() {
        let prior = json!({"id": "dom-1", "name": "mail.example.com", "region": "us-east-1"});
        let result = plan(
            &domain_schema(),
            Some(&prior),
            &json!({"name": "news.example.com"}),
        )
        .unwrap();

        assert!(result.requires_replace);
        assert_eq!(result.planned_state["region"], UNKNOWN_VALUE);
        assert_eq!(result.changes.len(), 1);
    }
}
