//! Request and response bodies for the Resend endpoints the provider uses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access level of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Can create, delete, get, and update any resource.
    FullAccess,
    /// Can only send emails.
    SendingAccess,
}

impl Permission {
    /// Every permission, in wire form.
    pub const ALL: [&'static str; 2] = ["full_access", "sending_access"];

    /// The wire name of this permission.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullAccess => "full_access",
            Self::SendingAccess => "sending_access",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-center regions a domain can send from.
pub const REGIONS: [&str; 3] = ["us-east-1", "eu-west-1", "sa-east-1"];

/// `POST /api-keys`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateApiKeyRequest {
    /// Display name.
    pub name: String,
    /// Access level; the server default applies when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    /// Restrict sending to one domain (only with `sending_access`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}

/// Response to `POST /api-keys`. The token is never returned again.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CreateApiKeyResponse {
    /// Key id.
    pub id: String,
    /// Secret token.
    pub token: String,
}

impl fmt::Debug for CreateApiKeyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateApiKeyResponse")
            .field("id", &self.id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// `POST /domains`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDomainRequest {
    /// Domain name, e.g. `mail.example.com`.
    pub name: String,
    /// Sending region; the server default applies when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// A domain as returned by `POST /domains` and `GET /domains/{id}`.
///
/// DNS records in the response are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Domain {
    /// Domain id.
    pub id: String,
    /// Domain name.
    pub name: String,
    /// Verification status (`not_started`, `pending`, `verified`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Sending region.
    #[serde(default)]
    pub region: Option<String>,
    /// DNS provider detected for the domain.
    #[serde(default)]
    pub dns_provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_api_key_request_omits_unset_fields() {
        let req = CreateApiKeyRequest {
            name: "ci".to_string(),
            permission: None,
            domain_id: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"name": "ci"}));

        let req = CreateApiKeyRequest {
            name: "ci".to_string(),
            permission: Some(Permission::SendingAccess),
            domain_id: Some("dom-1".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"name": "ci", "permission": "sending_access", "domain_id": "dom-1"})
        );
    }

    #[test]
    fn test_permission_wire_names_match_all() {
        for name in Permission::ALL {
            let parsed: Permission = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(parsed.as_str(), name);
        }
    }

    #[test]
    fn test_token_redacted_in_debug() {
        let resp = CreateApiKeyResponse {
            id: "key-1".to_string(),
            token: "re_secret".to_string(),
        };
        let debug = format!("{:?}", resp);
        assert!(debug.contains("key-1"));
        assert!(!debug.contains("re_secret"));
    }

    #[test]
    fn test_domain_ignores_records() {
        let domain: Domain = serde_json::from_value(json!({
            "object": "domain",
            "id": "dom-1",
            "name": "mail.example.com",
            "status": "not_started",
            "created_at": "2023-04-26 20:21:26.347412+00",
            "region": "us-east-1",
            "records": [{"record": "SPF", "type": "MX"}],
        }))
        .unwrap();
        assert_eq!(domain.id, "dom-1");
        assert_eq!(domain.region.as_deref(), Some("us-east-1"));
        assert!(domain.dns_provider.is_none());
    }
}
