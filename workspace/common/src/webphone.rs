use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Flat SIP account configuration handed to the browser softphone.
/// Optional account fields are rendered as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SipAccountPayload {
    pub id: i32,
    pub label: String,
    pub extension: String,
    pub auth_username: String,
    pub auth_password: String,
    /// SIP domain / registrar
    pub domain: String,
    /// SIP-over-WebSocket endpoint
    pub ws_uri: String,
    pub outbound_proxy: String,
    pub stun_server: String,
    pub turn_server: String,
    pub turn_username: String,
    pub turn_password: String,
}

/// Account payload enriched with the owning user's identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WebphoneAccount {
    #[serde(flatten)]
    pub sip: SipAccountPayload,
    pub user_display_name: String,
    /// User email, empty when the user has none
    pub email: String,
}

/// Body of the webphone config endpoint.
///
/// When `has_account` is false, `account` serializes as `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WebphoneConfig {
    pub has_account: bool,
    #[serde(with = "account_or_empty")]
    #[schema(value_type = Object)]
    pub account: Option<WebphoneAccount>,
}

impl WebphoneConfig {
    pub fn without_account() -> Self {
        Self {
            has_account: false,
            account: None,
        }
    }

    pub fn with_account(account: WebphoneAccount) -> Self {
        Self {
            has_account: true,
            account: Some(account),
        }
    }
}

mod account_or_empty {
    use super::*;
    use serde::ser::SerializeMap;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Empty {}

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Account(WebphoneAccount),
        Empty(Empty),
    }

    pub fn serialize<S>(value: &Option<WebphoneAccount>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(account) => account.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<WebphoneAccount>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Account(account) => Ok(Some(account)),
            Repr::Empty(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_account() -> WebphoneAccount {
        WebphoneAccount {
            sip: SipAccountPayload {
                id: 7,
                label: "Front desk".to_string(),
                extension: "101".to_string(),
                auth_username: "101".to_string(),
                auth_password: "secret".to_string(),
                domain: "pbx.example.com".to_string(),
                ws_uri: "wss://pbx.example.com:8089/ws".to_string(),
                outbound_proxy: String::new(),
                stun_server: "stun:stun.l.google.com:19302".to_string(),
                turn_server: String::new(),
                turn_username: String::new(),
                turn_password: String::new(),
            },
            user_display_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn missing_account_serializes_as_empty_object() {
        let value = serde_json::to_value(WebphoneConfig::without_account()).unwrap();
        assert_eq!(value, json!({"has_account": false, "account": {}}));
    }

    #[test]
    fn account_fields_are_flat() {
        let value = serde_json::to_value(WebphoneConfig::with_account(sample_account())).unwrap();
        assert_eq!(value["has_account"], true);
        let account = value["account"].as_object().unwrap();
        assert_eq!(account.len(), 14);
        assert_eq!(account["extension"], "101");
        assert_eq!(account["domain"], "pbx.example.com");
        assert_eq!(account["outbound_proxy"], "");
        assert_eq!(account["user_display_name"], "Alice");
        assert!(account.get("sip").is_none());
    }

    #[test]
    fn empty_account_object_reads_back_as_none() {
        let config: WebphoneConfig =
            serde_json::from_value(json!({"has_account": false, "account": {}})).unwrap();
        assert_eq!(config, WebphoneConfig::without_account());
    }
}
