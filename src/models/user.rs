use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JIRA user reference. Server instances identify users by `key`/`name`,
/// Cloud instances by `accountId`; either set may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "accountId")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "displayName")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "emailAddress")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(rename = "self")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "timeZone")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// First non-empty of `key`, `accountId`, `name`, `displayName`.
    pub fn identity(&self) -> Option<&str> {
        [
            &self.key,
            &self.account_id,
            &self.name,
            &self.display_name,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .find(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_user_deserialization() {
        let json_data = json!({
            "self": "https://jira.example.com/rest/api/2/user?username=jdoe",
            "key": "jdoe",
            "name": "jdoe",
            "emailAddress": "jdoe@example.com",
            "displayName": "John Doe",
            "active": true,
            "timeZone": "Europe/Tallinn"
        });

        let user: User = serde_json::from_value(json_data).unwrap();

        assert_eq!(user.key.as_deref(), Some("jdoe"));
        assert_eq!(user.display_name.as_deref(), Some("John Doe"));
        assert_eq!(user.identity(), Some("jdoe"));
    }

    #[test]
    fn test_cloud_user_identity_uses_account_id() {
        let user: User = serde_json::from_value(json!({
            "accountId": "557058:f58131cb",
            "displayName": "Test User"
        }))
        .unwrap();

        assert_eq!(user.identity(), Some("557058:f58131cb"));
    }

    #[test]
    fn test_identity_skips_empty_values() {
        let user = User {
            key: Some(String::new()),
            display_name: Some("Only Name".to_string()),
            ..Default::default()
        };
        assert_eq!(user.identity(), Some("Only Name"));
        assert_eq!(User::default().identity(), None);
    }
}
