use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Priority {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "self")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_deserialization() {
        let json_data = json!({
            "id": "3",
            "name": "Major",
            "self": "https://jira.example.com/rest/api/2/priority/3",
            "iconUrl": "https://jira.example.com/images/icons/priorities/major.svg"
        });

        let priority: Priority = serde_json::from_value(json_data).unwrap();

        assert_eq!(priority.id.as_deref(), Some("3"));
        assert_eq!(priority.name, "Major");
    }
}
