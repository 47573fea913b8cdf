use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub fields: IssueFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
}

impl Issue {
    /// Project key taken from the issue key prefix (`ABC-12` -> `ABC`),
    /// falling back to the project field for keys without a dash.
    pub fn project_key(&self) -> Option<String> {
        match self.key.split_once('-') {
            Some((prefix, _)) if !prefix.is_empty() => Some(prefix.to_string()),
            _ => self.fields.project.as_ref().map(|p| p.key.clone()),
        }
    }

    pub fn histories(&self) -> &[History] {
        self.changelog
            .as_ref()
            .map(|c| c.histories.as_slice())
            .unwrap_or(&[])
    }
}

/// Timestamps stay as the strings JIRA sent (`2024-01-15T10:30:00.000+0000`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IssueFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "issuetype")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(rename = "resolutiondate")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,

    // Everything else (description, labels, customfield_*) is carried through untouched,
    // in key order so the raw dump is stable between runs.
    #[serde(flatten)]
    pub custom_fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Changelog {
    #[serde(rename = "startAt")]
    #[serde(default)]
    pub start_at: u32,
    #[serde(rename = "maxResults")]
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub histories: Vec<History>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Changelog {
    /// True when the server embedded fewer histories than the issue has.
    pub fn is_truncated(&self) -> bool {
        self.start_at > 0 || (self.total as usize) > self.histories.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct History {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    pub created: String,
    #[serde(default)]
    pub items: Vec<HistoryItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryItem {
    pub field: String,
    #[serde(rename = "fieldtype")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(rename = "fieldId")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "fromString")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(rename = "toString")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_string: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

use super::{IssueType, Priority, Project, Resolution, Status, User};
