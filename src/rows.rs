use serde::{Deserialize, Serialize};

/// A flat table record with a fixed, ordered column set.
///
/// `COLUMNS` matches the serde field order, so a CSV header written from it lines
/// up with records produced by `csv::Writer::serialize`.
pub trait Row: Serialize {
    const COLUMNS: &'static [&'static str];

    /// Mutable access to a nullable cell by column name. `None` for unknown columns
    /// and for the row key, which is never rewritten.
    fn cell_mut(&mut self, column: &str) -> Option<&mut Option<String>>;

    fn cell(&self, column: &str) -> Option<&str>;
}

/// One row of the issues table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueRow {
    pub key: String,
    pub id: Option<String>,
    pub project: Option<String>,
    pub issuetype: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub resolution: Option<String>,
    pub summary: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub resolutiondate: Option<String>,
    #[serde(rename = "reporter.key")]
    pub reporter_key: Option<String>,
    #[serde(rename = "reporter.displayName")]
    pub reporter_display_name: Option<String>,
    #[serde(rename = "creator.key")]
    pub creator_key: Option<String>,
    #[serde(rename = "creator.displayName")]
    pub creator_display_name: Option<String>,
    #[serde(rename = "assignee.key")]
    pub assignee_key: Option<String>,
    #[serde(rename = "assignee.displayName")]
    pub assignee_display_name: Option<String>,
}

impl Row for IssueRow {
    const COLUMNS: &'static [&'static str] = &[
        "key",
        "id",
        "project",
        "issuetype",
        "status",
        "priority",
        "resolution",
        "summary",
        "created",
        "updated",
        "resolutiondate",
        "reporter.key",
        "reporter.displayName",
        "creator.key",
        "creator.displayName",
        "assignee.key",
        "assignee.displayName",
    ];

    fn cell_mut(&mut self, column: &str) -> Option<&mut Option<String>> {
        Some(match column {
            "id" => &mut self.id,
            "project" => &mut self.project,
            "issuetype" => &mut self.issuetype,
            "status" => &mut self.status,
            "priority" => &mut self.priority,
            "resolution" => &mut self.resolution,
            "summary" => &mut self.summary,
            "created" => &mut self.created,
            "updated" => &mut self.updated,
            "resolutiondate" => &mut self.resolutiondate,
            "reporter.key" => &mut self.reporter_key,
            "reporter.displayName" => &mut self.reporter_display_name,
            "creator.key" => &mut self.creator_key,
            "creator.displayName" => &mut self.creator_display_name,
            "assignee.key" => &mut self.assignee_key,
            "assignee.displayName" => &mut self.assignee_display_name,
            _ => return None,
        })
    }

    fn cell(&self, column: &str) -> Option<&str> {
        match column {
            "key" => Some(&self.key),
            "id" => self.id.as_deref(),
            "project" => self.project.as_deref(),
            "issuetype" => self.issuetype.as_deref(),
            "status" => self.status.as_deref(),
            "priority" => self.priority.as_deref(),
            "resolution" => self.resolution.as_deref(),
            "summary" => self.summary.as_deref(),
            "created" => self.created.as_deref(),
            "updated" => self.updated.as_deref(),
            "resolutiondate" => self.resolutiondate.as_deref(),
            "reporter.key" => self.reporter_key.as_deref(),
            "reporter.displayName" => self.reporter_display_name.as_deref(),
            "creator.key" => self.creator_key.as_deref(),
            "creator.displayName" => self.creator_display_name.as_deref(),
            "assignee.key" => self.assignee_key.as_deref(),
            "assignee.displayName" => self.assignee_display_name.as_deref(),
            _ => None,
        }
    }
}

/// One row of the changelog table: a single changed field within a history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangelogRow {
    pub key: String,
    pub project: Option<String>,
    /// History entry id; several rows share it when one edit touched several fields.
    pub id: Option<String>,
    pub author: Option<String>,
    pub created: Option<String>,
    pub field: Option<String>,
    pub fieldtype: Option<String>,
    pub from: Option<String>,
    #[serde(rename = "fromString")]
    pub from_string: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "toString")]
    pub to_string: Option<String>,
}

impl Row for ChangelogRow {
    const COLUMNS: &'static [&'static str] = &[
        "key",
        "project",
        "id",
        "author",
        "created",
        "field",
        "fieldtype",
        "from",
        "fromString",
        "to",
        "toString",
    ];

    fn cell_mut(&mut self, column: &str) -> Option<&mut Option<String>> {
        Some(match column {
            "project" => &mut self.project,
            "id" => &mut self.id,
            "author" => &mut self.author,
            "created" => &mut self.created,
            "field" => &mut self.field,
            "fieldtype" => &mut self.fieldtype,
            "from" => &mut self.from,
            "fromString" => &mut self.from_string,
            "to" => &mut self.to,
            "toString" => &mut self.to_string,
            _ => return None,
        })
    }

    fn cell(&self, column: &str) -> Option<&str> {
        match column {
            "key" => Some(&self.key),
            "project" => self.project.as_deref(),
            "id" => self.id.as_deref(),
            "author" => self.author.as_deref(),
            "created" => self.created.as_deref(),
            "field" => self.field.as_deref(),
            "fieldtype" => self.fieldtype.as_deref(),
            "from" => self.from.as_deref(),
            "fromString" => self.from_string.as_deref(),
            "to" => self.to.as_deref(),
            "toString" => self.to_string.as_deref(),
            _ => None,
        }
    }
}
