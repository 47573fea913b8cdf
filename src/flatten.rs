use crate::changelog_parser::ChangelogParser;
use crate::models::{Issue, User};
use crate::rows::{ChangelogRow, IssueRow};
use tracing::warn;

/// The two output tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub issues: Vec<IssueRow>,
    pub changelog: Vec<ChangelogRow>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens `issues` and appends the rows, keeping input order.
    pub fn extend<'a, I>(&mut self, issues: I)
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        for issue in issues {
            let (row, entries) = flatten_issue(issue);
            self.issues.push(row);
            self.changelog.extend(entries);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.changelog.is_empty()
    }
}

/// Projects a sequence of issues into the issues and changelog tables.
pub fn flatten<'a, I>(issues: I) -> Tables
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut tables = Tables::new();
    tables.extend(issues);
    tables
}

pub fn flatten_issue(issue: &Issue) -> (IssueRow, Vec<ChangelogRow>) {
    let fields = &issue.fields;
    let project = issue.project_key();

    let identity = |user: &Option<User>| {
        user.as_ref()
            .and_then(|u| u.identity())
            .map(str::to_string)
    };
    let display_name = |user: &Option<User>| user.as_ref().and_then(|u| u.display_name.clone());

    let row = IssueRow {
        key: issue.key.clone(),
        id: Some(issue.id.clone()),
        project: project.clone(),
        issuetype: fields.issue_type.as_ref().map(|t| t.name.clone()),
        status: fields.status.as_ref().map(|s| s.name.clone()),
        priority: fields.priority.as_ref().map(|p| p.name.clone()),
        resolution: fields.resolution.as_ref().map(|r| r.name.clone()),
        summary: fields.summary.clone(),
        created: fields.created.clone(),
        updated: fields.updated.clone(),
        resolutiondate: fields.resolution_date.clone(),
        reporter_key: identity(&fields.reporter),
        reporter_display_name: display_name(&fields.reporter),
        creator_key: identity(&fields.creator),
        creator_display_name: display_name(&fields.creator),
        assignee_key: identity(&fields.assignee),
        assignee_display_name: display_name(&fields.assignee),
    };

    let entries = match &issue.changelog {
        Some(changelog) => {
            if changelog.is_truncated() {
                warn!(
                    issue = %issue.key,
                    embedded = changelog.histories.len(),
                    total = changelog.total,
                    "changelog truncated by the server, changelog rows are incomplete"
                );
            }
            ChangelogParser::parse_changelog(&issue.key, project.as_deref(), changelog)
        }
        None => Vec::new(),
    };

    (row, entries)
}
