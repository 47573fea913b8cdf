use std::collections::BTreeMap;

use crate::models::{Changelog, History};
use crate::rows::ChangelogRow;

/// Turns an issue's embedded changelog into changelog table rows.
pub struct ChangelogParser;

impl ChangelogParser {
    /// One row per history item, in history order then item order.
    pub fn parse_changelog(
        issue_key: &str,
        project: Option<&str>,
        changelog: &Changelog,
    ) -> Vec<ChangelogRow> {
        changelog
            .histories
            .iter()
            .flat_map(|history| Self::parse_history(issue_key, project, history))
            .collect()
    }

    fn parse_history(
        issue_key: &str,
        project: Option<&str>,
        history: &History,
    ) -> Vec<ChangelogRow> {
        let author = history
            .author
            .as_ref()
            .and_then(|a| a.identity())
            .map(str::to_string);

        history
            .items
            .iter()
            .map(|item| ChangelogRow {
                key: issue_key.to_string(),
                project: project.map(str::to_string),
                id: Some(history.id.clone()),
                author: author.clone(),
                created: Some(history.created.clone()),
                field: Some(item.field.clone()),
                fieldtype: item.field_type.clone(),
                from: item.from.clone(),
                from_string: item.from_string.clone(),
                to: item.to.clone(),
                to_string: item.to_string.clone(),
            })
            .collect()
    }

    /// Number of changes per field name, sorted by field name.
    pub fn generate_change_summary(rows: &[ChangelogRow]) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();

        for row in rows {
            if let Some(field) = &row.field {
                *summary.entry(field.clone()).or_insert(0) += 1;
            }
        }

        summary
    }
}
