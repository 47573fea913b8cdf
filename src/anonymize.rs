use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Error, Result};
use crate::flatten::Tables;
use crate::rows::{ChangelogRow, IssueRow, Row};

pub const DEFAULT_ISSUE_FIELDS: &[&str] = &[
    "reporter.key",
    "creator.key",
    "assignee.key",
    "reporter.displayName",
    "creator.displayName",
    "assignee.displayName",
];

pub const DEFAULT_CHANGELOG_FIELDS: &[&str] = &["author"];

/// Changelog rows for these fields carry user identifiers in from/to and names in
/// fromString/toString.
pub const USER_CHANGE_FIELDS: &[&str] = &["assignee", "reporter", "creator"];

const USER_CHANGE_COLUMNS: &[&str] = &["from", "fromString", "to", "toString"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizeConfig {
    pub issue_fields: Vec<String>,
    pub changelog_fields: Vec<String>,
    /// Also rewrite old/new values of assignee, reporter and creator changes.
    pub user_change_values: bool,
    pub token_prefix: String,
}

impl AnonymizeConfig {
    pub fn new() -> Self {
        Self {
            issue_fields: DEFAULT_ISSUE_FIELDS.iter().map(|f| f.to_string()).collect(),
            changelog_fields: DEFAULT_CHANGELOG_FIELDS.iter().map(|f| f.to_string()).collect(),
            user_change_values: true,
            token_prefix: "U".to_string(),
        }
    }

    /// Config from user-supplied column names. `changelog.`-prefixed names select
    /// changelog columns, the rest issue columns; a table given no names keeps its defaults.
    pub fn from_field_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut issue_fields = Vec::new();
        let mut changelog_fields = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            match name.strip_prefix("changelog.") {
                Some(column) => changelog_fields.push(column.to_string()),
                None => issue_fields.push(name.to_string()),
            }
        }

        dedup(&mut issue_fields);
        dedup(&mut changelog_fields);

        let mut config = Self::new();
        if !issue_fields.is_empty() {
            config.issue_fields = issue_fields;
        }
        if !changelog_fields.is_empty() {
            config.changelog_fields = changelog_fields;
        }
        config
    }

    pub fn issue_fields(mut self, fields: Vec<String>) -> Self {
        self.issue_fields = fields;
        self
    }

    pub fn changelog_fields(mut self, fields: Vec<String>) -> Self {
        self.changelog_fields = fields;
        self
    }

    pub fn user_change_values(mut self, enabled: bool) -> Self {
        self.user_change_values = enabled;
        self
    }

    /// Rejects names that are not rewritable columns of their table.
    pub fn validate(&self) -> Result<()> {
        validate_columns::<IssueRow>(&self.issue_fields, "issues")?;
        validate_columns::<ChangelogRow>(&self.changelog_fields, "changelog")?;
        if self.token_prefix.is_empty() {
            return Err(Error::InvalidInput("token prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for AnonymizeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops repeated names, keeping first occurrences in order.
fn dedup(fields: &mut Vec<String>) {
    let mut seen = HashSet::new();
    fields.retain(|f| seen.insert(f.clone()));
}

fn validate_columns<R: Row + Default>(fields: &[String], table: &str) -> Result<()> {
    let mut blank = R::default();
    for field in fields {
        if blank.cell_mut(field).is_none() {
            return Err(Error::InvalidInput(format!(
                "'{}' is not an anonymizable column of the {} table",
                field, table
            )));
        }
    }
    Ok(())
}

/// Replaces identifying values with `U1`, `U2`, ... tokens.
///
/// One token table is shared by every column and both tables, so a user keeps
/// the same pseudonym wherever they appear. Tokens are handed out in order of
/// first appearance, which makes the result deterministic for a given input.
#[derive(Debug)]
pub struct Anonymizer {
    config: AnonymizeConfig,
    tokens: HashMap<String, String>,
}

impl Anonymizer {
    pub fn new(mut config: AnonymizeConfig) -> Result<Self> {
        config.validate()?;
        dedup(&mut config.issue_fields);
        dedup(&mut config.changelog_fields);
        Ok(Self {
            config,
            tokens: HashMap::new(),
        })
    }

    /// Token for `value`, allocating the next one on first sight.
    pub fn token_for(&mut self, value: &str) -> String {
        if let Some(token) = self.tokens.get(value) {
            return token.clone();
        }
        let token = format!("{}{}", self.config.token_prefix, self.tokens.len() + 1);
        self.tokens.insert(value.to_string(), token.clone());
        token
    }

    /// Number of distinct values replaced so far.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn pseudonymize(&mut self, cell: &mut Option<String>) {
        let Some(value) = cell.as_deref().filter(|v| !v.is_empty()) else {
            return;
        };
        let token = self.token_for(value);
        *cell = Some(token);
    }

    fn apply<R: Row, S: AsRef<str>>(&mut self, row: &mut R, columns: &[S]) {
        for column in columns {
            let column = column.as_ref();
            if let Some(cell) = row.cell_mut(column) {
                self.pseudonymize(cell);
            }
        }
    }

    pub fn anonymize(&mut self, tables: &mut Tables) {
        let issue_fields = self.config.issue_fields.clone();
        let changelog_fields = self.config.changelog_fields.clone();

        for row in &mut tables.issues {
            self.apply(row, issue_fields.as_slice());
        }

        let mut with_user_values: Vec<&str> = changelog_fields.iter().map(String::as_str).collect();
        for column in USER_CHANGE_COLUMNS {
            if !with_user_values.contains(column) {
                with_user_values.push(column);
            }
        }

        // Each cell is rewritten at most once, otherwise a token would be tokenized again.
        for row in &mut tables.changelog {
            let is_user_change = row
                .field
                .as_deref()
                .is_some_and(|f| USER_CHANGE_FIELDS.contains(&f));
            if self.config.user_change_values && is_user_change {
                self.apply(row, with_user_values.as_slice());
            } else {
                self.apply(row, changelog_fields.as_slice());
            }
        }

        debug!(distinct_values = self.tokens.len(), "anonymization done");
    }
}

/// One-shot anonymization with a fresh token table. Returns the number of distinct values replaced.
pub fn anonymize(tables: &mut Tables, config: AnonymizeConfig) -> Result<usize> {
    let mut anonymizer = Anonymizer::new(config)?;
    anonymizer.anonymize(tables);
    Ok(anonymizer.len())
}
