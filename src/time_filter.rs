use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Creation-date window for an extraction. Both bounds are inclusive whole days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl CreatedRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    /// Builds a range from optional `YYYY-MM-DD` strings; blank strings mean "unbounded".
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let range = Self {
            start: parse_date(start)?,
            end: parse_date(end)?,
        };
        range.is_valid()?;
        Ok(range)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn is_valid(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(Error::InvalidFilter(format!(
                    "start date {} is after end date {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Creation-time conditions, `None` when the range is unbounded.
    pub fn to_jql_condition(&self) -> Option<String> {
        let mut conditions = Vec::new();

        if let Some(start) = self.start {
            conditions.push(format!("created >= '{}'", start.format(DATE_FORMAT)));
        }

        // JQL dates mean midnight, so the day after the end bound keeps the end day itself.
        if let Some(end) = self.end {
            let next_day = end.checked_add_days(Days::new(1)).unwrap_or(end);
            conditions.push(format!("created < '{}'", next_day.format(DATE_FORMAT)));
        }

        if conditions.is_empty() {
            None
        } else {
            Some(conditions.join(" AND "))
        }
    }

    /// Full search query for one project, ordered by key so pages are stable.
    pub fn to_jql(&self, project_key: &str) -> String {
        let project = format!("project = '{}'", project_key.replace('\'', "\\'"));
        match self.to_jql_condition() {
            Some(condition) => format!("{} AND {} ORDER BY key ASC", project, condition),
            None => format!("{} ORDER BY key ASC", project),
        }
    }
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, DATE_FORMAT)
            .map(Some)
            .map_err(|e| Error::InvalidFilter(format!("invalid date '{}' (expected YYYY-MM-DD): {}", v, e))),
    }
}

/// Parses the timestamps JIRA returns (`2024-01-15T10:30:00.000+0000`) as well as RFC 3339.
pub fn parse_jira_datetime(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
}
