use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{Issue, SearchParams, SearchResult};
use crate::time_filter::{CreatedRange, parse_jira_datetime};
use crate::JiraClient;

/// Where issue pages come from. `JiraClient` is the production source.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// One page of a JQL search, issues carrying their full field set and changelog.
    async fn search_page(&self, jql: &str, start_at: u32, max_results: u32) -> Result<SearchResult>;

    /// Keys of every project visible to the current session.
    async fn project_keys(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn search_page(&self, jql: &str, start_at: u32, max_results: u32) -> Result<SearchResult> {
        self.search_issues(jql, SearchParams::page_with_changelog(start_at, max_results))
            .await
    }

    async fn project_keys(&self) -> Result<Vec<String>> {
        let projects = self.get_projects().await?;
        Ok(projects.into_iter().map(|p| p.key).collect())
    }
}

/// Counters gathered while paging through a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractStats {
    pub pages: usize,
    pub issues: usize,
    pub duplicates: usize,
    /// `total` from the most recent page.
    pub reported_total: Option<u32>,
    pub oldest_created: Option<DateTime<Utc>>,
    pub newest_created: Option<DateTime<Utc>>,
}

impl ExtractStats {
    fn record_issue(&mut self, issue: &Issue) {
        self.issues += 1;

        let Some(created) = issue
            .fields
            .created
            .as_deref()
            .and_then(|c| parse_jira_datetime(c).ok())
        else {
            return;
        };

        self.oldest_created = Some(self.oldest_created.map_or(created, |o| o.min(created)));
        self.newest_created = Some(self.newest_created.map_or(created, |n| n.max(created)));
    }

    pub fn merge(&mut self, other: &ExtractStats) {
        self.pages += other.pages;
        self.issues += other.issues;
        self.duplicates += other.duplicates;
        self.reported_total = match (self.reported_total, other.reported_total) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        self.oldest_created = match (self.oldest_created, other.oldest_created) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.newest_created = match (self.newest_created, other.newest_created) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

/// Lazy, page-at-a-time view over a JQL search.
///
/// Nothing is requested until [`IssueStream::next_page`] is called, and only one
/// page of issues is held by the stream at any time.
pub struct IssueStream<'a, S: IssueSource + ?Sized> {
    source: &'a S,
    jql: String,
    page_size: u32,
    start_at: u32,
    finished: bool,
    seen_keys: HashSet<String>,
    stats: ExtractStats,
}

impl<'a, S: IssueSource + ?Sized> IssueStream<'a, S> {
    pub fn new(source: &'a S, jql: impl Into<String>, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidInput("page size must be at least 1".to_string()));
        }

        Ok(Self {
            source,
            jql: jql.into(),
            page_size,
            start_at: 0,
            finished: false,
            seen_keys: HashSet::new(),
            stats: ExtractStats::default(),
        })
    }

    pub fn jql(&self) -> &str {
        &self.jql
    }

    pub fn stats(&self) -> &ExtractStats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetches the next page. `Ok(None)` once the search is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Issue>>> {
        if self.finished {
            return Ok(None);
        }

        info!(
            from = self.start_at + 1,
            to = self.start_at + self.page_size,
            "searching for issues"
        );

        let result = self
            .source
            .search_page(&self.jql, self.start_at, self.page_size)
            .await?;

        self.stats.reported_total = Some(result.total);
        let received = result.issues.len() as u32;

        if received == 0 {
            info!("no more issues found");
            self.finished = true;
            return Ok(None);
        }

        self.stats.pages += 1;
        self.start_at += received;

        // Servers may cap maxResults below what was asked for.
        let effective_page_size = match result.max_results {
            0 => self.page_size,
            cap => cap.min(self.page_size),
        };
        if received < effective_page_size || (result.total > 0 && self.start_at >= result.total) {
            self.finished = true;
        }

        let mut issues = Vec::with_capacity(result.issues.len());
        for issue in result.issues {
            if !self.seen_keys.insert(issue.key.clone()) {
                warn!(key = %issue.key, "issue returned twice, dropping duplicate");
                self.stats.duplicates += 1;
                continue;
            }
            self.stats.record_issue(&issue);
            issues.push(issue);
        }

        info!(count = issues.len(), total = result.total, "issues retrieved");
        Ok(Some(issues))
    }

    /// Drains the stream into memory.
    pub async fn collect_all(mut self) -> Result<(Vec<Issue>, ExtractStats)> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        debug!(issues = all.len(), "stream drained");
        Ok((all, self.stats))
    }

    pub fn into_stats(self) -> ExtractStats {
        self.stats
    }
}

/// Builds per-project streams with a fixed page size.
pub struct Extractor<'a, S: IssueSource + ?Sized> {
    source: &'a S,
    page_size: u32,
}

impl<'a, S: IssueSource + ?Sized> Extractor<'a, S> {
    pub fn new(source: &'a S, page_size: u32) -> Self {
        Self { source, page_size }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn stream(&self, project_key: &str, range: &CreatedRange) -> Result<IssueStream<'a, S>> {
        if project_key.trim().is_empty() {
            return Err(Error::InvalidInput("project key is empty".to_string()));
        }
        range.is_valid()?;

        info!(project = project_key, "preparing issue search");
        IssueStream::new(self.source, range.to_jql(project_key), self.page_size)
    }

    pub async fn projects(&self) -> Result<Vec<String>> {
        self.source.project_keys().await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Serves canned pages sliced out of a fixed issue list.
    pub struct FakeSource {
        pub issues: Vec<Issue>,
        pub server_cap: u32,
        pub projects: Vec<String>,
        /// Projects whose searches fail with HTTP 500.
        pub failing: Vec<String>,
        pub calls: Mutex<Vec<(String, u32, u32)>>,
    }

    impl FakeSource {
        pub fn new(issues: Vec<Issue>) -> Self {
            Self {
                issues,
                server_cap: u32::MAX,
                projects: Vec::new(),
                failing: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl IssueSource for FakeSource {
        async fn search_page(&self, jql: &str, start_at: u32, max_results: u32) -> Result<SearchResult> {
            self.calls
                .lock()
                .unwrap()
                .push((jql.to_string(), start_at, max_results));

            // only `project = 'KEY' ...` queries are filtered
            let project = jql
                .strip_prefix("project = '")
                .and_then(|rest| rest.split('\'').next());
            if let Some(project) = project.filter(|p| self.failing.iter().any(|f| f.as_str() == *p)) {
                return Err(Error::ApiError {
                    status: 500,
                    message: format!("search failed for {}", project),
                });
            }

            let matching: Vec<&Issue> = self
                .issues
                .iter()
                .filter(|i| project.is_none_or(|p| i.project_key().as_deref() == Some(p)))
                .collect();

            let limit = max_results.min(self.server_cap);
            let issues: Vec<Issue> = matching
                .iter()
                .skip(start_at as usize)
                .take(limit as usize)
                .map(|i| (*i).clone())
                .collect();

            Ok(SearchResult {
                start_at,
                max_results: limit,
                total: matching.len() as u32,
                issues,
            })
        }

        async fn project_keys(&self) -> Result<Vec<String>> {
            Ok(self.projects.clone())
        }
    }

    pub fn issue(key: &str, created: &str) -> Issue {
        serde_json::from_value(serde_json::json!({
            "id": format!("id-{}", key),
            "key": key,
            "fields": {"created": created}
        }))
        .unwrap()
    }
}
