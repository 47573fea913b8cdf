use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::anonymize::{AnonymizeConfig, Anonymizer};
use crate::changelog_parser::ChangelogParser;
use crate::client::JiraClient;
use crate::error::Result;
use crate::extractor::{ExtractStats, Extractor, IssueSource};
use crate::flatten::Tables;
use crate::output::{OutputPaths, write_table};
use crate::raw_store::{RawReader, RawWriter};
use crate::time_filter::CreatedRange;

/// Everything one extraction run needs.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    /// Server the data comes from, for logging.
    pub server: String,
    /// `None` extracts every project visible to the session.
    pub project: Option<String>,
    pub range: CreatedRange,
    pub page_size: u32,
    pub anonymize: bool,
    pub fields: AnonymizeConfig,
    pub paths: OutputPaths,
}

impl ExtractJob {
    pub fn new(server: impl Into<String>, project: Option<String>, paths: OutputPaths) -> Self {
        Self {
            server: server.into(),
            project,
            range: CreatedRange::new(),
            page_size: 1000,
            anonymize: false,
            fields: AnonymizeConfig::default(),
            paths,
        }
    }

    pub fn range(mut self, range: CreatedRange) -> Self {
        self.range = range;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn anonymize(mut self, fields: AnonymizeConfig) -> Self {
        self.anonymize = true;
        self.fields = fields;
        self
    }

    fn anonymizer(&self) -> Result<Option<Anonymizer>> {
        if self.anonymize {
            Anonymizer::new(self.fields.clone()).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Progress report handed to the caller after every page.
#[derive(Debug, Clone, Copy)]
pub struct PageProgress<'a> {
    pub project: &'a str,
    pub fetched: usize,
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub issues: usize,
    pub changelog_entries: usize,
    pub pages: usize,
    pub duplicates: usize,
    /// Projects given up on in all-projects mode.
    pub skipped_projects: Vec<String>,
    /// Distinct values replaced by pseudonyms; 0 when not anonymizing.
    pub anonymized_values: usize,
    pub stats: ExtractStats,
    pub elapsed: Duration,
}

/// Verifies credentials, then extracts, flattens and writes.
pub async fn run_extract(client: &JiraClient, job: &ExtractJob) -> Result<RunSummary> {
    run_extract_with_progress(client, job, |_| {}).await
}

pub async fn run_extract_with_progress<F>(
    client: &JiraClient,
    job: &ExtractJob,
    on_page: F,
) -> Result<RunSummary>
where
    F: FnMut(PageProgress<'_>),
{
    match client.verify_credentials().await? {
        Some(user) => info!(
            user = user.display_name.as_deref().or(user.identity()).unwrap_or("?"),
            "authenticated"
        ),
        None => info!("no credentials given, continuing anonymously"),
    }

    extract(client, job, on_page).await
}

/// The extraction run against any issue source.
///
/// Each page is appended to the raw dump before it is flattened, so a run that
/// fails midway still leaves every fetched page on disk.
pub async fn extract<S, F>(source: &S, job: &ExtractJob, mut on_page: F) -> Result<RunSummary>
where
    S: IssueSource + ?Sized,
    F: FnMut(PageProgress<'_>),
{
    let started = Instant::now();
    job.range.is_valid()?;
    let mut anonymizer = job.anonymizer()?;
    let extractor = Extractor::new(source, job.page_size);

    let projects = match &job.project {
        Some(project) => vec![project.clone()],
        None => {
            let keys = extractor.projects().await?;
            info!(projects = keys.len(), server = %job.server, "extracting every visible project");
            keys
        }
    };
    let all_projects = job.project.is_none();

    let mut raw = RawWriter::create(&job.paths.raw)?;
    let mut tables = Tables::new();
    let mut stats = ExtractStats::default();
    let mut skipped = Vec::new();

    for project in &projects {
        let mut stream = extractor.stream(project, &job.range)?;
        let mut fetched = 0;

        loop {
            let page = match stream.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) if all_projects && e.is_project_scoped() => {
                    warn!(project = %project, error = %e, "skipping project");
                    skipped.push(project.clone());
                    break;
                }
                Err(e) => return Err(e),
            };

            raw.append(&page)?;
            tables.extend(&page);
            fetched += page.len();
            on_page(PageProgress {
                project,
                fetched,
                total: stream.stats().reported_total,
            });
        }

        stats.merge(stream.stats());
        info!(project = %project, issues = fetched, "project done");
    }

    let raw_rows = raw.finish()?;
    debug!(rows = raw_rows, path = %job.paths.raw.display(), "raw dump closed");

    let anonymized_values = match anonymizer.as_mut() {
        Some(anonymizer) => {
            info!("anonymizing");
            anonymizer.anonymize(&mut tables);
            anonymizer.len()
        }
        None => 0,
    };

    write_tables(&tables, &job.paths)?;

    let summary = RunSummary {
        issues: tables.issues.len(),
        changelog_entries: tables.changelog.len(),
        pages: stats.pages,
        duplicates: stats.duplicates,
        skipped_projects: skipped,
        anonymized_values,
        stats,
        elapsed: started.elapsed(),
    };
    info!(
        issues = summary.issues,
        changelog_entries = summary.changelog_entries,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "extraction finished"
    );
    Ok(summary)
}

/// Rebuilds the tables from an existing raw dump without contacting the server.
pub fn run_reprocess(
    raw_path: &Path,
    anonymize: Option<AnonymizeConfig>,
    paths: &OutputPaths,
) -> Result<RunSummary> {
    let started = Instant::now();
    let mut anonymizer = anonymize.map(Anonymizer::new).transpose()?;

    info!(path = %raw_path.display(), "reprocessing raw dump");
    let mut reader = RawReader::open(raw_path)?;
    let mut tables = Tables::new();
    while let Some(issue) = reader.next_issue()? {
        tables.extend(std::iter::once(&issue));
    }

    let anonymized_values = match anonymizer.as_mut() {
        Some(anonymizer) => {
            anonymizer.anonymize(&mut tables);
            anonymizer.len()
        }
        None => 0,
    };

    write_tables(&tables, paths)?;

    let summary = RunSummary {
        issues: tables.issues.len(),
        changelog_entries: tables.changelog.len(),
        anonymized_values,
        elapsed: started.elapsed(),
        ..Default::default()
    };
    info!(
        issues = summary.issues,
        changelog_entries = summary.changelog_entries,
        "reprocessing finished"
    );
    Ok(summary)
}

fn write_tables(tables: &Tables, paths: &OutputPaths) -> Result<()> {
    for (field, count) in ChangelogParser::generate_change_summary(&tables.changelog) {
        debug!(field = %field, changes = count, "changelog field");
    }

    write_table(&paths.issues, &tables.issues)?;
    write_table(&paths.changelog, &tables.changelog)?;
    Ok(())
}
