//! jira-extractor - dump a JIRA project's issues and changelog to CSV.

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, fmt::MakeWriter, prelude::*};

use jira_extractor::{
    AnonymizeConfig, AppConfig, Auth, CreatedRange, ExtractJob, JiraClient, JiraConfig,
    OutputPaths, RetryPolicy, RunSummary, domain_of, run_extract_with_progress, run_reprocess,
};

/// Extract issues and their changelog from a JIRA server into CSV files.
#[derive(Parser, Debug)]
#[command(name = "jira-extractor")]
#[command(version)]
pub struct Cli {
    /// URL of the JIRA server
    #[arg(short, long, env = "JIRA_URL")]
    server: Option<String>,

    /// Project key; every visible project when omitted
    #[arg(long)]
    project: Option<String>,

    /// JIRA username
    #[arg(short, long, env = "JIRA_USER")]
    username: Option<String>,

    /// Password or API token for --username
    #[arg(short, long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    password: Option<String>,

    /// Personal access token, used when no username is given
    #[arg(long, env = "JIRA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Issues table path [default: <domain>-<project>-issues.csv]
    #[arg(long)]
    issue_file: Option<PathBuf>,

    /// Changelog table path [default: <domain>-<project>-changelog.csv]
    #[arg(long)]
    changelog_file: Option<PathBuf>,

    /// Raw dump path, gzip-compressed when it ends in .gz [default: <domain>-<project>-raw.csv]
    #[arg(long)]
    raw_file: Option<PathBuf>,

    /// Directory for the default file names
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Earliest creation date, inclusive
    #[arg(long, value_name = "YYYY-MM-DD")]
    start_date: Option<String>,

    /// Latest creation date, inclusive
    #[arg(long, value_name = "YYYY-MM-DD")]
    end_date: Option<String>,

    /// Replace user keys and names with U1, U2, ... tokens
    #[arg(long)]
    anonymize: bool,

    /// Column to anonymize instead of the defaults; prefix changelog columns with
    /// `changelog.` (implies --anonymize)
    #[arg(long = "anonymize-field", value_name = "COLUMN")]
    anonymize_fields: Vec<String>,

    /// Rebuild the tables from an existing raw dump instead of contacting the server
    #[arg(long, value_name = "RAW_CSV")]
    parse_file: Option<PathBuf>,

    /// Issues requested per page [default: 1000]
    #[arg(short = 'b', long)]
    block_size: Option<u32>,

    /// Retries for rate-limited, failed or timed-out requests [default: 3]
    #[arg(long)]
    max_retries: Option<u32>,

    /// REST API version [default: 2]
    #[arg(long)]
    api_version: Option<String>,

    /// JSON config file [default: <config dir>/jira-extractor/config.json]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store the server, username, block size, retries, API version, output
    /// directory and anonymize columns given here in the config file, then exit
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Hide the progress spinner
    #[arg(short, long)]
    quiet: bool,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let progress = progress_bar(cli.quiet)?;
    init_tracing(cli.verbose, cli.log_file.as_deref(), &progress)?;

    if let Err(e) = run(cli, &progress).await {
        progress.finish_and_clear();
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Stderr writer that clears the spinner while a log line is printed.
#[derive(Clone)]
struct SpinnerWriter(ProgressBar);

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for SpinnerWriter {
    type Writer = SpinnerWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn init_tracing(verbose: bool, log_file: Option<&Path>, progress: &ProgressBar) -> Result<()> {
    let default_filter = if verbose {
        "jira_extractor=debug,info"
    } else {
        "jira_extractor=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(SpinnerWriter(progress.clone())))
        .with(file_layer)
        .init();
    Ok(())
}

async fn run(cli: Cli, progress: &ProgressBar) -> Result<()> {
    let file_config = AppConfig::load_or_default(cli.config.as_deref())
        .await
        .context("failed to load config file")?;

    if cli.save_config {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => AppConfig::default_path()?,
        };
        settings_to_save(&cli, file_config)
            .save(&path)
            .await
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        info!(path = %path.display(), "config file saved");
        return Ok(());
    }

    let anonymize = anonymize_config(&cli, &file_config);

    if let Some(raw) = &cli.parse_file {
        let mut paths = OutputPaths::beside_raw(raw);
        if let Some(dir) = cli.output_dir.as_ref().or(file_config.output_dir.as_ref()) {
            paths.issues = dir.join(file_name(&paths.issues));
            paths.changelog = dir.join(file_name(&paths.changelog));
        }
        let paths = paths
            .with_issues(cli.issue_file.clone())
            .with_changelog(cli.changelog_file.clone());

        let summary = run_reprocess(raw, anonymize, &paths)
            .with_context(|| format!("failed to reprocess {}", raw.display()))?;
        report(&summary, &paths);
        return Ok(());
    }

    let server = cli
        .server
        .clone()
        .or(file_config.server.clone())
        .context("no server given, use --server or JIRA_URL")?;

    let username = cli.username.clone().or(file_config.username.clone());
    let auth = match (username, cli.password.clone(), cli.token.clone()) {
        (Some(username), Some(api_token), _) => Auth::Basic { username, api_token },
        (Some(username), None, _) => {
            bail!("no password or API token given for user {}", username)
        }
        (None, _, Some(token)) => Auth::Bearer { token },
        (None, _, None) => Auth::Anonymous,
    };

    let retries = cli.max_retries.or(file_config.max_retries).unwrap_or(3);
    let mut config = JiraConfig::new(&server, auth)?.with_retry(RetryPolicy::new(retries));
    if let Some(version) = cli.api_version.clone().or(file_config.api_version.clone()) {
        config = config.with_api_version(version);
    }
    let client = JiraClient::new(config)?;

    let domain = domain_of(&server).unwrap_or_else(|| "jira".to_string());
    let mut paths = OutputPaths::for_run(&domain, cli.project.as_deref());
    if let Some(dir) = cli.output_dir.clone().or(file_config.output_dir.clone()) {
        paths = paths.in_dir(dir);
    }
    let paths = paths
        .with_raw(cli.raw_file.clone())
        .with_issues(cli.issue_file.clone())
        .with_changelog(cli.changelog_file.clone());

    let range = CreatedRange::parse(cli.start_date.as_deref(), cli.end_date.as_deref())?;
    let block_size = cli.block_size.or(file_config.block_size).unwrap_or(1000);

    let mut job = ExtractJob::new(server, cli.project.clone(), paths)
        .range(range)
        .page_size(block_size);
    if let Some(fields) = anonymize {
        job = job.anonymize(fields);
    }

    info!(
        server = %job.server,
        project = job.project.as_deref().unwrap_or("all"),
        block_size,
        "starting extraction"
    );

    progress.set_message("connecting");
    progress.enable_steady_tick(Duration::from_millis(120));
    let result = run_extract_with_progress(&client, &job, |page| {
        let message = match page.total {
            Some(total) => format!("{}: {}/{} issues", page.project, page.fetched, total),
            None => format!("{}: {} issues", page.project, page.fetched),
        };
        progress.set_message(message);
    })
    .await;
    progress.finish_and_clear();

    let summary = result.with_context(|| format!("extraction from {} failed", job.server))?;
    if !summary.skipped_projects.is_empty() {
        info!(skipped = ?summary.skipped_projects, "some projects could not be extracted");
    }
    report(&summary, &job.paths);
    Ok(())
}

fn anonymize_config(cli: &Cli, file_config: &AppConfig) -> Option<AnonymizeConfig> {
    if !cli.anonymize_fields.is_empty() {
        return Some(AnonymizeConfig::from_field_names(&cli.anonymize_fields));
    }
    if !cli.anonymize {
        return None;
    }
    Some(match &file_config.anonymize_fields {
        Some(fields) => AnonymizeConfig::from_field_names(fields),
        None => AnonymizeConfig::default(),
    })
}

/// The loaded config file with the flags given on this command line written over it.
fn settings_to_save(cli: &Cli, file_config: AppConfig) -> AppConfig {
    AppConfig {
        server: cli.server.clone().or(file_config.server),
        username: cli.username.clone().or(file_config.username),
        api_version: cli.api_version.clone().or(file_config.api_version),
        block_size: cli.block_size.or(file_config.block_size),
        max_retries: cli.max_retries.or(file_config.max_retries),
        anonymize_fields: Some(cli.anonymize_fields.clone())
            .filter(|fields| !fields.is_empty())
            .or(file_config.anonymize_fields),
        output_dir: cli.output_dir.clone().or(file_config.output_dir),
    }
}

fn file_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}

fn progress_bar(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner} [{elapsed}] {msg}")?);
    Ok(bar)
}

fn report(summary: &RunSummary, paths: &OutputPaths) {
    info!(
        issues = summary.issues,
        changelog_entries = summary.changelog_entries,
        pages = summary.pages,
        duplicates = summary.duplicates,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "done"
    );
    info!(
        issues = %paths.issues.display(),
        changelog = %paths.changelog.display(),
        "tables written"
    );
}
