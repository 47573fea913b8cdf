pub mod anonymize;
pub mod changelog_parser;
pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod flatten;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod raw_store;
pub mod rows;
pub mod time_filter;

pub use client::{Auth, JiraClient, JiraConfig, RetryPolicy};
pub use error::{Error, Result};
pub use models::*;

// Extraction re-exports
pub use extractor::{ExtractStats, Extractor, IssueSource, IssueStream};

// Time filter re-exports
pub use time_filter::{CreatedRange, parse_jira_datetime};

// Table re-exports
pub use changelog_parser::ChangelogParser;
pub use flatten::{Tables, flatten, flatten_issue};
pub use rows::{ChangelogRow, IssueRow, Row};

// Anonymization re-exports
pub use anonymize::{AnonymizeConfig, Anonymizer, anonymize};

// File re-exports
pub use output::{OutputPaths, domain_of, write_table};
pub use raw_store::{RawReader, RawWriter, read_raw};

// Config re-export
pub use config::AppConfig;

// Pipeline re-exports
pub use pipeline::{
    ExtractJob, PageProgress, RunSummary, extract, run_extract, run_extract_with_progress,
    run_reprocess,
};
