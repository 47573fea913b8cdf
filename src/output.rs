use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::rows::Row;

pub const DEFAULT_ISSUES_FILE: &str = "issues.csv";
pub const DEFAULT_CHANGELOG_FILE: &str = "changelog.csv";
pub const DEFAULT_RAW_FILE: &str = "raw.csv";

/// Writes a header row from `R::COLUMNS`, then one record per row.
///
/// An empty slice still produces the header, so downstream tools always see
/// the column set.
pub fn write_table<R: Row, P: AsRef<Path>>(path: P, rows: &[R]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(File::create(path)?));
    writer.write_record(R::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

/// Where a run writes its three files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub raw: PathBuf,
    pub issues: PathBuf,
    pub changelog: PathBuf,
}

impl OutputPaths {
    /// Default names `{domain}-{project}-{file}`; `all` stands in for a missing project.
    pub fn for_run(domain: &str, project: Option<&str>) -> Self {
        let project = project.filter(|p| !p.is_empty()).unwrap_or("all");
        let name = |file: &str| PathBuf::from(format!("{}-{}-{}", domain, project, file));

        Self {
            raw: name(DEFAULT_RAW_FILE),
            issues: name(DEFAULT_ISSUES_FILE),
            changelog: name(DEFAULT_CHANGELOG_FILE),
        }
    }

    /// Names for reprocessing an existing dump: `X-raw.csv` yields `X-issues.csv`
    /// and `X-changelog.csv` next to it.
    pub fn beside_raw<P: AsRef<Path>>(raw: P) -> Self {
        let raw = raw.as_ref().to_path_buf();
        let file_name = raw
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name.strip_suffix(".gz").unwrap_or(&file_name);
        let stem = stem.strip_suffix(".csv").unwrap_or(stem);
        let prefix = stem.strip_suffix("-raw").unwrap_or(stem);
        let prefix = if prefix.is_empty() { "all" } else { prefix };

        let sibling = |file: &str| raw.with_file_name(format!("{}-{}", prefix, file));
        Self {
            issues: sibling(DEFAULT_ISSUES_FILE),
            changelog: sibling(DEFAULT_CHANGELOG_FILE),
            raw,
        }
    }

    /// Places every relative path under `dir`.
    pub fn in_dir<P: AsRef<Path>>(self, dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            raw: dir.join(self.raw),
            issues: dir.join(self.issues),
            changelog: dir.join(self.changelog),
        }
    }

    pub fn with_raw(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.raw = path;
        }
        self
    }

    pub fn with_issues(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.issues = path;
        }
        self
    }

    pub fn with_changelog(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.changelog = path;
        }
        self
    }
}

/// Server host with any port removed, used as the file name prefix.
pub fn domain_of(base_url: &str) -> Option<String> {
    let url = url::Url::parse(base_url).ok()?;
    url.host_str().map(str::to_string)
}
