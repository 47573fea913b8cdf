use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Changelog, Issue, IssueFields};

/// Column order of the raw dump.
pub const RAW_COLUMNS: &[&str] = &["id", "key", "self", "fields", "changelog"];

/// One raw dump line: the issue as JIRA returned it, with `fields` and
/// `changelog` kept as compact JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RawRecord {
    id: String,
    key: String,
    #[serde(rename = "self")]
    self_url: String,
    fields: String,
    changelog: String,
}

impl RawRecord {
    fn from_issue(issue: &Issue) -> Result<Self> {
        let changelog = match &issue.changelog {
            Some(changelog) => serde_json::to_string(changelog)?,
            None => String::new(),
        };

        Ok(Self {
            id: issue.id.clone(),
            key: issue.key.clone(),
            self_url: issue.self_url.clone().unwrap_or_default(),
            fields: serde_json::to_string(&issue.fields)?,
            changelog,
        })
    }

    /// A header line repeated mid-file, as left by concatenated dumps.
    fn is_repeated_header(&self) -> bool {
        self.changelog == "changelog"
    }

    fn into_issue(self) -> Result<Issue> {
        let fields: IssueFields = if self.fields.is_empty() {
            IssueFields::default()
        } else {
            serde_json::from_str(&self.fields)?
        };
        let changelog: Option<Changelog> = if self.changelog.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&self.changelog)?)
        };

        Ok(Issue {
            id: self.id,
            key: self.key,
            self_url: Some(self.self_url).filter(|s| !s.is_empty()),
            fields,
            changelog,
        })
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

impl Sink {
    fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

/// Appends issues to the raw dump page by page.
///
/// Every page is flushed before `append` returns, so an aborted run leaves
/// all pages fetched so far on disk.
pub struct RawWriter {
    writer: csv::Writer<Sink>,
    path: PathBuf,
    rows: usize,
}

impl RawWriter {
    /// Creates (or truncates) the dump and writes its header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(&path)?);
        let sink = if is_gzip(&path) {
            Sink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Sink::Plain(file)
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        writer.write_record(RAW_COLUMNS)?;
        writer.flush()?;

        debug!(path = %path.display(), "raw dump created");
        Ok(Self {
            writer,
            path,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn append(&mut self, issues: &[Issue]) -> Result<()> {
        for issue in issues {
            self.writer.serialize(RawRecord::from_issue(issue)?)?;
        }
        self.writer.flush()?;
        self.rows += issues.len();
        Ok(())
    }

    /// Flushes and closes the dump, completing the gzip trailer if any.
    pub fn finish(self) -> Result<usize> {
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| Error::IoError(e.into_error()))?;
        sink.finish()?;
        Ok(self.rows)
    }
}

/// Reads a raw dump back into issues, one record at a time.
pub struct RawReader {
    reader: csv::Reader<Box<dyn Read>>,
    skipped_headers: usize,
}

impl RawReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        let input: Box<dyn Read> = if is_gzip(path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(input);

        Ok(Self {
            reader,
            skipped_headers: 0,
        })
    }

    pub fn next_issue(&mut self) -> Result<Option<Issue>> {
        loop {
            let Some(record) = self.reader.deserialize::<RawRecord>().next() else {
                return Ok(None);
            };
            let record = record?;
            if record.is_repeated_header() {
                self.skipped_headers += 1;
                warn!("skipping repeated header line in raw dump");
                continue;
            }
            return record.into_issue().map(Some);
        }
    }

    /// Repeated header lines skipped so far.
    pub fn skipped_headers(&self) -> usize {
        self.skipped_headers
    }

    pub fn read_all(mut self) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        while let Some(issue) = self.next_issue()? {
            issues.push(issue);
        }
        Ok(issues)
    }
}

impl Iterator for RawReader {
    type Item = Result<Issue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_issue().transpose()
    }
}

/// Reads a whole raw dump.
pub fn read_raw<P: AsRef<Path>>(path: P) -> Result<Vec<Issue>> {
    RawReader::open(path)?.read_all()
}
