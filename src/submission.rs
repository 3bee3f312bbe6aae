//! Finished reports and where they are written

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Characters replaced in file name components
const UNSAFE_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Byte cap per component; two of them plus `_` and `.txt` stay well under
/// the usual 255-byte name limit
const MAX_COMPONENT_BYTES: usize = 100;

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Failed to create submissions directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write submission {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything collected by a completed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub surname: String,
    pub room: String,
    pub studio: String,
    pub date: String,
    pub battery: String,
    /// Rendered checklist, one item per line
    pub checklist: String,
}

impl SubmissionRecord {
    /// Report text with platform line endings and a trailing newline
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Фамилия: {}", self.surname),
            format!("Кабинет: {}", self.room),
            format!("Студия: {}", self.studio),
            format!("Дата: {}", self.date),
            format!("Заряд телефона: {}%", self.battery),
            String::new(),
            "Чек-лист:".to_string(),
        ];
        lines.extend(self.checklist.lines().map(str::to_string));

        let mut report = lines.join(LINE_ENDING);
        report.push_str(LINE_ENDING);
        report
    }

    /// `<surname>_<date>.txt` with periods in the date turned into hyphens.
    ///
    /// Both components are sanitized; identical surname and date map to the
    /// same name.
    pub fn file_name(&self) -> String {
        let date = self.date.replace('.', "-");
        format!(
            "{}_{}.txt",
            sanitize_component(&self.surname),
            sanitize_component(&date)
        )
    }
}

/// Make a user-supplied string safe to use inside a file name
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || UNSAFE_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Leading dots would make hidden files or `..`
    let cleaned = cleaned.trim_start_matches('.');

    let mut component = String::with_capacity(cleaned.len().min(MAX_COMPONENT_BYTES));
    for c in cleaned.chars() {
        if component.len() + c.len_utf8() > MAX_COMPONENT_BYTES {
            break;
        }
        component.push(c);
    }
    if component.is_empty() {
        component.push('_');
    }
    component
}

/// Destination for finished reports
pub trait SubmissionSink: Send + Sync {
    /// Persist the record, returning where it went
    fn write(&self, record: &SubmissionRecord) -> Result<PathBuf, SubmissionError>;
}

impl<T: SubmissionSink + ?Sized> SubmissionSink for Arc<T> {
    fn write(&self, record: &SubmissionRecord) -> Result<PathBuf, SubmissionError> {
        (**self).write(record)
    }
}

/// Writes each report to its own text file under a directory
#[derive(Debug, Clone)]
pub struct FileSubmissionSink {
    dir: PathBuf,
}

impl FileSubmissionSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[allow(dead_code)] // Used in tests
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SubmissionSink for FileSubmissionSink {
    fn write(&self, record: &SubmissionRecord) -> Result<PathBuf, SubmissionError> {
        fs::create_dir_all(&self.dir).map_err(|source| SubmissionError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(record.file_name());
        let write = |path: &Path| -> std::io::Result<()> {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(record.render().as_bytes())?;
            writer.flush()?;
            writer.get_ref().sync_all()
        };
        write(&path).map_err(|source| SubmissionError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}
