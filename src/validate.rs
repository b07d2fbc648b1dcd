// src/validate.rs
//! Shallow schema sniff over the site's JSON data files.
//!
//! Each tracked file must hold a JSON array; only the first element's keys are
//! checked against the required list. Malformed JSON, unreadable files and
//! non-array values make the run invalid. A missing file, an empty array, or
//! missing fields are reported but do not.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde_json::Value as Json;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A tracked JSON file plus the keys its first array element must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTarget {
    pub path: PathBuf,
    pub required: Vec<&'static str>,
}

impl ValidationTarget {
    pub fn new(path: impl Into<PathBuf>, required: &[&'static str]) -> Self {
        Self {
            path: path.into(),
            required: required.to_vec(),
        }
    }

    /// File name for status lines.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub const SUBSTACK_FIELDS: &[&str] = &["title", "url", "author", "date", "excerpt"];
pub const LINKEDIN_FIELDS: &[&str] = &["type", "author", "content", "url", "date"];
pub const DAILY_FIELDS: &[&str] = &["date", "title", "filename", "sources"];
pub const WEEKLY_FIELDS: &[&str] = &["week", "title", "filename", "stories"];
pub const MONTHLY_FIELDS: &[&str] = &["month", "title", "filename", "stories"];

/// The five files the site ships, rooted at `data_dir`.
pub fn default_targets(data_dir: &Path) -> Vec<ValidationTarget> {
    vec![
        ValidationTarget::new(data_dir.join("substack.json"), SUBSTACK_FIELDS),
        ValidationTarget::new(data_dir.join("linkedin.json"), LINKEDIN_FIELDS),
        ValidationTarget::new(data_dir.join("daily.json"), DAILY_FIELDS),
        ValidationTarget::new(data_dir.join("weekly.json"), WEEKLY_FIELDS),
        ValidationTarget::new(data_dir.join("monthly.json"), MONTHLY_FIELDS),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    NotFound,
    /// Present but could not be read as UTF-8 text.
    Unreadable(String),
    InvalidJson(String),
    /// JSON type name of the top-level value.
    WrongType(&'static str),
    Empty,
    MissingFields(Vec<String>),
    Valid(usize),
}

impl FileStatus {
    /// Whether this status makes the whole run invalid.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FileStatus::Unreadable(_) | FileStatus::InvalidJson(_) | FileStatus::WrongType(_)
        )
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::NotFound => "not-found",
            FileStatus::Unreadable(_) => "unreadable",
            FileStatus::InvalidJson(_) => "invalid-json",
            FileStatus::WrongType(_) => "wrong-type",
            FileStatus::Empty => "empty",
            FileStatus::MissingFields(_) => "missing-fields",
            FileStatus::Valid(_) => "valid",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::NotFound => write!(f, "File not found"),
            FileStatus::Unreadable(e) => write!(f, "Unreadable - {e}"),
            FileStatus::InvalidJson(e) => write!(f, "Invalid JSON - {e}"),
            FileStatus::WrongType(t) => write!(f, "Expected array, got {t}"),
            FileStatus::Empty => write!(f, "Empty array"),
            FileStatus::MissingFields(m) => write!(f, "Missing fields: {m:?}"),
            FileStatus::Valid(n) => write!(f, "Valid ({n} items)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub path: PathBuf,
    pub status: FileStatus,
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub files: Vec<FileReport>,
    pub all_valid: bool,
}

fn json_type_name(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Required keys absent from `first`, in required order. A non-object first
/// element has no keys at all.
pub fn missing_fields(first: &Json, required: &[&str]) -> Vec<String> {
    let obj = first.as_object();
    required
        .iter()
        .filter(|k| obj.map_or(true, |o| !o.contains_key(**k)))
        .map(|k| k.to_string())
        .collect()
}

/// Classify already-read file content.
pub fn check_content(content: &str, required: &[&str]) -> FileStatus {
    let value: Json = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => return FileStatus::InvalidJson(e.to_string()),
    };
    let Json::Array(items) = &value else {
        return FileStatus::WrongType(json_type_name(&value));
    };
    let Some(first) = items.first() else {
        return FileStatus::Empty;
    };
    let missing = missing_fields(first, required);
    if missing.is_empty() {
        FileStatus::Valid(items.len())
    } else {
        FileStatus::MissingFields(missing)
    }
}

pub fn validate_file(target: &ValidationTarget) -> FileStatus {
    match fs::read_to_string(&target.path) {
        Ok(content) => check_content(&content, &target.required),
        Err(e) if e.kind() == ErrorKind::NotFound => FileStatus::NotFound,
        Err(e) => FileStatus::Unreadable(e.to_string()),
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("validate_files_total", "Validated data files by status.");
    });
}

/// Check every target in order. `all_valid` is false only when some file is
/// fatally broken.
pub fn validate_all(targets: &[ValidationTarget]) -> ValidationReport {
    ensure_metrics_described();

    let mut all_valid = true;
    let mut files = Vec::with_capacity(targets.len());
    for t in targets {
        let status = validate_file(t);
        let name = t.name();
        counter!("validate_files_total", "status" => status.label()).increment(1);

        match &status {
            s if s.is_fatal() => {
                all_valid = false;
                tracing::error!(target: "validate", file = %name, status = s.label(), detail = %s);
            }
            FileStatus::NotFound | FileStatus::MissingFields(_) => {
                tracing::warn!(target: "validate", file = %name, status = status.label(), detail = %status);
            }
            _ => {
                tracing::info!(target: "validate", file = %name, status = status.label(), detail = %status);
            }
        }

        files.push(FileReport {
            name,
            path: t.path.clone(),
            status,
        });
    }

    ValidationReport { files, all_valid }
}
