use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A photo committed to the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub saved_as: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Per-file summary carried in a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub fieldname: String,
    pub originalname: String,
    #[serde(rename = "savedAs")]
    pub saved_as: String,
    pub path: String,
    pub size: u64,
}

impl UploadRecord {
    pub fn new(fieldname: &str, originalname: &str, stored: &StoredFile) -> Self {
        Self {
            fieldname: fieldname.to_string(),
            originalname: originalname.to_string(),
            saved_as: stored.saved_as.clone(),
            path: stored.path.to_string_lossy().into_owned(),
            size: stored.size,
        }
    }
}

/// One line of the upload log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: String,
    pub ip: String,
    pub records: Vec<UploadRecord>,
}

impl LogEntry {
    pub fn new(at: DateTime<Utc>, ip: impl Into<String>, records: Vec<UploadRecord>) -> Self {
        Self {
            // Millisecond precision with a trailing Z, e.g. 2024-05-01T12:00:00.000Z
            time: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ip: ip.into(),
            records,
        }
    }
}
