use crate::models::LogEntry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only sink for per-request upload summaries
#[async_trait]
pub trait UploadLog: Send + Sync {
    async fn append(&self, entry: &LogEntry) -> std::io::Result<()>;
}

/// JSON lines file. Each entry is serialized into a single buffer and written
/// under a process-wide lock through a freshly opened append-mode handle, so
/// lines from concurrent requests never interleave.
#[derive(Debug)]
pub struct JsonlUploadLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlUploadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadLog for JsonlUploadLog {
    async fn append(&self, entry: &LogEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
