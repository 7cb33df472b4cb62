//! JSON directory sink
//!
//! One pretty-printed file per session, `{dir}/{session_id}.json`.
//! Each write lands in a temporary sibling first and is renamed into place,
//! so readers never observe a half-written record.

use crate::error::StorageError;
use crate::record::SessionRecord;
use crate::sink::StorageSink;
use crate::target::TargetConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Writes session snapshots as JSON files
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the snapshot of `session_id`
    #[must_use]
    pub fn record_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    /// Read back the stored snapshot of one session
    ///
    /// # Errors
    /// Returns an error if the file is missing or does not parse.
    pub async fn read(&self, session_id: &str) -> Result<SessionRecord, StorageError> {
        let bytes = tokio::fs::read(self.record_path(session_id)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn is_safe_file_stem(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl StorageSink for JsonDirSink {
    fn kind(&self) -> &'static str {
        "json_dir"
    }

    async fn initialize(&self, _target: &TargetConfig) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let meta = tokio::fs::metadata(&self.dir).await?;
        if meta.permissions().readonly() {
            return Err(StorageError::Unavailable(format!(
                "{} is read-only",
                self.dir.display()
            )));
        }
        Ok(())
    }

    async fn write(
        &self,
        _target: &TargetConfig,
        record: &SessionRecord,
    ) -> Result<(), StorageError> {
        if !is_safe_file_stem(&record.session_id) {
            return Err(StorageError::Rejected(format!(
                "session id '{}' is not usable as a file name",
                record.session_id
            )));
        }
        let path = self.record_path(&record.session_id);
        let tmp = tmp_write_path(&path);
        let body = record.to_json()?;
        tokio::fs::write(&tmp, body.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
