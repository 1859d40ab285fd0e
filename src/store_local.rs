//! Local [`ReportStore`] backed by an origin-scoped key-value file.
//!
//! The file models browser storage for one origin: a JSON object mapping
//! string keys to string values. The report collection is a single
//! JSON-serialized array stored under one well-known key (default
//! `governanceReports`). Other keys in the file are preserved untouched.
//!
//! ```json
//! { "governanceReports": "[{\"id\":1718000000000,\"title\":\"...\"}]" }
//! ```
//!
//! # Failure modes
//!
//! | Situation | Result |
//! |-----------|--------|
//! | file or key missing | empty collection |
//! | file unreadable or corrupt | `StorageUnavailable` |
//! | serialized origin exceeds `quota_bytes` | `PersistenceError`, nothing written |
//! | write or rename fails | `PersistenceError` |
//!
//! Writes go to a sibling temp file that is renamed into place. Appends in
//! one process are serialized by an async mutex; two processes appending at
//! once are last-write-wins on the whole collection.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use govwatch_core::store::{assign_ids, now_millis, ReportStore};
use govwatch_core::{Report, Result, TrackerError};

use crate::config::LocalStorageConfig;

type Origin = BTreeMap<String, String>;

pub struct LocalStore {
    path: PathBuf,
    key: String,
    quota_bytes: usize,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>, quota_bytes: usize) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            quota_bytes,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &LocalStorageConfig) -> Self {
        Self::new(&config.path, &config.key, config.quota_bytes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_origin(&self) -> Result<Origin> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Origin::new()),
            Err(e) => {
                return Err(TrackerError::StorageUnavailable(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Origin::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            TrackerError::StorageUnavailable(format!("{} is corrupt: {}", self.path.display(), e))
        })
    }

    fn reports_in(&self, origin: &Origin) -> Result<Vec<Report>> {
        match origin.get(&self.key) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str::<Option<Vec<Report>>>(raw)
                .map(Option::unwrap_or_default)
                .map_err(|e| {
                    TrackerError::StorageUnavailable(format!(
                        "value under '{}' is not a report list: {}",
                        self.key, e
                    ))
                }),
        }
    }

    /// Read-modify-write under the write lock.
    async fn update<F>(&self, mutate: F) -> Result<usize>
    where
        F: FnOnce(&mut Vec<Report>) -> usize + Send,
    {
        let _guard = self.write_lock.lock().await;

        // A backend we cannot read cannot be written safely either.
        let as_write_error = |e: TrackerError| match e {
            TrackerError::StorageUnavailable(msg) => TrackerError::PersistenceError(msg),
            other => other,
        };
        let mut origin = self.read_origin().await.map_err(as_write_error)?;
        let mut reports = self.reports_in(&origin).map_err(as_write_error)?;

        let changed = mutate(&mut reports);

        let value = serde_json::to_string(&reports)
            .map_err(|e| TrackerError::PersistenceError(e.to_string()))?;
        origin.insert(self.key.clone(), value);
        let serialized = serde_json::to_string(&origin)
            .map_err(|e| TrackerError::PersistenceError(e.to_string()))?;

        if serialized.len() > self.quota_bytes {
            return Err(TrackerError::PersistenceError(format!(
                "storage quota exceeded: {} bytes needed, {} allowed",
                serialized.len(),
                self.quota_bytes
            )));
        }

        self.write_atomically(&serialized).await?;
        debug!(path = %self.path.display(), bytes = serialized.len(), "origin written");
        Ok(changed)
    }

    async fn write_atomically(&self, content: &str) -> Result<()> {
        let to_persistence = |e: std::io::Error| {
            TrackerError::PersistenceError(format!("{}: {}", self.path.display(), e))
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(to_persistence)?;
        }
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        tokio::fs::write(&tmp, content)
            .await
            .map_err(to_persistence)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(to_persistence)
    }
}

#[async_trait]
impl ReportStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn load_all(&self) -> Result<Vec<Report>> {
        let origin = self.read_origin().await?;
        self.reports_in(&origin)
    }

    async fn append(&self, report: Report) -> Result<Report> {
        let mut stored = None;
        self.update(|reports| {
            let mut report = report;
            assign_ids(reports, std::slice::from_mut(&mut report), now_millis());
            reports.push(report.clone());
            stored = Some(report);
            1
        })
        .await?;
        let stored = stored.ok_or_else(|| {
            TrackerError::PersistenceError("report was not written".to_string())
        })?;
        info!(
            id = %stored.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            backend = "local",
            "report saved"
        );
        Ok(stored)
    }

    async fn bulk_import(&self, incoming: Vec<Report>) -> Result<usize> {
        let count = self
            .update(|reports| {
                let mut incoming = incoming;
                assign_ids(reports, &mut incoming, now_millis());
                let count = incoming.len();
                reports.extend(incoming);
                count
            })
            .await?;
        info!(count, backend = "local", "reports imported");
        Ok(count)
    }
}
