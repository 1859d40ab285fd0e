//! In-memory [`ReportStore`] for tests and embedding.
//!
//! Holds the canonical list in a `Vec` behind `std::sync::RwLock`.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, TrackerError};
use crate::models::Report;

use super::{assign_ids, now_millis, ReportStore};

pub struct InMemoryStore {
    reports: RwLock<Vec<Report>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Seed the store. Ids are assigned to any report lacking one.
    pub fn with_reports(mut reports: Vec<Report>) -> Self {
        assign_ids(&[], &mut reports, now_millis());
        Self {
            reports: RwLock::new(reports),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> TrackerError {
    TrackerError::StorageUnavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl ReportStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_all(&self) -> Result<Vec<Report>> {
        let reports = self.reports.read().map_err(|_| poisoned())?;
        Ok(reports.clone())
    }

    async fn append(&self, mut report: Report) -> Result<Report> {
        let mut reports = self
            .reports
            .write()
            .map_err(|_| TrackerError::PersistenceError("lock poisoned".to_string()))?;
        assign_ids(&reports, std::slice::from_mut(&mut report), now_millis());
        reports.push(report.clone());
        Ok(report)
    }

    async fn bulk_import(&self, mut incoming: Vec<Report>) -> Result<usize> {
        let mut reports = self
            .reports
            .write()
            .map_err(|_| TrackerError::PersistenceError("lock poisoned".to_string()))?;
        assign_ids(&reports, &mut incoming, now_millis());
        let count = incoming.len();
        reports.extend(incoming);
        Ok(count)
    }
}
