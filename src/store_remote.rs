//! Remote [`ReportStore`] talking to a report service over HTTP.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `load_all` | `GET {base_url}/reports` → JSON array |
//! | `append` | `POST {base_url}/reports` with one report → stored report |
//! | `bulk_import` | one `POST` per report, in order |
//!
//! The service owns id assignment. A bulk import stops at the first failed
//! request; reports posted before it stay stored.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use govwatch_core::store::ReportStore;
use govwatch_core::{Report, Result, TrackerError};

use crate::config::RemoteStorageConfig;

#[derive(Error, Debug)]
enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    /// `base_url` is the service root, like `http://localhost:3001`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TrackerError::StorageUnavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RemoteStorageConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    fn reports_url(&self) -> String {
        format!("{}/reports", self.base_url)
    }

    async fn fetch(&self) -> std::result::Result<Vec<Report>, RemoteError> {
        let url = self.reports_url();
        info!(url = %url, "loading reports from service");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let reports: Vec<Report> = resp.json().await?;
        info!(count = reports.len(), "loaded reports");
        Ok(reports)
    }

    async fn post(&self, report: &Report) -> std::result::Result<Report, RemoteError> {
        let resp = self
            .client
            .post(self.reports_url())
            .json(report)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ReportStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn load_all(&self) -> Result<Vec<Report>> {
        self.fetch()
            .await
            .map_err(|e| TrackerError::StorageUnavailable(e.to_string()))
    }

    async fn append(&self, report: Report) -> Result<Report> {
        let stored = self
            .post(&report)
            .await
            .map_err(|e| TrackerError::PersistenceError(e.to_string()))?;
        info!(
            id = %stored.id.as_ref().map(ToString::to_string).unwrap_or_default(),
            backend = "remote",
            "report saved"
        );
        Ok(stored)
    }

    async fn bulk_import(&self, incoming: Vec<Report>) -> Result<usize> {
        let total = incoming.len();
        for (i, report) in incoming.iter().enumerate() {
            if let Err(e) = self.post(report).await {
                warn!(posted = i, total, error = %e, "bulk import interrupted");
                return Err(TrackerError::PersistenceError(format!(
                    "{} of {} reports imported before failure: {}",
                    i, total, e
                )));
            }
        }
        info!(count = total, backend = "remote", "reports imported");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let store = RemoteStore::new("http://localhost:3001/", None).unwrap();
        assert_eq!(store.reports_url(), "http://localhost:3001/reports");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // Port 9 (discard) is closed on test hosts.
        let store =
            RemoteStore::new("http://127.0.0.1:9", Some(Duration::from_secs(2))).unwrap();
        assert!(matches!(
            store.load_all().await,
            Err(TrackerError::StorageUnavailable(_))
        ));
        assert!(matches!(
            store.append(Report::default()).await,
            Err(TrackerError::PersistenceError(_))
        ));
    }
}
