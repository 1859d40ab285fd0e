//! Storage abstraction for govwatch.
//!
//! The [`ReportStore`] trait is the only way the rest of the system touches
//! the canonical report list. Backends:
//!
//! | Backend | Crate | Notes |
//! |---------|-------|-------|
//! | [`memory::InMemoryStore`] | `govwatch-core` | tests and embedding |
//! | `LocalStore` | `govwatch` | JSON array under one key of an origin-scoped key-value file |
//! | `RemoteStore` | `govwatch` | `GET`/`POST /reports` on a report service |
//!
//! Reports are never updated in place. The canonical list only grows, by
//! [`append`](ReportStore::append) or [`bulk_import`](ReportStore::bulk_import).

pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, TrackerError};
use crate::models::{Report, ReportId};

/// Abstract persistence backend for the canonical report list.
///
/// # Operations
///
/// | Method | Errors |
/// |--------|--------|
/// | [`load_all`](ReportStore::load_all) | `StorageUnavailable` |
/// | [`append`](ReportStore::append) | `PersistenceError` |
/// | [`bulk_import`](ReportStore::bulk_import) | `PersistenceError` |
/// | [`export_all`](ReportStore::export_all) | `StorageUnavailable`, `EmptyStore` |
/// | [`import_json`](ReportStore::import_json) | `InvalidFormat`, `PersistenceError` |
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Every stored report in insertion (or server) order. A store that has
    /// never been written is empty, not an error.
    async fn load_all(&self) -> Result<Vec<Report>>;

    /// Persist one report, assigning an id when it has none, and return the
    /// stored record.
    async fn append(&self, report: Report) -> Result<Report>;

    /// Append every report without deduplication. Returns the number added.
    async fn bulk_import(&self, incoming: Vec<Report>) -> Result<usize>;

    /// Pretty-printed JSON array of the canonical list.
    async fn export_all(&self) -> Result<String> {
        let reports = self.load_all().await?;
        export_json(&reports)
    }

    /// Validate an import payload and append its reports. On
    /// `InvalidFormat` the store is untouched.
    async fn import_json(&self, payload: &str) -> Result<usize> {
        let incoming = parse_import(payload)?;
        self.bulk_import(incoming).await
    }
}

/// Serialize reports for download. Nothing to export is `EmptyStore`.
pub fn export_json(reports: &[Report]) -> Result<String> {
    if reports.is_empty() {
        return Err(TrackerError::EmptyStore);
    }
    serde_json::to_string_pretty(reports).map_err(|e| TrackerError::InvalidFormat(e.to_string()))
}

/// Download name for an export taken at `now`.
///
/// `governance-reports-2024-06-10T08-00-00.000Z.json`; colons are replaced
/// so the name is valid on every filesystem.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!(
        "governance-reports-{}.json",
        now.format("%Y-%m-%dT%H-%M-%S%.3fZ")
    )
}

/// Parse an import payload: a JSON array of report-shaped objects.
///
/// Report-shaped means a JSON object that deserializes as a [`Report`],
/// carries a non-blank title, and gives every media entry a mime type.
pub fn parse_import(payload: &str) -> Result<Vec<Report>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| TrackerError::InvalidFormat(format!("not valid JSON: {}", e)))?;
    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(TrackerError::InvalidFormat(
                "expected an array of reports".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(TrackerError::InvalidFormat(format!(
                    "item {} is not an object",
                    i
                )));
            }
            let report: Report = serde_json::from_value(item)
                .map_err(|e| TrackerError::InvalidFormat(format!("item {}: {}", i, e)))?;
            if report.title.trim().is_empty() {
                return Err(TrackerError::InvalidFormat(format!(
                    "item {} has no title",
                    i
                )));
            }
            if let Some(media) = report.untyped_media() {
                return Err(TrackerError::InvalidFormat(format!(
                    "item {}: media '{}' has no type",
                    i, media.name
                )));
            }
            Ok(report)
        })
        .collect()
}

/// Current time in epoch milliseconds, the basis for local ids.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Give every report in `incoming` an id unique across `existing` and
/// `incoming`.
///
/// Reports without an id, or whose id is already taken, get a fresh
/// integer id. Fresh ids start at `now_ms` and are bumped past the largest
/// integer id already present, so they are strictly increasing. When the
/// largest id is `i64::MAX` there is nothing above it; fresh ids then take
/// the first free value from `now_ms` up. Returns how many ids were
/// assigned.
pub fn assign_ids(existing: &[Report], incoming: &mut [Report], now_ms: i64) -> usize {
    let mut seen: HashSet<ReportId> = existing.iter().filter_map(|r| r.id.clone()).collect();
    let max_int = existing
        .iter()
        .chain(incoming.iter())
        .filter_map(Report::int_id)
        .max();
    let mut next = max_int
        .filter(|max| *max >= now_ms)
        .and_then(|max| max.checked_add(1))
        .unwrap_or(now_ms);
    // Ids in the batch that are kept; fresh ids must not collide with them.
    let kept: HashSet<ReportId> = incoming.iter().filter_map(|r| r.id.clone()).collect();

    let mut assigned = 0;
    for report in incoming.iter_mut() {
        let taken = report.id.as_ref().map_or(true, |id| seen.contains(id));
        if taken {
            let fresh = next_free(&seen, &kept, &mut next, now_ms);
            if let Some(old) = &report.id {
                warn!(old_id = %old, new_id = fresh, "report id already in use, reassigning");
            }
            report.id = Some(ReportId::Int(fresh));
            assigned += 1;
        }
        if let Some(id) = &report.id {
            seen.insert(id.clone());
        }
    }
    assigned
}

/// First integer at or after `*next` used by neither set, wrapping to
/// `floor` instead of overflowing.
fn next_free(
    seen: &HashSet<ReportId>,
    kept: &HashSet<ReportId>,
    next: &mut i64,
    floor: i64,
) -> i64 {
    loop {
        let candidate = ReportId::Int(*next);
        let id = *next;
        *next = next.checked_add(1).unwrap_or(floor);
        if !seen.contains(&candidate) && !kept.contains(&candidate) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn titled(title: &str, id: Option<ReportId>) -> Report {
        Report {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_import_accepts_array() {
        let payload = r#"[{"title": "a"}, {"issueTitle": "b", "id": 3}]"#;
        let reports = parse_import(payload).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].title, "b");
    }

    #[test]
    fn test_parse_import_rejects_object_root() {
        let err = parse_import(r#"{"not":"an array"}"#).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFormat(_)));
    }

    #[test]
    fn test_parse_import_rejects_bad_items() {
        assert!(matches!(
            parse_import(r#"[{"title": "ok"}, 42]"#),
            Err(TrackerError::InvalidFormat(msg)) if msg.contains("item 1")
        ));
        assert!(matches!(
            parse_import(r#"[{"description": "no title"}]"#),
            Err(TrackerError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_import("not json"),
            Err(TrackerError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_import_rejects_untyped_media() {
        let payload = r#"[{"title": "t", "media": [{"name": "a", "type": "", "data": "AA=="}]}]"#;
        assert!(matches!(
            parse_import(payload),
            Err(TrackerError::InvalidFormat(msg)) if msg.contains("media 'a' has no type")
        ));
        let typed = r#"[{"title": "t", "media": [{"name": "a", "type": "image/png", "data": "AA=="}]}]"#;
        assert_eq!(parse_import(typed).unwrap()[0].media.len(), 1);
    }

    #[test]
    fn test_parse_import_empty_array() {
        assert!(parse_import("[]").unwrap().is_empty());
    }

    #[test]
    fn test_export_json_empty() {
        assert!(matches!(export_json(&[]), Err(TrackerError::EmptyStore)));
    }

    #[test]
    fn test_export_json_is_pretty_array() {
        let json = export_json(&[titled("a", Some(ReportId::Int(1)))]).unwrap();
        assert!(json.starts_with("[\n"));
        let back: Vec<Report> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0].title, "a");
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap();
        assert_eq!(
            export_filename(now),
            "governance-reports-2024-06-10T08-00-00.000Z.json"
        );
    }

    #[test]
    fn test_assign_ids_fills_missing() {
        let mut incoming = vec![titled("a", None), titled("b", None)];
        assert_eq!(assign_ids(&[], &mut incoming, 1000), 2);
        assert_eq!(incoming[0].id, Some(ReportId::Int(1000)));
        assert_eq!(incoming[1].id, Some(ReportId::Int(1001)));
    }

    #[test]
    fn test_assign_ids_bumps_past_existing() {
        let existing = vec![titled("x", Some(ReportId::Int(5000)))];
        let mut incoming = vec![titled("a", None)];
        assign_ids(&existing, &mut incoming, 1000);
        assert_eq!(incoming[0].id, Some(ReportId::Int(5001)));
    }

    #[test]
    fn test_assign_ids_keeps_unique_and_replaces_collisions() {
        let existing = vec![titled("x", Some(ReportId::Int(7)))];
        let mut incoming = vec![
            titled("keep", Some(ReportId::Text("abc".into()))),
            titled("dup", Some(ReportId::Int(7))),
            titled("dup-in-batch", Some(ReportId::Text("abc".into()))),
        ];
        assert_eq!(assign_ids(&existing, &mut incoming, 100), 2);
        assert_eq!(incoming[0].id, Some(ReportId::Text("abc".into())));
        assert_eq!(incoming[1].id, Some(ReportId::Int(100)));
        assert_eq!(incoming[2].id, Some(ReportId::Int(101)));
    }

    #[test]
    fn test_assign_ids_at_max_id() {
        let mut incoming = vec![titled("big", Some(ReportId::Int(i64::MAX))), titled("a", None)];
        assert_eq!(assign_ids(&[], &mut incoming, 1000), 1);
        assert_eq!(incoming[0].id, Some(ReportId::Int(i64::MAX)));
        assert_eq!(incoming[1].id, Some(ReportId::Int(1000)));

        let existing = incoming;
        let mut again = vec![
            titled("dup", Some(ReportId::Int(i64::MAX))),
            titled("b", Some(ReportId::Int(1001))),
        ];
        assert_eq!(assign_ids(&existing, &mut again, 1000), 1);
        assert_eq!(again[0].id, Some(ReportId::Int(1002)));
        assert_eq!(again[1].id, Some(ReportId::Int(1001)));
    }
}
