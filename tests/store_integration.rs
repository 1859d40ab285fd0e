//! Integration tests for the store backends.
//!
//! The local store is exercised against real files in a temp directory.
//! The remote store talks to the crate's own report service, served on an
//! ephemeral port over an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use govwatch::server::router;
use govwatch::store_local::LocalStore;
use govwatch::store_remote::RemoteStore;
use govwatch_core::counties::CountyRegistry;
use govwatch_core::store::ReportStore;
use govwatch_core::store::memory::InMemoryStore;
use govwatch_core::{Official, Report, ReportId, TrackerError};
use serde_json::Value;
use tempfile::TempDir;

fn report(title: &str, official: &str) -> Report {
    Report {
        issue_type: "corruption".into(),
        title: title.into(),
        official: Official {
            name: official.into(),
            position: "Governor".into(),
        },
        county: "001".into(),
        date: "2024-06-10T08:00:00Z".into(),
        ..Default::default()
    }
}

// ─── Local store ────────────────────────────────────────────────────

#[tokio::test]
async fn test_local_roundtrip_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("origin.json");

    let store = LocalStore::new(&path, "governanceReports", 5 * 1024 * 1024);
    let a = store.append(report("a", "x")).await.unwrap();
    let b = store.append(report("b", "y")).await.unwrap();
    assert!(b.int_id().unwrap() > a.int_id().unwrap());

    let reopened = LocalStore::new(&path, "governanceReports", 5 * 1024 * 1024);
    let all = reopened.load_all().await.unwrap();
    let titles: Vec<&str> = all.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b"]);
}

#[tokio::test]
async fn test_local_export_then_import_duplicates() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStore::new(tmp.path().join("origin.json"), "governanceReports", 1 << 20);
    store.append(report("a", "x")).await.unwrap();
    store.append(report("b", "y")).await.unwrap();

    let exported = store.export_all().await.unwrap();
    assert_eq!(store.import_json(&exported).await.unwrap(), 2);

    let all = store.load_all().await.unwrap();
    assert_eq!(all.len(), 4);
    let ids: std::collections::HashSet<ReportId> =
        all.iter().map(|r| r.id.clone().unwrap()).collect();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn test_local_invalid_import_leaves_file_untouched() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("origin.json");
    let store = LocalStore::new(&path, "governanceReports", 1 << 20);
    store.append(report("a", "x")).await.unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    for payload in [r#"{"a": 1}"#, "[1, 2]", "nonsense"] {
        assert!(matches!(
            store.import_json(payload).await,
            Err(TrackerError::InvalidFormat(_))
        ));
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_local_reads_legacy_schema() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("origin.json");
    let legacy = serde_json::json!([{
        "id": 1700000000000_i64,
        "issueType": "misconduct",
        "issueTitle": "Roads fund missing",
        "official": { "name": "A. Kamau", "position": "MP" },
        "county": "047",
        "countyName": "Nairobi",
        "media": [],
        "date": "11/14/2023, 10:13:20 PM",
        "description": "<p>Funds unaccounted</p>",
        "isRichText": true
    }]);
    let origin = serde_json::json!({ "governanceReports": legacy.to_string() });
    std::fs::write(&path, origin.to_string()).unwrap();

    let store = LocalStore::new(&path, "governanceReports", 1 << 20);
    let all = store.load_all().await.unwrap();
    assert_eq!(all[0].title, "Roads fund missing");
    assert!(all[0].parsed_date().is_some());

    let fresh = store.append(report("new", "z")).await.unwrap();
    assert!(fresh.int_id().unwrap() > 1700000000000);
}

// ─── Remote store ───────────────────────────────────────────────────

async fn spawn_service(store: Arc<dyn ReportStore>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(store, CountyRegistry::bundled());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_remote_append_and_load() {
    let backing = Arc::new(InMemoryStore::new());
    let base = spawn_service(backing.clone()).await;
    let remote = RemoteStore::new(&base, Some(Duration::from_secs(5))).unwrap();

    assert!(remote.load_all().await.unwrap().is_empty());

    let stored = remote.append(report("Clinic closed", "J. Doe")).await.unwrap();
    assert!(stored.id.is_some());
    assert_eq!(stored.county_name.as_deref(), Some("Mombasa"));

    let all = remote.load_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Clinic closed");
    assert_eq!(backing.load_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_remote_bulk_import_and_export() {
    let base = spawn_service(Arc::new(InMemoryStore::new())).await;
    let remote = RemoteStore::new(&base, None).unwrap();

    assert!(matches!(
        remote.export_all().await,
        Err(TrackerError::EmptyStore)
    ));

    let count = remote
        .import_json(r#"[{"title": "one"}, {"issueTitle": "two"}]"#)
        .await
        .unwrap();
    assert_eq!(count, 2);
    let exported = remote.export_all().await.unwrap();
    let parsed: Vec<Report> = serde_json::from_str(&exported).unwrap();
    assert_eq!(parsed.len(), 2);
}

#[tokio::test]
async fn test_remote_rejected_post_is_persistence_error() {
    let base = spawn_service(Arc::new(InMemoryStore::new())).await;
    let remote = RemoteStore::new(&base, None).unwrap();
    let err = remote.append(report("", "x")).await.unwrap_err();
    assert!(matches!(err, TrackerError::PersistenceError(msg) if msg.contains("400")));
}

#[tokio::test]
async fn test_remote_unreachable_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = RemoteStore::new(&format!("http://{}", addr), Some(Duration::from_secs(2))).unwrap();
    assert!(matches!(
        remote.load_all().await,
        Err(TrackerError::StorageUnavailable(_))
    ));
}

// ─── Service contract ───────────────────────────────────────────────

#[tokio::test]
async fn test_service_filters_and_errors() {
    let backing = Arc::new(InMemoryStore::with_reports(vec![
        report("Water tender", "Jane Mwangi"),
        report("Road tender", "Otieno Were"),
    ]));
    let base = spawn_service(backing).await;
    let client = reqwest::Client::new();

    let filtered: Vec<Value> = client
        .get(format!("{}/reports?q=water", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["title"], "Water tender");

    let resp = client
        .get(format!("{}/reports?order=sideways", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/reports", base))
        .json(&serde_json::json!({ "title": "Created", "description": "<script>x</script><p>ok</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["description"], "<p>ok</p>");

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_service_rejects_unknown_county_and_untyped_media() {
    let backing = Arc::new(InMemoryStore::with_reports(vec![report("Water tender", "Jane Mwangi")]));
    let base = spawn_service(backing.clone()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/reports?county=999", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let known: Vec<Value> = client
        .get(format!("{}/reports?county=001", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(known.len(), 1);

    let resp = client
        .post(format!("{}/reports", base))
        .json(&serde_json::json!({
            "title": "Untyped",
            "media": [{ "name": "clip", "type": "", "data": "AA==" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = client
        .post(format!("{}/reports/import", base))
        .body(r#"[{"id": 9223372036854775807, "title": "big id"}]"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(backing.load_all().await.unwrap().len(), 2);
}
