//! HTTP report service.
//!
//! Serves any [`ReportStore`] over the same API that [`RemoteStore`] speaks,
//! so one govwatch instance can act as the remote backend of another.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/reports` | All reports; optional `q`, `official`, `county`, `order` filters |
//! | `POST` | `/reports` | Store one report, `201` with the stored record |
//! | `POST` | `/reports/import` | Append a JSON array of reports |
//! | `GET`  | `/reports/export` | Download the collection |
//! | `GET`  | `/counties` | County code/name list |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing required field: title" } }
//! ```
//!
//! Error codes: `bad_request` (400), `empty_store` (404),
//! `persistence_error` (500), `storage_unavailable` (503).
//!
//! All origins, methods, and headers are permitted.
//!
//! [`RemoteStore`]: crate::store_remote::RemoteStore

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use govwatch_core::counties::{County, CountyRegistry};
use govwatch_core::filter::{self, Criteria, DateOrder};
use govwatch_core::html;
use govwatch_core::store::{export_filename, ReportStore};
use govwatch_core::{Report, TrackerError};

use crate::config::Config;

#[derive(Clone)]
struct AppState {
    store: Arc<dyn ReportStore>,
    counties: Arc<CountyRegistry>,
}

/// Build the service router. Exposed so tests can serve it on an
/// ephemeral port.
pub fn router(store: Arc<dyn ReportStore>, counties: CountyRegistry) -> Router {
    let state = AppState {
        store,
        counties: Arc::new(counties),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/reports", get(handle_list).post(handle_create))
        .route("/reports/import", post(handle_import))
        .route("/reports/export", get(handle_export))
        .route("/counties", get(handle_counties))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Bind `[server].bind` and serve until the process is terminated.
pub async fn run_server(
    config: &Config,
    store: Arc<dyn ReportStore>,
    counties: CountyRegistry,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(store, counties);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "report service listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let (status, code) = match &err {
            TrackerError::StorageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            TrackerError::PersistenceError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
            }
            TrackerError::EmptyStore => (StatusCode::NOT_FOUND, "empty_store"),
            TrackerError::InvalidFormat(_)
            | TrackerError::MediaEncodingError { .. }
            | TrackerError::MissingField(_)
            | TrackerError::UnknownCounty(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /reports ============

#[derive(Deserialize, Default)]
struct ListParams {
    q: Option<String>,
    official: Option<String>,
    county: Option<String>,
    order: Option<String>,
}

impl ListParams {
    fn criteria(self, counties: &CountyRegistry) -> Result<Criteria, AppError> {
        if let Some(code) = &self.county {
            counties.validate(code)?;
        }
        let date_order = match self.order.as_deref() {
            None | Some("") | Some("none") => None,
            Some(raw) => Some(
                raw.parse::<DateOrder>()
                    .map_err(|e| bad_request(format!("order: {}", e)))?,
            ),
        };
        Ok(Criteria {
            text_query: self.q,
            official_name: self.official,
            county: self.county,
            date_order,
        })
    }
}

async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Report>>, AppError> {
    let criteria = params.criteria(&state.counties)?;
    let reports = state.store.load_all().await?;
    Ok(Json(filter::apply(&reports, &criteria)))
}

// ============ POST /reports ============

async fn handle_create(
    State(state): State<AppState>,
    Json(mut report): Json<Report>,
) -> Result<(StatusCode, Json<Report>), AppError> {
    if report.title.trim().is_empty() {
        return Err(TrackerError::MissingField("title").into());
    }
    if let Some(media) = report.untyped_media() {
        return Err(bad_request(format!("media '{}' has no type", media.name)));
    }
    report.description = html::sanitize(&report.description);
    if report.county_name.is_none() {
        report.county_name = state.counties.name_for(&report.county).map(str::to_string);
    }
    if report.date.trim().is_empty() {
        report.date = Utc::now().to_rfc3339();
    }
    let stored = state.store.append(report).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// ============ POST /reports/import ============

#[derive(Serialize)]
struct ImportResponse {
    imported: usize,
}

async fn handle_import(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let imported = state.store.import_json(&body).await?;
    Ok(Json(ImportResponse { imported }))
}

// ============ GET /reports/export ============

async fn handle_export(State(state): State<AppState>) -> Result<Response, AppError> {
    let contents = state.store.export_all().await?;
    let disposition = format!("attachment; filename=\"{}\"", export_filename(Utc::now()));
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        contents,
    )
        .into_response())
}

// ============ GET /counties ============

async fn handle_counties(State(state): State<AppState>) -> Json<Vec<County>> {
    Json(state.counties.iter().cloned().collect())
}
