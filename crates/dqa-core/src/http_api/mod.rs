use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AssessmentConfig, AssessmentReconciliation, ComparisonReport, ComparisonScope,
    ComparisonSummary, DocumentStore, Expansion, MemoryDocumentStore, PeriodType,
    PersistenceError, ReconciliationEngine, SourceRows, expand, load_summaries, reconcile_assessment,
    record_summary,
};

pub type SharedStore = Arc<dyn DocumentStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDocumentStore::new()))
    }

    fn store(&self) -> SharedStore {
        self.store.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::NotFound(_) => ApiError::NotFound(value.to_string()),
            PersistenceError::Conflict(_) => ApiError::Conflict(value.to_string()),
            PersistenceError::InvalidData(_) => ApiError::Invalid(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                log::error!("request failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpandPayload {
    period: String,
    frequency: PeriodType,
    period_type: PeriodType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparePayload {
    period: String,
    org_unit: String,
    #[serde(default)]
    sources: SourceRows,
    #[serde(default)]
    persist: bool,
}

#[derive(Debug, Deserialize)]
struct ReconcilePayload {
    assessment: AssessmentConfig,
    #[serde(default)]
    sources: SourceRows,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/periods/expand", post(expand_period))
        .route("/comparisons", post(run_comparison))
        .route("/comparisons/:org_unit/:period", get(list_summaries))
        .route("/assessments/reconcile", post(reconcile))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn expand_period(Json(payload): Json<ExpandPayload>) -> Json<Expansion> {
    Json(expand(
        payload.period.trim(),
        payload.frequency,
        payload.period_type,
    ))
}

async fn run_comparison(
    State(state): State<AppState>,
    Json(payload): Json<ComparePayload>,
) -> Result<Json<ComparisonReport>, ApiError> {
    if payload.period.trim().is_empty() || payload.org_unit.trim().is_empty() {
        return Err(ApiError::invalid("period and orgUnit are required"));
    }
    let scope = ComparisonScope::new(payload.period, payload.org_unit);
    let report = ReconciliationEngine::new(&payload.sources).compare(&scope);
    if payload.persist {
        let store = state.store();
        record_summary(store.as_ref(), &report.summary)?;
    }
    Ok(Json(report))
}

async fn list_summaries(
    State(state): State<AppState>,
    Path((org_unit, period)): Path<(String, String)>,
) -> Result<Json<Vec<ComparisonSummary>>, ApiError> {
    let store = state.store();
    let summaries = load_summaries(store.as_ref(), &org_unit, &period)?;
    Ok(Json(summaries))
}

async fn reconcile(
    Json(payload): Json<ReconcilePayload>,
) -> Result<Json<AssessmentReconciliation>, ApiError> {
    let result = reconcile_assessment(&payload.assessment, &payload.sources)
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    Ok(Json(result))
}
