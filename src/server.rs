use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::audit::store::AuditStore;
use crate::audit::OverrideRecord;
use crate::config::Config;
use crate::error::OverrideError;
use crate::estimator::{estimator_for_offset, QualityEstimator};
use crate::gate::{run_override, OverrideOutcome};
use crate::impact::calculator::calculate_impact;
use crate::impact::conflicts::detect_conflicts;
use crate::impact::{Conflict, OverrideImpact};
use crate::plan::CollectionPlan;
use crate::types::{CollectionOpportunity, Site};

#[derive(Clone)]
struct ApiState {
    config: Config,
    plan: Arc<CollectionPlan>,
    estimator: Arc<dyn QualityEstimator>,
    db_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl From<OverrideError> for ApiError {
    fn from(error: OverrideError) -> Self {
        match error {
            OverrideError::InvalidSiteData { .. } | OverrideError::InsufficientInput { .. } => {
                Self::bad_request(error.to_string())
            }
            OverrideError::EstimatorTimeout { .. } => Self::internal(error),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
struct ImpactRequest {
    opportunity: String,
    site: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OverrideRequest {
    opportunity: String,
    site: String,
    justification: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct HistoryRequest {
    opportunity: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ConflictsResponse {
    conflicts: Vec<Conflict>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    records: Vec<OverrideRecord>,
}

pub async fn run_server(config: Config, plan: CollectionPlan, bind: SocketAddr) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = ApiState {
        db_path: config.resolved_db_path(),
        estimator: Arc::from(estimator_for_offset(config.estimator.quality_offset)),
        plan: Arc::new(plan),
        config,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/sites", get(sites))
        .route("/v1/opportunities", get(opportunities))
        .route("/v1/impact", post(impact))
        .route("/v1/conflicts", post(conflicts))
        .route("/v1/override", post(submit_override))
        .route("/v1/history", post(history))
        .route("/v1/config", get(show_config))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn sites(State(state): State<ApiState>) -> Json<ApiResponse<Vec<Site>>> {
    ok(state.plan.sites.clone())
}

async fn opportunities(
    State(state): State<ApiState>,
) -> Json<ApiResponse<Vec<CollectionOpportunity>>> {
    ok(state.plan.opportunities.clone())
}

async fn impact(
    State(state): State<ApiState>,
    Json(request): Json<ImpactRequest>,
) -> ApiResult<OverrideImpact> {
    let (opportunity, site) = resolve_pair(&state, &request.opportunity, &request.site)?;
    let result = calculate_impact(
        opportunity,
        site,
        &state.plan.opportunities,
        state.estimator.as_ref(),
        estimator_timeout(&state),
    )
    .await?;
    Ok(ok(result))
}

async fn conflicts(
    State(state): State<ApiState>,
    Json(request): Json<ImpactRequest>,
) -> ApiResult<ConflictsResponse> {
    let (opportunity, site) = resolve_pair(&state, &request.opportunity, &request.site)?;
    let conflicts = detect_conflicts(opportunity, site, &state.plan.opportunities);
    Ok(ok(ConflictsResponse { conflicts }))
}

async fn submit_override(
    State(state): State<ApiState>,
    Json(request): Json<OverrideRequest>,
) -> ApiResult<OverrideOutcome> {
    let (opportunity, site) = resolve_pair(&state, &request.opportunity, &request.site)?;
    let outcome = run_override(
        opportunity,
        site,
        &state.plan.opportunities,
        state.estimator.as_ref(),
        estimator_timeout(&state),
        request.justification.as_deref(),
    )
    .await?;

    if let OverrideOutcome::Confirmed(confirmed) = &outcome {
        let store = open_store(&state)?;
        let record = OverrideRecord::from_confirmed(confirmed).map_err(ApiError::internal)?;
        store.insert_override(&record).map_err(ApiError::internal)?;
    }
    Ok(ok(outcome))
}

async fn history(
    State(state): State<ApiState>,
    Json(request): Json<HistoryRequest>,
) -> ApiResult<HistoryResponse> {
    let limit = request.limit.unwrap_or(50).max(1);
    let store = open_store(&state)?;
    let records = store
        .load_history(request.opportunity.as_deref(), limit)
        .map_err(ApiError::internal)?;
    Ok(ok(HistoryResponse { records }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn open_store(state: &ApiState) -> std::result::Result<AuditStore, ApiError> {
    AuditStore::open(&state.db_path).map_err(ApiError::internal)
}

fn estimator_timeout(state: &ApiState) -> Duration {
    Duration::from_millis(state.config.estimator.timeout_ms)
}

fn resolve_pair<'a>(
    state: &'a ApiState,
    opportunity_id: &str,
    site_id: &str,
) -> std::result::Result<(&'a CollectionOpportunity, &'a Site), ApiError> {
    let opportunity = state
        .plan
        .opportunity(opportunity_id)
        .ok_or_else(|| ApiError::not_found(format!("unknown opportunity: {opportunity_id}")))?;
    let site = state
        .plan
        .site(site_id)
        .ok_or_else(|| ApiError::not_found(format!("unknown site: {site_id}")))?;
    Ok((opportunity, site))
}
