use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use boundary_profile::assessment::{
    assessment_router, AnswerSet, Archetype, AssessmentService, CategoryDefinition, ItemView,
    LikertOutcome, LikertResponses, MeanScores, ProfileExport, ProfileOutcome, ScoreVector,
    SessionRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct ItemsResponse {
    pub(crate) categories: Vec<CategoryDefinition>,
    pub(crate) items: Vec<ItemView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    #[serde(default)]
    pub(crate) answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluateResponse {
    pub(crate) outcome: ProfileOutcome,
    pub(crate) export: ProfileExport<ScoreVector>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikertRequest {
    #[serde(default)]
    pub(crate) responses: LikertResponses,
}

#[derive(Debug, Serialize)]
pub(crate) struct LikertResponse {
    pub(crate) outcome: LikertOutcome,
    pub(crate) export: ProfileExport<MeanScores>,
}

pub(crate) fn with_profile_routes<R>(service: Arc<AssessmentService<R>>) -> axum::Router
where
    R: SessionRepository + 'static,
{
    assessment_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/profile/items", axum::routing::get(items_endpoint))
        .route(
            "/api/v1/profile/archetypes",
            axum::routing::get(archetypes_endpoint),
        )
        .route(
            "/api/v1/profile/evaluate",
            axum::routing::post(evaluate_endpoint),
        )
        .route(
            "/api/v1/profile/likert/evaluate",
            axum::routing::post(likert_evaluate_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn items_endpoint(Extension(state): Extension<AppState>) -> Json<ItemsResponse> {
    let bank = state.engine.bank();
    Json(ItemsResponse {
        categories: bank.categories().definitions().to_vec(),
        items: bank.views(),
    })
}

pub(crate) async fn archetypes_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<Archetype>> {
    Json(state.engine.catalog().iter().cloned().collect())
}

/// Stateless scoring of a complete or partial answer map.
pub(crate) async fn evaluate_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<EvaluateRequest>,
) -> Json<EvaluateResponse> {
    let outcome = state.engine.evaluate(&payload.answers);
    let export = outcome.export();
    Json(EvaluateResponse { outcome, export })
}

pub(crate) async fn likert_evaluate_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LikertRequest>,
) -> Json<LikertResponse> {
    let outcome = state.likert.evaluate(&payload.responses);
    let export = outcome.export();
    Json(LikertResponse { outcome, export })
}
