use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::bank::ItemView;
use super::domain::ItemId;
use super::repository::{RepositoryError, SessionId, SessionRepository};
use super::service::{AssessmentService, AssessmentServiceError};

/// Router builder exposing the session endpoints.
pub fn assessment_router<R>(service: Arc<AssessmentService<R>>) -> Router
where
    R: SessionRepository + 'static,
{
    Router::new()
        .route("/api/v1/profile/sessions", post(start_handler::<R>))
        .route(
            "/api/v1/profile/sessions/:session_id",
            get(progress_handler::<R>).delete(finish_handler::<R>),
        )
        .route(
            "/api/v1/profile/sessions/:session_id/answers",
            put(answer_handler::<R>),
        )
        .route(
            "/api/v1/profile/sessions/:session_id/result",
            get(result_handler::<R>),
        )
        .with_state(service)
}

/// Items in the session's presentation order.
#[derive(Debug, Serialize)]
pub(crate) struct SessionStarted {
    pub(crate) session_id: SessionId,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) items: Vec<ItemView>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct AnswerRequest {
    pub(crate) item_id: ItemId,
    #[serde(default)]
    pub(crate) label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultQuery {
    #[serde(default)]
    pub(crate) partial: bool,
}

pub(crate) async fn start_handler<R>(State(service): State<Arc<AssessmentService<R>>>) -> Response
where
    R: SessionRepository + 'static,
{
    match service.start() {
        Ok(session) => {
            let views = service.engine().bank().views();
            let items = session
                .order
                .iter()
                .filter_map(|id| views.iter().find(|view| &view.id == id).cloned())
                .collect();
            let body = SessionStarted {
                session_id: session.id,
                started_at: session.started_at,
                items,
            };
            (StatusCode::CREATED, axum::Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn progress_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.progress(&SessionId(session_id)) {
        Ok(progress) => (StatusCode::OK, axum::Json(progress)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn answer_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.answer(&SessionId(session_id), request.item_id, request.label) {
        Ok(progress) => (StatusCode::OK, axum::Json(progress)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn result_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
    Query(query): Query<ResultQuery>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.result(&SessionId(session_id), query.partial) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn finish_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.finish(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

impl AssessmentServiceError {
    /// HTTP status for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AssessmentServiceError::UnknownItem(_)
            | AssessmentServiceError::UnknownOption { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AssessmentServiceError::Incomplete { .. } => StatusCode::CONFLICT,
            AssessmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AssessmentServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_response(err: AssessmentServiceError) -> Response {
    let status = err.status_code();
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
