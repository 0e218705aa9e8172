use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::assessment::{assessment_router, AssessmentService};

fn put_answer(session_id: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/profile/sessions/{session_id}/answers"))
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn start_session(router: &axum::Router) -> serde_json::Value {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/profile/sessions")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json_body(response).await
}

#[tokio::test]
async fn start_returns_items_in_presentation_order() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let body = start_session(&router).await;

    assert!(body["session_id"].as_str().is_some());
    let items = body["items"].as_array().expect("items array");
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["options"].as_array().map(Vec::len), Some(4));
    assert!(items[0]["prompt"].as_str().unwrap_or_default().starts_with("Scenario"));
}

#[tokio::test]
async fn answering_then_fetching_a_result() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let started = start_session(&router).await;
    let session_id = started["session_id"].as_str().expect("session id").to_string();

    let early = router
        .clone()
        .oneshot(get(&format!("/api/v1/profile/sessions/{session_id}/result")))
        .await
        .expect("router response");
    assert_eq!(early.status(), StatusCode::CONFLICT);

    for (index, pick) in ["C", "C", "R", "I"].iter().enumerate() {
        let response = router
            .clone()
            .oneshot(put_answer(
                &session_id,
                json!({ "item_id": format!("q{}", index + 1), "label": label_for(pick) }),
            ))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let progress = router
        .clone()
        .oneshot(get(&format!("/api/v1/profile/sessions/{session_id}")))
        .await
        .expect("router response");
    assert_eq!(progress.status(), StatusCode::OK);
    let progress = read_json_body(progress).await;
    assert_eq!(progress["answered"], 4);
    assert_eq!(progress["complete"], true);

    let result = router
        .oneshot(get(&format!("/api/v1/profile/sessions/{session_id}/result")))
        .await
        .expect("router response");
    assert_eq!(result.status(), StatusCode::OK);
    let outcome = read_json_body(result).await;
    assert_eq!(outcome["scores"], json!({ "I": 1, "C": 2, "R": 1, "T": 0 }));
    assert_eq!(outcome["archetype"]["code"], "system_navigator");
    assert_eq!(outcome["basis"]["rule"], "pairing");
    assert_eq!(outcome["basis"]["primary"], "C");
}

#[tokio::test]
async fn partial_results_are_available_on_request() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let started = start_session(&router).await;
    let session_id = started["session_id"].as_str().expect("session id").to_string();

    let response = router
        .oneshot(get(&format!(
            "/api/v1/profile/sessions/{session_id}/result?partial=true"
        )))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["complete"], false);
    assert_eq!(outcome["answered"], 0);
}

#[tokio::test]
async fn unknown_options_are_unprocessable() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let started = start_session(&router).await;
    let session_id = started["session_id"].as_str().expect("session id").to_string();

    let response = router
        .oneshot(put_answer(
            &session_id,
            json!({ "item_id": "q1", "label": "Not on the card" }),
        ))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("Not on the card"));
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/profile/sessions/session-missing"))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_outage_is_a_server_error() {
    let service = AssessmentService::new(
        Arc::new(scenario_engine(4)),
        Arc::new(UnavailableRepository),
    );
    let router = assessment_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/profile/sessions")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn finishing_a_session_releases_it() {
    let (service, repository) = build_service();
    let router = router_with_service(service);
    let started = start_session(&router).await;
    let session_id = started["session_id"].as_str().expect("session id").to_string();
    let uri = format!("/api/v1/profile/sessions/{session_id}");
    assert_eq!(repository.len(), 1);

    let finished = router
        .clone()
        .oneshot(delete(&uri))
        .await
        .expect("router response");
    assert_eq!(finished.status(), StatusCode::NO_CONTENT);
    assert_eq!(repository.len(), 0);

    let progress = router
        .clone()
        .oneshot(get(&uri))
        .await
        .expect("router response");
    assert_eq!(progress.status(), StatusCode::NOT_FOUND);

    let again = router.oneshot(delete(&uri)).await.expect("router response");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(again).await;
    assert!(body["error"].as_str().is_some());
}
