use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use rarity_service::config::Settings;
use rarity_service::error::GatewayError;
use rarity_service::services::gateway::RetryPolicy;
use rarity_service::services::source::{HttpSource, RawResponse};
use rarity_service::{build_router, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

const COUNTS: &str = "http://upstream.test/species_counts";
const TAXA: &str = "http://upstream.test/taxa";

/// Answers every GET to a URL with the same canned reply.
struct CannedSource {
    replies: HashMap<String, RawResponse>,
}

#[async_trait]
impl HttpSource for CannedSource {
    async fn get(&self, url: &str, _params: &[(String, String)]) -> Result<RawResponse, GatewayError> {
        self.replies
            .get(url)
            .cloned()
            .ok_or_else(|| GatewayError::Transport(format!("unexpected request to {}", url)))
    }
}

fn app(replies: Vec<(String, u16, Value)>) -> axum::Router {
    let source = CannedSource {
        replies: replies
            .into_iter()
            .map(|(url, status, body)| (url, RawResponse::new(status, body.to_string())))
            .collect(),
    };
    let settings = Settings {
        species_counts_url: COUNTS.to_string(),
        taxa_url: TAXA.to_string(),
        retry: RetryPolicy {
            max_retries: 1,
            backoff_factor: 0.0,
        },
        ..Settings::default()
    };
    build_router(AppState::new(Arc::new(source), settings))
}

fn species_counts(pairs: &[(u64, u64)]) -> (String, u16, Value) {
    let results: Vec<_> = pairs
        .iter()
        .map(|&(id, n)| json!({"taxon": {"id": id, "observations_count": n, "iconic_taxon_name": "Plantae"}}))
        .collect();
    (
        COUNTS.to_string(),
        200,
        json!({"results": results, "total_results": pairs.len()}),
    )
}

fn taxon(id: u64, name: &str) -> (String, u16, Value) {
    (
        format!("{}/{}", TAXA, id),
        200,
        json!({"results": [{"preferred_common_name": name, "default_photo": {"square_url": format!("http://img.test/{}.jpg", id)}}]}),
    )
}

async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_running() {
    let response = app(vec![]).oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response.into_body()).await).unwrap();
    assert_eq!(body["service"], "rarity-service");
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn index_serves_the_form() {
    let response = app(vec![]).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains(r#"name="observer_id""#));
    assert!(html.contains(r#"name="number_of_results""#));
}

#[tokio::test]
async fn form_submission_lists_rarest_species() {
    let app = app(vec![
        species_counts(&[(1, 4000), (2, 2), (3, 15), (4, 1500)]),
        taxon(2, "Ghost Orchid"),
        taxon(3, "Pitcher Plant"),
    ]);

    let response = app
        .oneshot(form_post("username=kestrel&number_of_results=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response.into_body()).await;
    let orchid = html.find("Ghost Orchid").expect("orchid listed");
    let pitcher = html.find("Pitcher Plant").expect("pitcher plant listed");
    assert!(orchid < pitcher);
    assert!(html.contains("taxon_id=2"));
    assert!(!html.contains("class=\"error\""));
}

#[tokio::test]
async fn unknown_observer_renders_error_page() {
    let app = app(vec![(COUNTS.to_string(), 422, json!({"error": "unknown user"}))]);

    let response = app
        .oneshot(form_post("observer_id=nobody_here&number_of_results=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response.into_body()).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("nobody_here"));
}

#[tokio::test]
async fn api_reports_insufficient_species() {
    let app = app(vec![species_counts(&[(1, 3), (2, 9)])]);

    let response = app
        .oneshot(get("/api/least-observed?observer_id=kestrel&result_count=5&species_type=Plantae"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = serde_json::from_str(&body_text(response.into_body()).await).unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("only observed 2 species types"));
    assert!(message.contains("Plants"));
}

#[tokio::test]
async fn api_returns_sorted_results() {
    let app = app(vec![
        species_counts(&[(7, 30), (8, 10), (9, 20)]),
        taxon(7, "Seven"),
        taxon(8, "Eight"),
        taxon(9, "Nine"),
    ]);

    let response = app
        .oneshot(get("/api/least-observed?observer_id=kestrel&result_count=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response.into_body()).await).unwrap();
    let ids: Vec<u64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["species_id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![8, 9, 7]);
    assert_eq!(body["distinct_species"], 3);
    assert_eq!(body["total_observations"], 60);
    assert_eq!(body["results"][0]["display_name"], "Eight");
}

#[tokio::test]
async fn api_accepts_form_count_field() {
    let app = app(vec![
        species_counts(&[(7, 30), (8, 10), (9, 20)]),
        taxon(8, "Eight"),
        taxon(9, "Nine"),
    ]);

    let response = app
        .oneshot(get("/api/least-observed?observer_id=kestrel&number_of_results=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response.into_body()).await).unwrap();
    assert_eq!(body["result_count"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"][0]["species_id"], 8);
}

#[tokio::test]
async fn huge_upstream_counts_do_not_break_the_request() {
    let app = app(vec![
        species_counts(&[(7, u64::MAX), (8, 10)]),
        taxon(7, "Seven"),
        taxon(8, "Eight"),
    ]);

    let response = app
        .oneshot(get("/api/least-observed?observer_id=kestrel&result_count=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response.into_body()).await).unwrap();
    assert_eq!(body["total_observations"], u64::MAX);
    assert_eq!(body["results"][1]["species_id"], 7);
}

#[tokio::test]
async fn api_rejects_malformed_observer_id() {
    let response = app(vec![])
        .oneshot(get("/api/least-observed?observer_id=bad%20id"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
