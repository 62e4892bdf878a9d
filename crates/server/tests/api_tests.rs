use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use bytes::Bytes;
use tower::ServiceExt;

use medverify_blob::{ImageStore, MemoryImageStore};
use medverify_core::Verdict;
use medverify_engine::{FailingVerdictEngine, MockVerdictEngine, VerdictEngine};
use medverify_pipeline::AnalysisPipeline;
use medverify_records_memory::MemoryRecordStore;
use medverify_server::api::AppState;
use medverify_server::auth::JwtVerifier;

const SECRET: &str = "test-secret";
const BOUNDARY: &str = "medverify-test-boundary";

// -- Helpers --------------------------------------------------------------

fn build_test_state(engine: Arc<dyn VerdictEngine>, auth: Option<Arc<JwtVerifier>>) -> AppState {
    let pipeline = AnalysisPipeline::builder()
        .images(Arc::new(MemoryImageStore::new("http://localhost:8080")))
        .records(Arc::new(MemoryRecordStore::new()))
        .engine(engine)
        .build()
        .expect("pipeline should build");

    AppState::new(Arc::new(pipeline), auth, 1024 * 1024)
}

fn open_state() -> AppState {
    build_test_state(Arc::new(MockVerdictEngine::returning(Verdict::Fake, 93.0)), None)
}

fn secured_state() -> AppState {
    build_test_state(
        Arc::new(MockVerdictEngine::returning(Verdict::Authentic, 88.0)),
        Some(Arc::new(JwtVerifier::new(SECRET))),
    )
}

fn build_app(state: AppState) -> axum::Router {
    medverify_server::api::router(state)
}

fn token(user: &str) -> String {
    JwtVerifier::new(SECRET).issue(user, 300).unwrap()
}

async fn stored_image(state: &AppState, owner: &str) -> String {
    state
        .images
        .put(owner, "pack.png", "image/png", Bytes::from_static(b"\x89PNG pixels"))
        .await
        .unwrap()
        .url
}

fn analyze_request(body: &serde_json::Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(http::Method::POST)
        .uri("/analyze-medicine")
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get_as(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-user-id", user)
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(user: &str, parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (filename, content_type, data) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(http::Method::POST)
        .uri("/v1/analyses")
        .header("x-user-id", user)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// -- Health ---------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let app = build_app(open_state());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["engine"], "mock");
    assert_eq!(json["metrics"]["submitted"], 0);
}

#[tokio::test]
async fn metrics_count_completed_instances() {
    let state = open_state();
    let url = stored_image(&state, "alice").await;
    let app = build_app(state);

    let body = serde_json::json!({"imageUrl": url, "imageName": "pack.png", "userId": "alice"});
    let response = app.clone().oneshot(analyze_request(&body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["submitted"], 1);
    assert_eq!(json["completed"], 1);
    assert_eq!(json["fake"], 1);
}

// -- POST /analyze-medicine ----------------------------------------------

#[tokio::test]
async fn analyze_medicine_stores_record() {
    let state = open_state();
    let url = stored_image(&state, "alice").await;
    let app = build_app(state);

    let body = serde_json::json!({"imageUrl": url, "imageName": "pack.png", "userId": "alice"});
    let response = app.oneshot(analyze_request(&body, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(!json["id"].as_str().unwrap().is_empty());
    assert_eq!(json["ownerId"], "alice");
    assert_eq!(json["imageName"], "pack.png");
    assert_eq!(json["imageUrl"], url);
    assert_eq!(json["verdict"], "fake");
    assert_eq!(json["confidenceScore"], 93.0);
    assert!(json["analysisDetails"].as_str().is_some());
    assert!(json["createdAt"].as_str().is_some());
}

#[tokio::test]
async fn analyze_medicine_missing_field_is_400() {
    let app = build_app(open_state());

    let body = serde_json::json!({"imageName": "pack.png", "userId": "alice"});
    let response = app.oneshot(analyze_request(&body, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("imageUrl"));
}

#[tokio::test]
async fn analyze_medicine_bad_body_is_400_with_error() {
    let cases: [(&str, &[u8]); 3] = [
        ("application/json", b"not json"),
        (
            "application/json",
            br#"{"imageUrl": 5, "imageName": "pack.png", "userId": "alice"}"#,
        ),
        (
            "text/plain",
            br#"{"imageUrl": "http://x/1.png", "imageName": "1.png", "userId": "alice"}"#,
        ),
    ];

    for (content_type, payload) in cases {
        let app = build_app(open_state());
        let request = Request::builder()
            .method(http::Method::POST)
            .uri("/analyze-medicine")
            .header("content-type", content_type)
            .body(Body::from(payload.to_vec()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "content-type {content_type}"
        );
        let json = json_body(response).await;
        assert!(json["error"].is_string(), "got {json}");
    }
}

#[tokio::test]
async fn analyze_medicine_without_user_is_401() {
    let app = build_app(open_state());

    let body = serde_json::json!({"imageUrl": "http://x/1.png", "imageName": "1.png"});
    let response = app.oneshot(analyze_request(&body, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn analyze_medicine_engine_failure_is_400_and_stores_nothing() {
    let state = build_test_state(Arc::new(FailingVerdictEngine::new("model exploded")), None);
    let url = stored_image(&state, "alice").await;
    let app = build_app(state);

    let body = serde_json::json!({"imageUrl": url, "imageName": "pack.png", "userId": "alice"});
    let response = app.clone().oneshot(analyze_request(&body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("model exploded"));

    let response = app.oneshot(get_as("/v1/analyses", "alice")).await.unwrap();
    assert_eq!(json_body(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn analyze_medicine_requires_token_when_auth_enabled() {
    let state = secured_state();
    let url = stored_image(&state, "alice").await;
    let app = build_app(state);
    let body = serde_json::json!({"imageUrl": url, "imageName": "pack.png", "userId": "alice"});

    let missing = app.clone().oneshot(analyze_request(&body, None)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let invalid = app
        .clone()
        .oneshot(analyze_request(&body, Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);

    let ok = app
        .oneshot(analyze_request(&body, Some(&token("alice"))))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let json = json_body(ok).await;
    assert_eq!(json["ownerId"], "alice");
    assert_eq!(json["verdict"], "authentic");
}

#[tokio::test]
async fn analyze_medicine_user_mismatch_is_403() {
    let state = secured_state();
    let url = stored_image(&state, "alice").await;
    let app = build_app(state);

    let body = serde_json::json!({"imageUrl": url, "imageName": "pack.png", "userId": "alice"});
    let response = app
        .oneshot(analyze_request(&body, Some(&token("mallory"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn header_identity_is_ignored_when_auth_enabled() {
    let app = build_app(secured_state());

    let response = app.oneshot(get_as("/v1/analyses", "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- POST /v1/analyses ----------------------------------------------------

#[tokio::test]
async fn upload_skips_non_images() {
    let app = build_app(open_state());

    let request = multipart_request(
        "alice",
        &[
            ("front.png", "image/png", b"\x89PNG front"),
            ("notes.txt", "text/plain", b"not an image"),
            ("back.jpg", "image/jpeg", b"\xff\xd8 back"),
        ],
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reports = json_body(response).await;
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2, "the text file must not become an instance");
    assert_eq!(reports[0]["imageName"], "front.png");
    assert_eq!(reports[1]["imageName"], "back.jpg");
    for report in reports {
        assert_eq!(report["state"], "complete");
        assert_eq!(report["record"]["verdict"], "fake");
        assert!(report.get("error").is_none());
    }

    let response = app.oneshot(get_as("/v1/analyses", "alice")).await.unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn upload_reports_failures_per_image() {
    let state = build_test_state(Arc::new(FailingVerdictEngine::new("no model")), None);
    let app = build_app(state);

    let request = multipart_request("alice", &[("a.png", "image/png", b"\x89PNG a")]);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reports = json_body(response).await;
    assert_eq!(reports[0]["state"], "failed");
    assert!(reports[0]["error"].as_str().unwrap().contains("no model"));
    assert!(reports[0].get("record").is_none());
}

#[tokio::test]
async fn upload_without_user_is_401() {
    let app = build_app(open_state());

    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/v1/analyses")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- History --------------------------------------------------------------

#[tokio::test]
async fn empty_history_is_empty_list() {
    let app = build_app(open_state());

    let response = app.oneshot(get_as("/v1/analyses", "newcomer")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn history_is_owner_scoped_and_newest_first() {
    let app = build_app(open_state());

    for name in ["first.png", "second.png"] {
        let request = multipart_request("alice", &[(name, "image/png", b"\x89PNG")]);
        assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    let request = multipart_request("bob", &[("bob.png", "image/png", b"\x89PNG")]);
    app.clone().oneshot(request).await.unwrap();

    let response = app.clone().oneshot(get_as("/v1/analyses", "alice")).await.unwrap();
    let records = json_body(response).await;
    let names: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["imageName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["second.png", "first.png"]);

    let response = app
        .oneshot(get_as("/v1/analyses?limit=1&verdict=fake", "alice"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_and_delete_enforce_ownership() {
    let app = build_app(open_state());

    let request = multipart_request("alice", &[("mine.png", "image/png", b"\x89PNG")]);
    let reports = json_body(app.clone().oneshot(request).await.unwrap()).await;
    let id = reports[0]["record"]["id"].as_str().unwrap().to_owned();
    let uri = format!("/v1/analyses/{id}");

    let response = app.clone().oneshot(get_as(&uri, "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["id"], id.as_str());

    let response = app.clone().oneshot(get_as(&uri, "bob")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let delete_as = |user: &str| {
        Request::builder()
            .method(http::Method::DELETE)
            .uri(&uri)
            .header("x-user-id", user)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete_as("bob")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.clone().oneshot(get_as(&uri, "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "forbidden delete keeps the record");

    let response = app.clone().oneshot(delete_as("alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get_as(&uri, "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.oneshot(delete_as("alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_count_verdicts() {
    let app = build_app(open_state());

    let request = multipart_request(
        "alice",
        &[("a.png", "image/png", b"\x89PNG"), ("b.png", "image/png", b"\x89PNG")],
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app.oneshot(get_as("/v1/analyses/stats", "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["fake"], 2);
    assert_eq!(json["authentic"], 0);
    assert_eq!(json["total"], 2);
}

// -- Images ---------------------------------------------------------------

#[tokio::test]
async fn stored_image_is_served_with_content_type() {
    let state = open_state();
    let url = stored_image(&state, "alice").await;
    let path = url.trim_start_matches("http://localhost:8080").to_owned();
    let app = build_app(state);

    let response = app
        .clone()
        .oneshot(Request::builder().uri(&path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let cache = response.headers()["cache-control"].to_str().unwrap();
    assert!(cache.starts_with("public"), "got {cache}");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"\x89PNG pixels");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/images/0190c7e4-0000-7000-8000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Surfaces -------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_is_permissive() {
    let app = build_app(open_state());

    let response = app
        .oneshot(
            Request::builder()
                .method(http::Method::OPTIONS)
                .uri("/analyze-medicine")
                .header("origin", "https://app.example.com")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_app(open_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-doc/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/analyze-medicine"].is_object());
}

#[tokio::test]
async fn event_stream_requires_identity() {
    let app = build_app(open_state());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/analyses/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get_as("/v1/analyses/events", "alice"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
}
