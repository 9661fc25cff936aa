mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Query, RawQuery};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use meeting_console::backend::BackendClient;
use meeting_console::controller::{Action, RequestState, UiController, MISSING_FILE_MESSAGE};
use meeting_console::error::AppError;
use meeting_console::models::{SearchResult, Upload, NO_SUMMARY_PLACEHOLDER};
use meeting_console::render::render_search_results;
use serde_json::{json, Value};
use tokio::sync::Notify;

use common::{config_for, controller_for, dead_backend_url, spawn_backend, Hits};

#[tokio::test]
async fn start_and_stop_alert_the_response_body() {
    let router = Router::new()
        .route("/record", post(|| async { "OK" }))
        .route("/stop", post(|| async { "OK" }));
    let controller = controller_for(&spawn_backend(router).await);

    assert_eq!(controller.start_recording().await.expect("record"), "OK");
    let view = controller.take_view();
    assert_eq!(view.alert.as_deref(), Some("OK"));
    assert!(matches!(view.state_of(Action::Record), Some(RequestState::Succeeded { .. })));

    assert_eq!(controller.stop_recording().await.expect("stop"), "OK");
    let view = controller.take_view();
    assert_eq!(view.alert.as_deref(), Some("OK"));
    assert!(matches!(view.state_of(Action::Stop), Some(RequestState::Succeeded { .. })));
}

#[tokio::test]
async fn error_status_is_surfaced_as_alert() {
    let router = Router::new().route(
        "/record",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "microphone busy") }),
    );
    let controller = controller_for(&spawn_backend(router).await);

    let err = controller.start_recording().await.expect_err("should fail");
    assert!(matches!(err, AppError::Status { status: 500, ref body } if body == "microphone busy"));

    let view = controller.take_view();
    assert_eq!(view.alert.as_deref(), Some("Backend answered 500: microphone busy"));
    assert!(matches!(
        view.state_of(Action::Record),
        Some(RequestState::Failed { message, .. }) if message.contains("microphone busy")
    ));
}

#[tokio::test]
async fn unreachable_backend_is_a_fetch_error() {
    let controller = controller_for(&dead_backend_url().await);

    let err = controller.search("budget").await.expect_err("should fail");
    assert!(matches!(err, AppError::FetchError(_)));
    assert!(controller.take_view().alert.is_some());
}

#[tokio::test]
async fn missing_file_never_reaches_the_backend() {
    let hits = Hits::default();
    let counter = hits.clone();
    let router = Router::new().route(
        "/summarize",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.bump();
                "unexpected"
            }
        }),
    );
    let controller = controller_for(&spawn_backend(router).await);

    let err = controller.summarize_file(None).await.expect_err("should fail");
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(hits.count(), 0);
    assert_eq!(controller.take_view().alert.as_deref(), Some(MISSING_FILE_MESSAGE));
}

#[derive(Debug, Clone, PartialEq)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

#[tokio::test]
async fn file_summary_is_one_multipart_post_with_a_file_field() {
    let hits = Hits::default();
    let received: Arc<Mutex<Vec<ReceivedField>>> = Arc::default();
    let (counter, sink) = (hits.clone(), received.clone());
    let router = Router::new().route(
        "/summarize",
        post(move |mut multipart: Multipart| {
            let (counter, sink) = (counter.clone(), sink.clone());
            async move {
                counter.bump();
                while let Some(field) = multipart.next_field().await.expect("field") {
                    let name = field.name().unwrap_or_default().to_string();
                    let file_name = field.file_name().map(str::to_owned);
                    let bytes = field.bytes().await.expect("bytes").to_vec();
                    sink.lock().unwrap().push(ReceivedField { name, file_name, bytes });
                }
                "Team agreed to ship on Friday."
            }
        }),
    );
    let controller = controller_for(&spawn_backend(router).await);

    let upload = Upload::new("13-45-30.txt", b"we talked about shipping".to_vec())
        .with_content_type("text/plain");
    let summary = controller.summarize_file(Some(upload)).await.expect("summary");

    assert_eq!(summary, "Team agreed to ship on Friday.");
    assert_eq!(hits.count(), 1);
    assert_eq!(
        *received.lock().unwrap(),
        vec![ReceivedField {
            name: "file".to_string(),
            file_name: Some("13-45-30.txt".to_string()),
            bytes: b"we talked about shipping".to_vec(),
        }]
    );
    assert_eq!(
        controller.view().summary.as_deref(),
        Some("Team agreed to ship on Friday.")
    );
}

#[tokio::test]
async fn text_summary_posts_json_and_reads_the_summary_field() {
    let received: Arc<Mutex<Option<Value>>> = Arc::default();
    let sink = received.clone();
    let router = Router::new().route(
        "/summarize",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(body);
                Json(json!({ "summary": "Short version." }))
            }
        }),
    );
    let controller = controller_for(&spawn_backend(router).await);

    let summary = controller.summarize_text("A long meeting transcript").await.expect("summary");
    assert_eq!(summary, "Short version.");
    assert_eq!(
        received.lock().unwrap().clone(),
        Some(json!({ "text": "A long meeting transcript" }))
    );
}

#[tokio::test]
async fn text_summary_without_summary_field_uses_placeholder() {
    let router = Router::new().route("/summarize", post(|| async { Json(json!({})) }));
    let controller = controller_for(&spawn_backend(router).await);

    let summary = controller.summarize_text("anything").await.expect("summary");
    assert_eq!(summary, NO_SUMMARY_PLACEHOLDER);
    assert_eq!(controller.view().summary.as_deref(), Some(NO_SUMMARY_PLACEHOLDER));
}

#[tokio::test]
async fn summarize_endpoint_is_configurable() {
    let summarizer = spawn_backend(Router::new().route("/v2/summarize", post(|| async { "from v2" }))).await;
    let backend = dead_backend_url().await;
    let summarize_url = format!("{}v2/summarize", summarizer);
    let config = config_for(&backend, &[("SUMMARIZE_URL", summarize_url.as_str())]);
    let controller = UiController::new(BackendClient::new(&config).expect("client"));

    assert_eq!(controller.summarize_text("x").await.expect("summary"), "from v2");
}

#[tokio::test]
async fn search_query_is_sent_encoded_and_decodes_to_the_literal_text() {
    let raw_queries: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = raw_queries.clone();
    let router = Router::new().route(
        "/search",
        get(move |RawQuery(raw): RawQuery, Query(params): Query<HashMap<String, String>>| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(raw.unwrap_or_default());
                let query = params.get("query").cloned().unwrap_or_default();
                Json(json!([{ "date": "2024-01-01", "content": query }]))
            }
        }),
    );
    let controller = controller_for(&spawn_backend(router).await);

    let results = controller.search("hello world").await.expect("results");
    assert_eq!(results[0].content, "hello world");

    let raw = raw_queries.lock().unwrap()[0].clone();
    assert!(raw.starts_with("query="));
    assert!(!raw.contains(' '));

    controller.search("a&b=c").await.expect("results");
    assert_eq!(controller.view().search_results[0].content, "a&b=c");
}

#[tokio::test]
async fn search_results_are_shown_date_first() {
    let router = Router::new().route(
        "/search",
        get(|| async { Json(json!([{ "date": "2024-01-01", "content": "A" }])) }),
    );
    let controller = controller_for(&spawn_backend(router).await);

    controller.search("anything").await.expect("results");
    let view = controller.view();
    assert_eq!(
        view.search_results,
        vec![SearchResult {
            date: "2024-01-01".to_string(),
            content: "A".to_string(),
            path: None,
            score: None,
        }]
    );
    let html = render_search_results(&view.search_results);
    let date_at = html.find("2024-01-01").expect("date");
    let content_at = html.find(" A<").expect("content");
    assert!(date_at < content_at);
}

#[tokio::test]
async fn malformed_search_answer_is_a_parse_error() {
    let router = Router::new().route("/search", get(|| async { "not json" }));
    let controller = controller_for(&spawn_backend(router).await);

    let err = controller.search("x").await.expect_err("should fail");
    assert!(matches!(err, AppError::ParseError(_)));
    assert!(matches!(controller.view().state_of(Action::Search), Some(RequestState::Failed { .. })));
}

#[tokio::test]
async fn newer_search_supersedes_one_still_in_flight() {
    let slow_arrived = Arc::new(Notify::new());
    let signal = slow_arrived.clone();
    let router = Router::new().route(
        "/search",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let signal = signal.clone();
            async move {
                let query = params.get("query").cloned().unwrap_or_default();
                if query == "slow" {
                    signal.notify_one();
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Json(json!([{ "date": "2024-01-01", "content": query }]))
            }
        }),
    );
    let controller = controller_for(&spawn_backend(router).await);

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.search("slow").await })
    };
    tokio::time::timeout(Duration::from_secs(5), slow_arrived.notified())
        .await
        .expect("slow request reached the backend");
    assert!(matches!(controller.view().state_of(Action::Search), Some(RequestState::Pending { .. })));

    let second = controller.search("fast").await.expect("second search");
    assert_eq!(second[0].content, "fast");

    let first = first.await.expect("join");
    assert!(matches!(first, Err(AppError::Cancelled)));

    let view = controller.view();
    assert_eq!(view.search_results[0].content, "fast");
    assert!(matches!(view.state_of(Action::Search), Some(RequestState::Succeeded { .. })));
}

#[tokio::test]
async fn different_actions_do_not_supersede_each_other() {
    let router = Router::new()
        .route(
            "/record",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "Recording started!"
            }),
        )
        .route("/search", get(|| async { Json(json!([])) }));
    let controller = controller_for(&spawn_backend(router).await);

    let (recorded, searched) = tokio::join!(controller.start_recording(), controller.search("x"));
    assert_eq!(recorded.expect("record"), "Recording started!");
    assert!(searched.expect("search").is_empty());
}

#[tokio::test]
async fn slow_backend_times_out() {
    let router = Router::new().route(
        "/stop",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "late"
        }),
    );
    let base = spawn_backend(router).await;
    let config = config_for(&base, &[("REQUEST_TIMEOUT_SECS", "1")]);
    let controller = UiController::new(BackendClient::new(&config).expect("client"));

    let err = controller.stop_recording().await.expect_err("should time out");
    assert!(matches!(err, AppError::Timeout(_)));
}
