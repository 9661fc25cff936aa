use std::future::Future;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Form, Json, Multipart, Query, State},
    http::StatusCode,
    response::{Html, Redirect, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::api::models::{
    RecordingResponse, SearchParams, SearchResponse, SummarizeTextRequest, SummaryResponse,
};
use crate::api::response;
use crate::error::{AppError, Result};
use crate::models::Upload;
use crate::render::render_page;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    let upload_limit = app_state.config.max_upload_bytes;
    Router::new()
        .route("/", get(console_page))
        .route("/ui/record", post(ui_record))
        .route("/ui/stop", post(ui_stop))
        .route(
            "/ui/summarize",
            post(ui_summarize_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/ui/summarize-text", post(ui_summarize_text))
        .route("/ui/search", get(ui_search))
        .route("/api/record", post(api_record))
        .route("/api/stop", post(api_stop))
        .route("/api/summarize", post(api_summarize))
        .route("/api/search", get(api_search))
        .route("/api/status", get(api_status))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn settle<T>(action: &'static str, request: impl Future<Output = Result<T>>) -> Result<T> {
    let start_time = Instant::now();
    let result = request.await;
    info!(action, elapsed = ?start_time.elapsed(), ok = result.is_ok(), "request settled");
    result
}

/// The console has already recorded the outcome (alert, output, state), so the
/// form handlers only need to send the browser back to the page.
fn back_to_console<T>(result: Result<T>) -> Redirect {
    if let Err(err) = result {
        debug!(error = %err, "outcome surfaced on the console");
    }
    Redirect::to("/")
}

async fn console_page(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.controller.take_view()))
}

async fn ui_record(State(state): State<AppState>) -> Redirect {
    back_to_console(settle("record", state.controller.start_recording()).await)
}

async fn ui_stop(State(state): State<AppState>) -> Redirect {
    back_to_console(settle("stop", state.controller.stop_recording()).await)
}

async fn ui_summarize_file(State(state): State<AppState>, mut multipart: Multipart) -> Redirect {
    match read_upload(&mut multipart, state.config.max_upload_bytes).await {
        Ok(upload) => back_to_console(settle("summarize", state.controller.summarize_file(upload)).await),
        Err(err) => {
            state.controller.report(&err);
            Redirect::to("/")
        }
    }
}

async fn ui_summarize_text(
    State(state): State<AppState>,
    Form(req): Form<SummarizeTextRequest>,
) -> Redirect {
    back_to_console(settle("summarize", state.controller.summarize_text(req.text)).await)
}

async fn ui_search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Redirect {
    back_to_console(settle("search", state.controller.search(params.query)).await)
}

async fn api_record(State(state): State<AppState>) -> Response {
    let result = settle("record", state.controller.start_recording()).await;
    response::respond(result.map(|message| RecordingResponse { message }))
}

async fn api_stop(State(state): State<AppState>) -> Response {
    let result = settle("stop", state.controller.stop_recording()).await;
    response::respond(result.map(|message| RecordingResponse { message }))
}

async fn api_summarize(
    State(state): State<AppState>,
    Json(req): Json<SummarizeTextRequest>,
) -> Response {
    let result = settle("summarize", state.controller.summarize_text(req.text)).await;
    response::respond(result.map(|summary| SummaryResponse { summary }))
}

async fn api_search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.query;
    let result = settle("search", state.controller.search(query.clone())).await;
    response::respond(result.map(|results| SearchResponse {
        query,
        count: results.len(),
        results,
    }))
}

async fn api_status(State(state): State<AppState>) -> Response {
    response::success(state.controller.view())
}

/// Pulls the `file` field out of the form. Browsers send an empty part with an
/// empty file name when nothing was selected; that counts as no file.
async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<Option<Upload>> {
    let upload_error = |err: MultipartError| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Validation(format!("File too large: uploads are limited to {} bytes", limit))
        } else {
            AppError::Validation(format!("Invalid form data: {}", err.body_text()))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(upload_error)?;
        if file_name.is_empty() {
            return Ok(None);
        }

        let mut upload = Upload::new(file_name, bytes.to_vec());
        if let Some(content_type) = content_type {
            upload = upload.with_content_type(content_type);
        }
        return Ok(Some(upload));
    }
    Ok(None)
}
