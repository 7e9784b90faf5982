//! HTTP front for the analyzer.
//!
//! Every route takes a multipart form with `file` and optional `password`;
//! `/api/analyze` and `/api/analyze-statement` also read `platform`.
//! Success is 200 with the report, a missing file is 400, and any analysis
//! failure is 500 with `{error, details}`.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use spendlens_core::StatementError;
use spendlens_ingest::StatementKind;
use spendlens_report::{AnalyzeRequest, Analyzer, ErrorBody};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::Config;

pub struct AppState {
    analyzer: Analyzer,
    spawn_retries: u32,
}

impl AppState {
    pub fn new(analyzer: Analyzer, spawn_retries: u32) -> Self {
        Self {
            analyzer,
            spawn_retries,
        }
    }
}

struct ApiError(StatementError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::from(&self.0)),
        )
            .into_response()
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::message(message))).into_response()
}

fn bad_multipart(err: MultipartError) -> Response {
    (err.status(), Json(ErrorBody::message(err.body_text()))).into_response()
}

#[derive(Debug, Default)]
struct Upload {
    file: Option<Vec<u8>>,
    password: Option<String>,
    platform: Option<String>,
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Response> {
    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    upload.file = Some(bytes.to_vec());
                }
            }
            Some("password") => {
                upload.password = non_empty(field.text().await.map_err(bad_multipart)?);
            }
            Some("platform") => {
                upload.platform = non_empty(field.text().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }
    Ok(upload)
}

/// The route is the caller that owns retries; the analyzer never retries.
async fn run(state: &AppState, req: AnalyzeRequest) -> Response {
    let mut attempt = 0;
    loop {
        match state.analyzer.analyze(req.clone()).await {
            Ok(report) => return (StatusCode::OK, Json(report)).into_response(),
            Err(err) if err.is_retryable() && attempt < state.spawn_retries => {
                attempt += 1;
                warn!(attempt, max = state.spawn_retries, error = %err, "retrying analysis");
            }
            Err(err) => return ApiError(err).into_response(),
        }
    }
}

async fn handle(state: &AppState, multipart: Multipart, fixed: Option<StatementKind>) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let kind = match (fixed, upload.platform.as_deref()) {
        (Some(kind), _) => kind,
        (None, Some(platform)) => match StatementKind::from_str(platform) {
            Ok(kind) => kind,
            Err(_) => return bad_request(format!("Unsupported platform: {platform}")),
        },
        (None, None) => StatementKind::Auto,
    };

    // demo data needs no upload
    if kind == StatementKind::Demo {
        return run(
            state,
            AnalyzeRequest {
                kind,
                ..AnalyzeRequest::default()
            },
        )
        .await;
    }

    let Some(pdf) = upload.file else {
        return bad_request("No file provided");
    };
    info!(bytes = pdf.len(), kind = %kind, "statement uploaded");
    run(
        state,
        AnalyzeRequest {
            pdf,
            password: upload.password,
            kind,
        },
    )
    .await
}

async fn analyze_statement(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    handle(&state, multipart, None).await
}

async fn analyze_kotak(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    handle(&state, multipart, Some(StatementKind::Kotak)).await
}

async fn analyze_phonepe(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    handle(&state, multipart, Some(StatementKind::PhonePe)).await
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "build": env!("SPENDLENS_BUILD_SHA"),
    }))
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze_statement))
        .route("/api/analyze-statement", post(analyze_statement))
        .route("/api/analyze-kotak-statement", post(analyze_kotak))
        .route("/api/analyze-phonepe", post(analyze_phonepe))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &Config, bind: Option<String>) -> Result<()> {
    let state = Arc::new(AppState::new(
        config.analyzer()?,
        config.server.spawn_retries,
    ));
    let app = router(state, config.server.max_upload_bytes());

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "spendlens server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;
    Ok(())
}
