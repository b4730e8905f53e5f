//! PDF generation endpoints
//!
//! Three POST endpoints sharing one request contract: validate, render,
//! return raw PDF bytes with cache-disabling headers. Error mapping lives
//! on `AppError`.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};

use crate::error::Result;
use crate::service::GenerateRequest;
use crate::state::AppState;

/// Story payloads carry embedded base64 artwork, so bodies run large.
const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Create the PDF generation router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/generate-text-only", post(generate_text_only))
        .route("/generate-cover", post(generate_cover))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

fn log_request(variant: &str, headers: &HeaderMap) {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let source = headers
        .get("x-source")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info!(variant, request_id, source, "pdf generation requested");
}

/// Raw PDF bytes; caches disabled so regenerated books are never stale.
fn pdf_response(bytes: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(Body::from(bytes))
        .unwrap()
}

async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Result<Response> {
    log_request("book", &headers);
    let pdf = state.pdf_service().render_book(req).await?;
    Ok(pdf_response(pdf))
}

async fn generate_text_only(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Result<Response> {
    log_request("text-only", &headers);
    let pdf = state.pdf_service().render_text_only(req).await?;
    Ok(pdf_response(pdf))
}

async fn generate_cover(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Result<Response> {
    log_request("cover", &headers);
    let pdf = state.pdf_service().render_cover(req).await?;
    Ok(pdf_response(pdf))
}
