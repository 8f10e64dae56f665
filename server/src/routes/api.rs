use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::state::AppState;

const CATALOG_CACHE_CONTROL: &str = "public, max-age=60";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalog = state.catalog.index.catalog();
    let coverage = state.coverage.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "states": catalog.state_count(),
        "territories": catalog.territory_count(),
        "warnings": coverage.warnings.len(),
        "audit_complete": coverage.audit.is_some(),
    }))
}

/// Serve the catalog serialized at startup; it never changes while running.
pub async fn get_territories(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let etag = state.catalog.etag.as_str();
    if if_none_match_matches(&headers, etag) {
        return not_modified_response(CATALOG_CACHE_CONTROL, Some(etag));
    }
    json_bytes_response(
        state.catalog.json.clone(),
        CATALOG_CACHE_CONTROL,
        Some(etag),
    )
}

pub async fn get_coverage(State(state): State<AppState>) -> Response {
    let coverage = state.coverage.read().await;
    match serde_json::to_vec(&*coverage) {
        Ok(body) => json_bytes_response(Bytes::from(body), "no-cache", None),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize coverage report");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    insert_etag(headers, etag);
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    insert_etag(headers, etag);
    response
}

fn insert_etag(headers: &mut HeaderMap, etag: Option<&str>) {
    if let Some(etag) = etag
        && let Ok(value) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, value);
    }
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(raw) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}
