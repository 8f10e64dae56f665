use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::config;
use crate::routes;
use crate::state::AppState;

const IMMUTABLE: &str = "public, max-age=31536000, immutable";

pub(crate) fn build_app(state: AppState) -> Router {
    let maps = Router::new()
        .fallback_service(
            ServeDir::new(config::maps_dir())
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_maps_cache_control));

    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new(config::static_dir())
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let app = Router::new()
        .route(
            "/api/territories",
            axum::routing::get(routes::api::get_territories),
        )
        .route(
            "/api/coverage",
            axum::routing::get(routes::api::get_coverage),
        )
        .route("/api/health", axum::routing::get(routes::api::health))
        .nest_service("/maps", maps);

    app.layer(CompressionLayer::new())
        .fallback_service(static_assets)
        .with_state(state)
}

/// Boundary files are versioned by deployment and never change in place.
async fn set_maps_cache_control(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE));
    }
    response
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if is_hashed_bundle_asset(path) {
        return Some(IMMUTABLE);
    }

    if path.starts_with("/fonts/") || path.starts_with("/icons/") {
        return Some("public, max-age=86400");
    }

    None
}

fn is_hashed_bundle_asset(path: &str) -> bool {
    let path = Path::new(path);
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    if !matches!(ext, "wasm" | "js" | "css") {
        return false;
    }
    let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    filename
        .split(['-', '_', '.'])
        .any(|segment| segment.len() >= 8 && segment.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use velox_shared::TerritoryCatalog;

    #[test]
    fn immutable_cache_for_hashed_bundle_assets() {
        assert_eq!(
            cache_control_for_path("/velox-client-3f9a27c0d1e4b856_bg.wasm"),
            Some(IMMUTABLE)
        );
        assert_eq!(
            cache_control_for_path("/styles-a93762ff3bf6d63a.css"),
            Some(IMMUTABLE)
        );
    }

    #[test]
    fn short_cache_for_unhashed_static_assets() {
        assert_eq!(
            cache_control_for_path("/fonts/inter-regular.woff2"),
            Some("public, max-age=86400")
        );
        assert_eq!(cache_control_for_path("/velox-client.js"), None);
    }

    #[test]
    fn no_cache_header_override_for_html() {
        assert_eq!(cache_control_for_path("/"), None);
        assert_eq!(cache_control_for_path("/index.html"), None);
    }

    #[tokio::test]
    async fn boundary_files_are_served_immutable() {
        let dir = std::env::temp_dir().join(format!("velox-maps-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("create maps dir");
        tokio::fs::write(dir.join(config::STATES_TOPO_FILE), r#"{"type":"Topology"}"#)
            .await
            .expect("write topology");

        let app = temp_env::with_var("VELOX_MAPS_DIR", Some(dir.as_os_str()), || {
            build_app(AppState::new(TerritoryCatalog::default()))
        });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri(format!("/maps/{}", config::STATES_TOPO_FILE))
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("router is infallible");
        let _ = tokio::fs::remove_dir_all(&dir).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|value| value.to_str().ok()),
            Some(IMMUTABLE)
        );
    }
}
