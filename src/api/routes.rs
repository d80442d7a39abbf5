//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use crate::api::websocket::ws_handler;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rust_embed::Embed;
use tower_http::cors::{Any, CorsLayer};

/// Embedded ballot page
#[derive(Embed)]
#[folder = "web/"]
struct Assets;

/// Serve root index.html
async fn index_handler() -> impl IntoResponse {
    serve_static("index.html")
}

fn plain_response(status: StatusCode, content_type: &str, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if let Ok(value) = header::HeaderValue::from_str(content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

/// Internal function to serve embedded files
fn serve_static(path: &str) -> Response {
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            plain_response(
                StatusCode::OK,
                mime.as_ref(),
                Body::from(content.data.into_owned()),
            )
        }
        None => plain_response(
            StatusCode::NOT_FOUND,
            "text/plain",
            Body::from("Not Found"),
        ),
    }
}

/// Fallback handler for static files
async fn fallback_handler(uri: axum::http::Uri) -> impl IntoResponse {
    let path = uri.path();

    // Don't serve HTML for API routes - return 404 JSON instead
    if path.starts_with("/api/") {
        return plain_response(
            StatusCode::NOT_FOUND,
            "application/json",
            Body::from(r#"{"error":"Not Found"}"#),
        );
    }

    let path = path.trim_start_matches('/');
    serve_static(if path.is_empty() { "index.html" } else { path })
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ws", get(ws_handler))
        .route("/contract.json", get(handlers::get_descriptor))
        .route("/api/candidates", get(handlers::list_candidates))
        .route("/api/tallies", get(handlers::get_tallies))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/vote", post(handlers::vote))
        // Ballot page
        .route("/", get(index_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_is_embedded() {
        let response = serve_static("index.html");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );
    }

    #[test]
    fn test_missing_asset() {
        let response = serve_static("nope.js");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json() {
        let uri: axum::http::Uri = "/api/nothing".parse().unwrap();
        let response = fallback_handler(uri).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
