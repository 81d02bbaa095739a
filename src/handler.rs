use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State, rejection::BytesRejection},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{ErrorResponse, HealthResponse};
use crate::db::Database;
use crate::model::BookmarkPayload;
use crate::{bad_request, created, not_found_response, server_error};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

/// Builds the loopback API.
///
/// `max_concurrent_requests` bounds how many requests reach a handler at
/// once across all routes; 1 serves strictly one request at a time.
/// `max_body_bytes` caps a request body, matching the native frame limit.
pub fn routes(state: AppState, max_concurrent_requests: usize, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(healthcheck).fallback(not_found))
        .route("/bookmarks", post(create_bookmark).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answers preflights and stamps permissive CORS headers on every response.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(HealthResponse::ok())
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("error reading request body: {}", e);
            return server_error(&e.body_text());
        }
    };

    let payload: BookmarkPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("error processing request: {}", e);
            return server_error(&e.to_string());
        }
    };

    let result = state.db.insert_bookmark(payload).await;
    if result.success {
        created(result)
    } else {
        bad_request(result)
    }
}

pub async fn not_found() -> Response {
    not_found_response(ErrorResponse::new("Not found"))
}
