use crate::api::{ErrorResponse, SaveResponse};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod native;

pub fn server_error(msg: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(SaveResponse::failed(msg))).into_response()
}

pub fn bad_request(body: SaveResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub fn created(body: SaveResponse) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

pub fn not_found_response(body: ErrorResponse) -> Response {
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
