use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod encoder;
pub mod events;
pub mod handler;
pub mod hls;
pub mod playlist;
pub mod repository;
pub mod service;
pub mod storage;
pub mod streaming;
#[cfg(test)]
pub mod test_support;

/// Content-facing API, nested under /api/v1/media. POST takes a category
/// name, GET/DELETE take a content id; the single route entry keeps axum
/// from seeing two conflicting `/{param}` patterns.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{key}",
        post(handler::upload_media)
            .get(handler::get_media)
            .delete(handler::delete_media),
    )
}

/// File delivery at the root: originals under /media, artifacts under /hls.
/// `get` also matches HEAD; the handlers answer those with headers only.
pub fn delivery_router() -> Router<AppState> {
    Router::new()
        .route("/media/{*path}", get(streaming::stream_media))
        .route("/hls/{*path}", get(streaming::stream_hls))
}
