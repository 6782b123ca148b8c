//! Speech generation, narration and generated audio routes.

mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

    Router::new()
        .route("/languages", get(handlers::list_languages))
        .route("/examples", get(handlers::list_examples))
        .route(
            "/speech",
            post(handlers::create_speech).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/speech/file",
            post(handlers::create_narration).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/audio/:file_name", get(handlers::get_audio))
}
