//! Route definitions.

use axum::{Router, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{AppState, handlers};

/// Build the viewer's router.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.static_dir.as_path());
    Router::new()
        .route("/", get(handlers::compare::first_image))
        .route("/compare/{image_id}", get(handlers::compare::compare_image))
        .route("/translate", get(handlers::translate::translate_text))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
