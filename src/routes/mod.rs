pub mod api;
pub mod sse;
pub mod ui;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // View state
        .route("/api/view", get(api::handle_view))
        .route("/api/view/events", get(sse::handle_view_events))
        .route("/api/status", get(api::handle_status))
        // Stacks
        .route("/api/stacks/{name}", delete(api::handle_delete_stack))
        .route("/api/stacks/{name}/ca", get(api::handle_certificate))
        // Session
        .route("/api/session/login", post(api::handle_login))
        .route("/api/session/logout", post(api::handle_logout))
        // Health
        .route("/healthz", get(api::handle_healthz))
        // Dashboard UI
        .route("/ui/", get(ui::handle_dashboard))
        // Root redirect
        .route(
            "/",
            get(|| async {
                axum::response::Redirect::to("/ui/")
            }),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
