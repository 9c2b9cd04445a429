use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::dashboard::Dashboard;
use crate::sync::{DeleteError, DeleteOutcome, Preconfirmed};

#[derive(Debug, Serialize)]
pub struct Status {
    pub status: String,
    pub message: String,
}

impl Status {
    fn new(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
        }
    }
}

fn failure(code: StatusCode, message: impl Into<String>) -> Response {
    (code, Json(Status::new("Failure", message))).into_response()
}

/// The mounted dashboard, or a 401 while logged out.
pub(crate) fn mounted(state: &AppState) -> Result<Arc<Dashboard>, Response> {
    state
        .host
        .current()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "not logged in"))
}

pub async fn handle_view(State(state): State<AppState>) -> Response {
    match mounted(&state) {
        Ok(dashboard) => Json(dashboard.reconciler().snapshot()).into_response(),
        Err(resp) => resp,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

pub async fn handle_delete_stack(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let dashboard = match mounted(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    // Run detached so a dropped connection cannot strand the entry mid-delete.
    let commander = dashboard.commander().clone();
    let stack = name.clone();
    let task = tokio::spawn(async move {
        commander
            .request_delete(&stack, &Preconfirmed(query.confirm))
            .await
    });

    match task.await {
        Ok(Ok(DeleteOutcome::Deleted)) => {
            Json(Status::new("Success", format!("stack {:?} deleted", name))).into_response()
        }
        Ok(Ok(DeleteOutcome::Declined)) => failure(
            StatusCode::BAD_REQUEST,
            format!("deletion of {:?} not confirmed", name),
        ),
        Ok(Err(e @ DeleteError::UnknownStack(_))) => failure(StatusCode::NOT_FOUND, e.to_string()),
        Ok(Err(e @ DeleteError::AlreadyDeleting(_))) => failure(StatusCode::CONFLICT, e.to_string()),
        Ok(Err(e @ DeleteError::Backend { .. })) => failure(StatusCode::BAD_GATEWAY, e.to_string()),
        Err(e) => {
            tracing::error!("delete task for {} failed: {}", name, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

pub async fn handle_certificate(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let dashboard = match mounted(&state) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match dashboard.certificate_url(&name) {
        Some(url) => Redirect::temporary(&url).into_response(),
        None => failure(StatusCode::NOT_FOUND, format!("stack {:?} not found", name)),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub token: String,
}

pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    match state.session.login(&req.token) {
        Ok(()) => {
            state.host.mount();
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => failure(StatusCode::UNAUTHORIZED, e.to_string()),
    }
}

pub async fn handle_logout(State(state): State<AppState>) -> StatusCode {
    state.session.logout();
    state.host.unmount();
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
pub struct SyncStatus {
    pub logged_in: bool,
    pub polling: bool,
    pub revision: u64,
    pub stacks: usize,
    pub detail_pollers: usize,
}

pub async fn handle_status(State(state): State<AppState>) -> Json<SyncStatus> {
    let dashboard = state.host.current();
    let snapshot = dashboard
        .as_ref()
        .map(|d| d.reconciler().snapshot())
        .unwrap_or_default();

    Json(SyncStatus {
        logged_in: state.session.is_authenticated(),
        polling: dashboard.as_ref().is_some_and(|d| d.is_running()),
        revision: snapshot.revision,
        stacks: snapshot.stacks.len(),
        detail_pollers: dashboard
            .as_ref()
            .map(|d| d.reconciler().active_pollers())
            .unwrap_or(0),
    })
}

pub async fn handle_healthz() -> &'static str {
    "ok\n"
}
