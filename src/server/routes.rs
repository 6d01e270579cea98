//! HTTP route handlers for the Voyage agent API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::planner::{ConversationState, Message, PlannerError, SharedSession, Turn};
use crate::providers::Place;

use super::state::AppState;

type ApiError = (StatusCode, String);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/messages", post(post_message))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "voyage-agent",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.session_count()
    }))
}

/// Full view of a session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// Session identifier.
    pub session_id: Uuid,
    /// Current dialogue state.
    #[serde(flatten)]
    pub state: ConversationState,
    /// Transcript, oldest first.
    pub messages: Vec<Message>,
    /// Places from the last completed trip, for map markers.
    pub map_places: Vec<Place>,
}

/// A user submission.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// Raw user text.
    pub text: String,
}

async fn create_session(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let (_, shared) = state.open_session();
    let view = session_view(&shared)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let shared = lookup(&state, &id)?;
    Ok(Json(session_view(&shared)?))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.close_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Unknown session: {id}")))
    }
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<Turn>, ApiError> {
    let shared = lookup(&state, &id)?;
    let turn = shared
        .submit(&state.controller, &request.text)
        .await
        .map_err(planner_error)?;
    Ok(Json(turn))
}

async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let shared = lookup(&state, &id)?;
    shared.reset().map_err(planner_error)?;
    Ok(Json(session_view(&shared)?))
}

fn lookup(state: &AppState, id: &Uuid) -> Result<Arc<SharedSession>, ApiError> {
    state
        .session(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown session: {id}")))
}

fn session_view(shared: &SharedSession) -> Result<SessionView, ApiError> {
    let session = shared.snapshot().map_err(planner_error)?;
    Ok(SessionView {
        session_id: session.id(),
        state: session.state().clone(),
        messages: session.transcript().to_vec(),
        map_places: session.map_places().to_vec(),
    })
}

fn planner_error(e: PlannerError) -> ApiError {
    match e {
        PlannerError::Busy => (StatusCode::CONFLICT, e.to_string()),
        other => (StatusCode::INTERNAL_SERVER_ERROR, format!("Planner error: {other}")),
    }
}
