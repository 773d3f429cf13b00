//! Routes for animated playback and reader choices.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatstory_core::model::{MessageId, OptionId};
use chatstory_narrative::application::session::ChoiceOutcome;
use chatstory_narrative::application::{command_handlers, query_handlers};
use chatstory_narrative::domain::commands;
use chatstory_narrative::domain::playback::PlaybackSnapshot;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /{story_id}/playback/start.
#[derive(Debug, Serialize)]
pub struct StartResponse {
    /// The new run, or `None` when the script is empty.
    pub run_id: Option<Uuid>,
}

/// Response body for POST /{story_id}/playback/stop.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    /// Whether a run was in progress.
    pub cancelled: bool,
}

/// Request body for POST /{story_id}/choices.
#[derive(Debug, Deserialize)]
pub struct ChoiceRequest {
    /// The clicked fork.
    pub message_id: MessageId,
    /// The clicked option.
    pub option: OptionId,
}

/// POST /{story_id}/playback/start
#[instrument(skip(state), fields(story_id = %story_id))]
async fn start_playback(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StartResponse>, ApiError> {
    let session = state.session(story_id).await?;
    let command = commands::StartPlayback {
        correlation_id: Uuid::new_v4(),
    };
    let run_id = command_handlers::handle_start_playback(&command, &session);
    Ok(Json(StartResponse { run_id }))
}

/// POST /{story_id}/playback/stop
#[instrument(skip(state), fields(story_id = %story_id))]
async fn stop_playback(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StopResponse>, ApiError> {
    let session = state.session(story_id).await?;
    let command = commands::StopPlayback {
        correlation_id: Uuid::new_v4(),
    };
    let cancelled = command_handlers::handle_stop_playback(&command, &session);
    Ok(Json(StopResponse { cancelled }))
}

/// POST /{story_id}/choices
#[instrument(skip(state, request), fields(story_id = %story_id, message_id = %request.message_id))]
async fn resolve_choice(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Json(request): Json<ChoiceRequest>,
) -> Result<Json<ChoiceOutcome>, ApiError> {
    let session = state.session(story_id).await?;
    let command = commands::ResolveChoice {
        correlation_id: Uuid::new_v4(),
        message_id: request.message_id,
        option: request.option,
    };
    Ok(Json(command_handlers::handle_resolve_choice(
        &command, &session,
    )))
}

/// GET /{story_id}/playback
async fn get_playback(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<PlaybackSnapshot>, ApiError> {
    let session = state.session(story_id).await?;
    Ok(Json(query_handlers::get_playback(&session)))
}

/// Returns the router for playback control.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{story_id}/playback/start", post(start_playback))
        .route("/{story_id}/playback/stop", post(stop_playback))
        .route("/{story_id}/playback", get(get_playback))
        .route("/{story_id}/choices", post(resolve_choice))
}
