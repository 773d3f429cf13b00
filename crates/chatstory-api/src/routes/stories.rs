//! Routes for opening and editing stories under preview.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chatstory_core::model::{CharacterId, Message, Story};
use chatstory_narrative::application::command_handlers;
use chatstory_narrative::application::query_handlers::{self, PathSummary, PreviewFrame};
use chatstory_narrative::application::session::PlaybackEffect;
use chatstory_narrative::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreateStoryResponse {
    /// Identifier of the new preview session.
    pub story_id: Uuid,
}

/// Request body for PUT /{story_id}/messages.
#[derive(Debug, Deserialize)]
pub struct ReplaceMessagesRequest {
    /// The edited script in authored order.
    pub messages: Vec<Message>,
}

/// Response body for edits.
#[derive(Debug, Serialize)]
pub struct EditResponse {
    /// What the edit did to playback.
    pub playback: PlaybackEffect,
}

/// POST /
#[instrument(skip_all, fields(title = %story.title))]
async fn create_story(
    State(state): State<AppState>,
    Json(story): Json<Story>,
) -> Result<(StatusCode, Json<CreateStoryResponse>), ApiError> {
    let session = state.open_story(story).await?;
    info!(story_id = %session.id(), "opened preview session");
    Ok((
        StatusCode::CREATED,
        Json(CreateStoryResponse {
            story_id: session.id(),
        }),
    ))
}

/// DELETE /{story_id}
#[instrument(skip(state), fields(story_id = %story_id))]
async fn close_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.close_story(story_id).await?;
    info!("closed preview session");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /{story_id}/messages
#[instrument(skip(state, request), fields(story_id = %story_id))]
async fn replace_messages(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Json(request): Json<ReplaceMessagesRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    let session = state.session(story_id).await?;
    let command = commands::ReplaceScript {
        correlation_id: Uuid::new_v4(),
        messages: request.messages,
    };
    let playback = command_handlers::handle_replace_script(&command, &session)?;
    Ok(Json(EditResponse { playback }))
}

/// DELETE /{story_id}/characters/{character_id}
#[instrument(skip(state), fields(story_id = %story_id, character_id = %character_id))]
async fn remove_character(
    State(state): State<AppState>,
    Path((story_id, character_id)): Path<(Uuid, String)>,
) -> Result<Json<EditResponse>, ApiError> {
    let session = state.session(story_id).await?;
    let command = commands::RemoveCharacter {
        correlation_id: Uuid::new_v4(),
        character_id: CharacterId::from(character_id),
    };
    let playback = command_handlers::handle_remove_character(&command, &session)?;
    Ok(Json(EditResponse { playback }))
}

/// GET /{story_id}/path
async fn get_path(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<PathSummary>, ApiError> {
    let session = state.session(story_id).await?;
    Ok(Json(query_handlers::get_path(&session)))
}

/// GET /{story_id}/preview
async fn get_preview(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<PreviewFrame>, ApiError> {
    let session = state.session(story_id).await?;
    Ok(Json(query_handlers::get_preview_frame(&session)))
}

/// Returns the router for story editing and static preview.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_story))
        .route("/{story_id}", delete(close_story))
        .route("/{story_id}/messages", put(replace_messages))
        .route(
            "/{story_id}/characters/{character_id}",
            delete(remove_character),
        )
        .route("/{story_id}/path", get(get_path))
        .route("/{story_id}/preview", get(get_preview))
}
