use super::api_json::ApiJson;
use super::error::ApiError;
use super::session::Identity;
use super::state::{GuardedMediaStore, ServerState};
use crate::media_store::TrackId;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 100;

#[derive(Deserialize, Debug)]
struct TrackInteractionBody {
    pub track_id: Option<TrackId>,
    pub interaction_type: Option<String>,
    pub play_duration: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct RecentQuery {
    pub limit: Option<usize>,
}

async fn post_favorite(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Path(track_id): Path<TrackId>,
) -> Response {
    match store.toggle_favorite(&identity.user_id, track_id) {
        Ok(Some(favorited)) => Json(json!({ "favorited": favorited })).into_response(),
        Ok(None) => ApiError::not_found("Track not found").into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_favorites(identity: Identity, State(store): State<GuardedMediaStore>) -> Response {
    match store.list_favorites(&identity.user_id) {
        Ok(favorites) => Json(favorites).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_track_interaction(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    ApiJson(body): ApiJson<TrackInteractionBody>,
) -> Response {
    let interaction_type = body
        .interaction_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let (track_id, interaction_type) = match (body.track_id, interaction_type) {
        (Some(track_id), Some(interaction_type)) => (track_id, interaction_type),
        _ => {
            return ApiError::invalid_request("track_id and interaction_type are required")
                .into_response()
        }
    };
    let play_duration = body.play_duration.unwrap_or(0).max(0);

    match store.log_interaction(&identity.user_id, track_id, interaction_type, play_duration) {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => ApiError::not_found("Track not found").into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_recent(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Query(query): Query<RecentQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    match store.recent_tracks(&identity.user_id, limit) {
        Ok(recent) => Json(recent).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_user_stats(identity: Identity, State(store): State<GuardedMediaStore>) -> Response {
    match store.user_stats(&identity.user_id) {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub fn make_listening_routes(state: ServerState) -> Router {
    Router::new()
        .route("/favorites", get(get_favorites))
        .route("/favorites/{track_id}", post(post_favorite))
        .route("/track-interaction", post(post_track_interaction))
        .route("/recent", get(get_recent))
        .route("/user-stats", get(get_user_stats))
        .with_state(state)
}
