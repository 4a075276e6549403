use super::api_json::ApiJson;
use super::error::ApiError;
use super::session::{AdminSession, Identity};
use super::state::{GuardedMediaStore, ServerState};
use crate::media_store::{NewCuratedPlaylist, NewPlaylist, PlaylistEdit, PlaylistId, TrackId};

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

const ACCESS_DENIED: &str = "Playlist not found or access denied";

#[derive(Deserialize, Debug)]
struct AddPlaylistTrackBody {
    pub track_id: Option<TrackId>,
}

fn edit_response(edit: PlaylistEdit, done_message: &str) -> Response {
    match edit {
        PlaylistEdit::Done => Json(json!({ "message": done_message })).into_response(),
        PlaylistEdit::AccessDenied => ApiError::Forbidden(ACCESS_DENIED.to_owned()).into_response(),
        PlaylistEdit::TrackNotFound => ApiError::not_found("Track not found").into_response(),
    }
}

async fn get_user_playlists(identity: Identity, State(store): State<GuardedMediaStore>) -> Response {
    match store.list_user_playlists(&identity.user_id) {
        Ok(playlists) => Json(playlists).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_user_playlist(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    ApiJson(body): ApiJson<NewPlaylist>,
) -> Response {
    if body.name.trim().is_empty() {
        return ApiError::invalid_request("Playlist name is required").into_response();
    }
    match store.create_user_playlist(&identity.user_id, &body) {
        Ok(id) => {
            debug!("Created playlist {} for {}", id, identity.user_id);
            Json(json!({ "id": id, "message": "Playlist created successfully" })).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_user_playlist_track(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Path(id): Path<PlaylistId>,
    ApiJson(body): ApiJson<AddPlaylistTrackBody>,
) -> Response {
    let track_id = match body.track_id {
        Some(track_id) => track_id,
        None => return ApiError::invalid_request("track_id is required").into_response(),
    };
    match store.add_track_to_user_playlist(&identity.user_id, id, track_id) {
        Ok(edit) => edit_response(edit, "Track added to playlist successfully"),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_user_playlist_tracks(
    State(store): State<GuardedMediaStore>,
    Path(id): Path<PlaylistId>,
) -> Response {
    match store.get_user_playlist_tracks(id) {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn delete_user_playlist(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Path(id): Path<PlaylistId>,
) -> Response {
    match store.delete_user_playlist(&identity.user_id, id) {
        Ok(edit) => edit_response(edit, "Playlist deleted successfully"),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_curated_playlists(State(store): State<GuardedMediaStore>) -> Response {
    match store.list_curated_playlists() {
        Ok(playlists) => Json(playlists).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_curated_playlist(
    AdminSession(session): AdminSession,
    State(store): State<GuardedMediaStore>,
    ApiJson(body): ApiJson<NewCuratedPlaylist>,
) -> Response {
    if body.name.trim().is_empty() {
        return ApiError::invalid_request("Playlist name is required").into_response();
    }
    match store.create_curated_playlist(&body) {
        Ok(id) => {
            info!("{} created curated playlist {}", session.account.username, id);
            Json(json!({ "id": id, "message": "Playlist created successfully" })).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub fn make_playlist_routes(state: ServerState) -> Router {
    Router::new()
        .route("/playlists", get(get_curated_playlists))
        .route("/playlists", post(post_curated_playlist))
        .route("/user-playlists", get(get_user_playlists))
        .route("/user-playlists", post(post_user_playlist))
        .route("/user-playlists/{id}", delete(delete_user_playlist))
        .route("/user-playlists/{id}/tracks", get(get_user_playlist_tracks))
        .route("/user-playlists/{id}/tracks", post(post_user_playlist_track))
        .with_state(state)
}
