use super::api_json::ApiJson;
use super::error::ApiError;
use super::session::{AdminSession, Identity};
use super::state::{GuardedMediaStore, ServerState};
use crate::media_store::{NewVideo, VideoId, VideoSearchFilter};

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 100;

#[derive(Deserialize, Debug)]
struct VideoWatchBody {
    pub video_id: Option<VideoId>,
    pub watch_duration: Option<i64>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize, Debug)]
struct RecentQuery {
    pub limit: Option<usize>,
}

async fn get_videos(identity: Identity, State(store): State<GuardedMediaStore>) -> Response {
    match store.list_videos(&identity.user_id) {
        Ok(videos) => Json(videos).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_video(
    AdminSession(session): AdminSession,
    State(store): State<GuardedMediaStore>,
    ApiJson(body): ApiJson<NewVideo>,
) -> Response {
    if body.missing_field().is_some() {
        return ApiError::invalid_request("Title and url are required").into_response();
    }
    match store.add_video(&body) {
        Ok(id) => {
            info!("{} added video {} ({})", session.account.username, id, body.title);
            Json(json!({ "id": id, "message": "Video added successfully" })).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn delete_video(
    _session: AdminSession,
    State(store): State<GuardedMediaStore>,
    Path(id): Path<VideoId>,
) -> Response {
    match store.delete_video(id) {
        Ok(true) => Json(json!({ "message": "Video deleted successfully" })).into_response(),
        Ok(false) => ApiError::not_found("Video not found").into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_video_favorite(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Path(video_id): Path<VideoId>,
) -> Response {
    match store.toggle_video_favorite(&identity.user_id, video_id) {
        Ok(Some(favorited)) => Json(json!({ "favorited": favorited })).into_response(),
        Ok(None) => ApiError::not_found("Video not found").into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_video_favorites(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
) -> Response {
    match store.list_video_favorites(&identity.user_id) {
        Ok(favorites) => Json(favorites).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_video_watch(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    ApiJson(body): ApiJson<VideoWatchBody>,
) -> Response {
    let video_id = match body.video_id {
        Some(video_id) => video_id,
        None => return ApiError::invalid_request("video_id is required").into_response(),
    };
    let watch_duration = body.watch_duration.unwrap_or(0).max(0);

    match store.record_watch(&identity.user_id, video_id, watch_duration, body.completed) {
        Ok(true) => Json(json!({ "success": true })).into_response(),
        Ok(false) => ApiError::not_found("Video not found").into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_recent_videos(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Query(query): Query<RecentQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    match store.recent_videos(&identity.user_id, limit) {
        Ok(recent) => Json(recent).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_search_videos(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Query(filter): Query<VideoSearchFilter>,
) -> Response {
    match store.search_videos(&identity.user_id, &filter) {
        Ok(hits) => Json(hits).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_video_categories(State(store): State<GuardedMediaStore>) -> Response {
    match store.list_video_categories() {
        Ok(categories) => Json(categories).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub fn make_video_routes(state: ServerState) -> Router {
    Router::new()
        .route("/videos", get(get_videos))
        .route("/videos", post(post_video))
        .route("/videos/{id}", delete(delete_video))
        .route("/video-favorites", get(get_video_favorites))
        .route("/video-favorites/{video_id}", post(post_video_favorite))
        .route("/video-watch", post(post_video_watch))
        .route("/recent-videos", get(get_recent_videos))
        .route("/search-videos", get(get_search_videos))
        .route("/video-categories", get(get_video_categories))
        .with_state(state)
}
