use super::api_json::ApiJson;
use super::error::ApiError;
use super::session::{AdminSession, Identity};
use super::state::{GuardedMediaStore, ServerState};
use crate::discovery::{discover, Algorithm, DiscoveryRequest, ThreadRandomSource};
use crate::media_store::{NewTrack, SearchFilter, TrackId};

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

const MAX_REPORTED_BULK_ERRORS: usize = 10;

#[derive(Deserialize, Debug)]
struct DiscoverQuery {
    pub algorithm: Option<String>,
}

#[derive(Deserialize, Debug)]
struct BulkTracksBody {
    #[serde(default)]
    pub tracks: Vec<NewTrack>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BulkImportResponse {
    success: bool,
    success_count: usize,
    error_count: usize,
    errors: Vec<String>,
}

async fn get_discover(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Query(query): Query<DiscoverQuery>,
) -> Response {
    let request = DiscoveryRequest {
        user_id: identity.user_id,
        algorithm: Algorithm::from_query(query.algorithm.as_deref()),
    };
    let now = chrono::Utc::now().timestamp();
    let mut rng = ThreadRandomSource::default();
    match discover(store.as_ref(), &request, now, &mut rng) {
        Ok(candidates) => Json(candidates).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_tracks(State(store): State<GuardedMediaStore>) -> Response {
    match store.list_tracks() {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_track(
    AdminSession(session): AdminSession,
    State(store): State<GuardedMediaStore>,
    ApiJson(body): ApiJson<NewTrack>,
) -> Response {
    if body.missing_field().is_some() {
        return ApiError::invalid_request("Title, artist and url are required").into_response();
    }
    match store.add_track(&body) {
        Ok(id) => {
            info!("{} added track {} ({})", session.account.username, id, body.title);
            Json(json!({ "id": id, "message": "Track added successfully" })).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn post_tracks_bulk(
    AdminSession(session): AdminSession,
    State(store): State<GuardedMediaStore>,
    ApiJson(body): ApiJson<BulkTracksBody>,
) -> Response {
    if body.tracks.is_empty() {
        return ApiError::invalid_request("Invalid tracks data").into_response();
    }

    let mut success_count = 0;
    let mut errors = Vec::new();
    for (index, track) in body.tracks.iter().enumerate() {
        if let Some(field) = track.missing_field() {
            errors.push(format!("Track #{}: missing {}", index + 1, field));
            continue;
        }
        match store.add_track(track) {
            Ok(_) => success_count += 1,
            Err(err) => {
                debug!("Bulk insert of {} failed: {:#}", track.title, err);
                errors.push(format!("{}: failed to insert", track.title));
            }
        }
    }
    info!(
        "{} bulk imported {} tracks ({} failed)",
        session.account.username,
        success_count,
        errors.len()
    );

    let error_count = errors.len();
    errors.truncate(MAX_REPORTED_BULK_ERRORS);
    Json(BulkImportResponse {
        success: true,
        success_count,
        error_count,
        errors,
    })
    .into_response()
}

async fn delete_track(
    _session: AdminSession,
    State(store): State<GuardedMediaStore>,
    Path(id): Path<TrackId>,
) -> Response {
    match store.delete_track(id) {
        Ok(true) => Json(json!({ "message": "Track deleted successfully" })).into_response(),
        Ok(false) => ApiError::not_found("Track not found").into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_search(
    identity: Identity,
    State(store): State<GuardedMediaStore>,
    Query(filter): Query<SearchFilter>,
) -> Response {
    match store.search_tracks(&identity.user_id, &filter) {
        Ok(hits) => Json(hits).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_genres(State(store): State<GuardedMediaStore>) -> Response {
    match store.list_genres() {
        Ok(genres) => Json(genres).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub fn make_catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route("/discover", get(get_discover))
        .route("/tracks", get(get_tracks))
        .route("/tracks", post(post_track))
        .route("/tracks/bulk", post(post_tracks_bulk))
        .route("/tracks/{id}", delete(delete_track))
        .route("/search", get(get_search))
        .route("/genres", get(get_genres))
        .with_state(state)
}
