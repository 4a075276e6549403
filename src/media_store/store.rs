use super::models::*;
use super::video_models::*;
use crate::user::AccountStore;
use anyhow::Result;
use std::collections::{HashMap, HashSet};

pub trait CatalogStore: Send + Sync {
    /// Returns every track, newest first.
    fn list_tracks(&self) -> Result<Vec<Track>>;

    /// Inserts the track and its genres atomically and returns the new id.
    fn add_track(&self, track: &NewTrack) -> Result<TrackId>;

    /// Deletes a track along with everything referencing it.
    /// Returns Ok(false) if the track does not exist.
    fn delete_track(&self, track_id: TrackId) -> Result<bool>;

    /// Returns each genre with the number of tracks tagged with it, most used first.
    fn list_genres(&self) -> Result<Vec<GenreSummary>>;

    /// Case-insensitive substring search, ordered by title.
    fn search_tracks(&self, user_id: &str, filter: &SearchFilter) -> Result<Vec<SearchHit>>;

    fn count_tracks(&self) -> Result<u64>;
}

/// Read views the discovery engine ranks over.
pub trait DiscoveryStore: Send + Sync {
    /// Returns every catalog track with its genres, in no particular order.
    fn catalog_snapshot(&self) -> Result<Vec<Track>>;

    /// Returns the number of listening-history entries per track, across all users.
    /// Tracks that were never played are absent from the map.
    fn aggregate_play_counts(&self) -> Result<HashMap<TrackId, u64>>;

    fn favorite_track_ids(&self, user_id: &str) -> Result<HashSet<TrackId>>;
}

pub trait AffinityStore: Send + Sync {
    /// Flips the favorite state of the track for the user and returns the new state.
    /// Returns Ok(None) if the track does not exist.
    fn toggle_favorite(&self, user_id: &str, track_id: TrackId) -> Result<Option<bool>>;

    /// Returns the user's favorites, most recently added first.
    fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteTrack>>;
}

pub trait EngagementStore: Send + Sync {
    /// Adds one to the (user, track, type) counter and accumulates the play time.
    /// Returns Ok(false) if the track does not exist.
    fn record_interaction(
        &self,
        user_id: &str,
        track_id: TrackId,
        interaction_type: &str,
        play_duration: i64,
    ) -> Result<bool>;

    /// Appends a listening-history entry.
    /// Returns Ok(false) if the track does not exist.
    fn record_history(
        &self,
        user_id: &str,
        track_id: TrackId,
        play_duration: i64,
        completed: bool,
    ) -> Result<bool>;

    /// Records the interaction and, for plays, the matching history entry, in a single
    /// transaction. Returns Ok(false) if the track does not exist.
    fn log_interaction(
        &self,
        user_id: &str,
        track_id: TrackId,
        interaction_type: &str,
        play_duration: i64,
    ) -> Result<bool>;

    /// Returns Ok(None) if the user never had this kind of interaction with the track.
    fn get_interaction(
        &self,
        user_id: &str,
        track_id: TrackId,
        interaction_type: &str,
    ) -> Result<Option<Interaction>>;

    /// Returns the tracks the user played, one row per track, last played first.
    fn recent_tracks(&self, user_id: &str, limit: usize) -> Result<Vec<RecentTrack>>;

    fn user_stats(&self, user_id: &str) -> Result<UserStats>;
}

pub trait PlaylistStore: Send + Sync {
    /// Returns the user's own playlists plus every public one, newest first.
    fn list_user_playlists(&self, user_id: &str) -> Result<Vec<UserPlaylist>>;

    fn create_user_playlist(&self, user_id: &str, playlist: &NewPlaylist) -> Result<PlaylistId>;

    /// Appends the track after the playlist's current last position.
    fn add_track_to_user_playlist(
        &self,
        user_id: &str,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> Result<PlaylistEdit>;

    /// Returns the playlist's tracks ordered by position.
    fn get_user_playlist_tracks(&self, playlist_id: PlaylistId) -> Result<Vec<PlaylistTrack>>;

    fn delete_user_playlist(&self, user_id: &str, playlist_id: PlaylistId) -> Result<PlaylistEdit>;

    /// Returns the curated playlists, newest first.
    fn list_curated_playlists(&self) -> Result<Vec<CuratedPlaylist>>;

    fn create_curated_playlist(&self, playlist: &NewCuratedPlaylist) -> Result<PlaylistId>;
}

/// The video catalog with its per-user favorites and watch history.
pub trait VideoStore: Send + Sync {
    /// Returns every video, newest first, flagged with the user's favorites.
    fn list_videos(&self, user_id: &str) -> Result<Vec<VideoHit>>;

    fn add_video(&self, video: &NewVideo) -> Result<VideoId>;

    /// Deletes a video along with its favorites and watch history.
    /// Returns Ok(false) if the video does not exist.
    fn delete_video(&self, video_id: VideoId) -> Result<bool>;

    fn count_videos(&self) -> Result<u64>;

    /// Returns the new favorite state, or Ok(None) if the video does not exist.
    fn toggle_video_favorite(&self, user_id: &str, video_id: VideoId) -> Result<Option<bool>>;

    /// Returns the user's favorite videos, most recently added first.
    fn list_video_favorites(&self, user_id: &str) -> Result<Vec<FavoriteVideo>>;

    /// Appends a watch-history entry.
    /// Returns Ok(false) if the video does not exist.
    fn record_watch(
        &self,
        user_id: &str,
        video_id: VideoId,
        watch_duration: i64,
        completed: bool,
    ) -> Result<bool>;

    /// Returns the videos the user watched, one row per video, last watched first.
    fn recent_videos(&self, user_id: &str, limit: usize) -> Result<Vec<RecentVideo>>;

    /// `q` matches the title or description, `category` the category. Both are
    /// case-insensitive substring matches. Ordered by title.
    fn search_videos(&self, user_id: &str, filter: &VideoSearchFilter) -> Result<Vec<VideoHit>>;

    /// Returns each category with its number of videos, most used first.
    fn list_video_categories(&self) -> Result<Vec<VideoCategory>>;
}

pub trait FullMediaStore:
    CatalogStore
    + DiscoveryStore
    + AffinityStore
    + EngagementStore
    + PlaylistStore
    + VideoStore
    + AccountStore
{
}

impl<T> FullMediaStore for T where
    T: CatalogStore
        + DiscoveryStore
        + AffinityStore
        + EngagementStore
        + PlaylistStore
        + VideoStore
        + AccountStore
{
}
