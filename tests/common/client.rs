//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides one method per server endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client, requests are made as the guest user
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the regular test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails.
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    /// Creates a client pre-authenticated as an admin
    ///
    /// # Panics
    ///
    /// Panics if authentication fails.
    pub async fn authenticated_admin(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(ADMIN_USER, ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Admin authentication failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /api/login
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /api/logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(self.url("/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /api/auth-status
    pub async fn auth_status(&self) -> Response {
        self.client
            .get(self.url("/auth-status"))
            .send()
            .await
            .expect("Auth status request failed")
    }

    /// GET /api/auth-status with an explicit bearer token and no cookies
    pub async fn auth_status_with_token(&self, token: &str) -> Response {
        reqwest::Client::new()
            .get(self.url("/auth-status"))
            .bearer_auth(token)
            .send()
            .await
            .expect("Auth status request failed")
    }

    // ========================================================================
    // Status Endpoints
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /api/health
    pub async fn health(&self) -> Response {
        self.client
            .get(self.url("/health"))
            .send()
            .await
            .expect("Health request failed")
    }

    /// GET /api/db-status
    pub async fn db_status(&self) -> Response {
        self.client
            .get(self.url("/db-status"))
            .send()
            .await
            .expect("Db status request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /api/discover?algorithm=
    pub async fn discover(&self, algorithm: Option<&str>) -> Response {
        let mut request = self.client.get(self.url("/discover"));
        if let Some(algorithm) = algorithm {
            request = request.query(&[("algorithm", algorithm)]);
        }
        request.send().await.expect("Discover request failed")
    }

    /// GET /api/tracks
    pub async fn get_tracks(&self) -> Response {
        self.client
            .get(self.url("/tracks"))
            .send()
            .await
            .expect("Get tracks request failed")
    }

    /// POST /api/tracks
    pub async fn add_track(&self, track: &Value) -> Response {
        self.client
            .post(self.url("/tracks"))
            .json(track)
            .send()
            .await
            .expect("Add track request failed")
    }

    /// POST /api/tracks/bulk
    pub async fn add_tracks_bulk(&self, tracks: &Value) -> Response {
        self.client
            .post(self.url("/tracks/bulk"))
            .json(&json!({ "tracks": tracks }))
            .send()
            .await
            .expect("Bulk add request failed")
    }

    /// DELETE /api/tracks/{id}
    pub async fn delete_track(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/tracks/{}", id)))
            .send()
            .await
            .expect("Delete track request failed")
    }

    /// GET /api/search
    pub async fn search(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/search"))
            .query(params)
            .send()
            .await
            .expect("Search request failed")
    }

    /// GET /api/genres
    pub async fn get_genres(&self) -> Response {
        self.client
            .get(self.url("/genres"))
            .send()
            .await
            .expect("Genres request failed")
    }

    // ========================================================================
    // Listening Endpoints
    // ========================================================================

    /// POST /api/favorites/{track_id}
    pub async fn toggle_favorite(&self, track_id: i64) -> Response {
        self.client
            .post(self.url(&format!("/favorites/{}", track_id)))
            .send()
            .await
            .expect("Toggle favorite request failed")
    }

    /// GET /api/favorites
    pub async fn get_favorites(&self) -> Response {
        self.client
            .get(self.url("/favorites"))
            .send()
            .await
            .expect("Get favorites request failed")
    }

    /// POST /api/track-interaction
    pub async fn track_interaction(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/track-interaction"))
            .json(body)
            .send()
            .await
            .expect("Track interaction request failed")
    }

    /// POST /api/track-interaction for a play of `play_duration` seconds
    pub async fn play(&self, track_id: i64, play_duration: i64) -> Response {
        self.track_interaction(&json!({
            "track_id": track_id,
            "interaction_type": "play",
            "play_duration": play_duration,
        }))
        .await
    }

    /// GET /api/recent
    pub async fn get_recent(&self, limit: Option<usize>) -> Response {
        let mut request = self.client.get(self.url("/recent"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        request.send().await.expect("Recent request failed")
    }

    /// GET /api/user-stats
    pub async fn get_user_stats(&self) -> Response {
        self.client
            .get(self.url("/user-stats"))
            .send()
            .await
            .expect("User stats request failed")
    }

    // ========================================================================
    // Playlist Endpoints
    // ========================================================================

    /// GET /api/user-playlists
    pub async fn get_playlists(&self) -> Response {
        self.client
            .get(self.url("/user-playlists"))
            .send()
            .await
            .expect("Get playlists request failed")
    }

    /// POST /api/user-playlists
    pub async fn create_playlist(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/user-playlists"))
            .json(body)
            .send()
            .await
            .expect("Create playlist request failed")
    }

    /// POST /api/user-playlists/{id}/tracks
    pub async fn add_playlist_track(&self, playlist_id: i64, track_id: i64) -> Response {
        self.client
            .post(self.url(&format!("/user-playlists/{}/tracks", playlist_id)))
            .json(&json!({ "track_id": track_id }))
            .send()
            .await
            .expect("Add playlist track request failed")
    }

    /// GET /api/user-playlists/{id}/tracks
    pub async fn get_playlist_tracks(&self, playlist_id: i64) -> Response {
        self.client
            .get(self.url(&format!("/user-playlists/{}/tracks", playlist_id)))
            .send()
            .await
            .expect("Get playlist tracks request failed")
    }

    /// DELETE /api/user-playlists/{id}
    pub async fn delete_playlist(&self, playlist_id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/user-playlists/{}", playlist_id)))
            .send()
            .await
            .expect("Delete playlist request failed")
    }

    /// GET /api/playlists
    pub async fn get_curated_playlists(&self) -> Response {
        self.client
            .get(self.url("/playlists"))
            .send()
            .await
            .expect("Get curated playlists request failed")
    }

    /// POST /api/playlists
    pub async fn create_curated_playlist(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/playlists"))
            .json(body)
            .send()
            .await
            .expect("Create curated playlist request failed")
    }

    // ========================================================================
    // Video Endpoints
    // ========================================================================

    /// GET /api/videos
    pub async fn get_videos(&self) -> Response {
        self.client
            .get(self.url("/videos"))
            .send()
            .await
            .expect("Get videos request failed")
    }

    /// POST /api/videos
    pub async fn add_video(&self, video: &Value) -> Response {
        self.client
            .post(self.url("/videos"))
            .json(video)
            .send()
            .await
            .expect("Add video request failed")
    }

    /// DELETE /api/videos/{id}
    pub async fn delete_video(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/videos/{}", id)))
            .send()
            .await
            .expect("Delete video request failed")
    }

    /// POST /api/video-favorites/{video_id}
    pub async fn toggle_video_favorite(&self, video_id: i64) -> Response {
        self.client
            .post(self.url(&format!("/video-favorites/{}", video_id)))
            .send()
            .await
            .expect("Toggle video favorite request failed")
    }

    /// GET /api/video-favorites
    pub async fn get_video_favorites(&self) -> Response {
        self.client
            .get(self.url("/video-favorites"))
            .send()
            .await
            .expect("Get video favorites request failed")
    }

    /// POST /api/video-watch
    pub async fn video_watch(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/video-watch"))
            .json(body)
            .send()
            .await
            .expect("Video watch request failed")
    }

    /// POST /api/video-watch for a watch of `watch_duration` seconds
    pub async fn watch(&self, video_id: i64, watch_duration: i64, completed: bool) -> Response {
        self.video_watch(&json!({
            "video_id": video_id,
            "watch_duration": watch_duration,
            "completed": completed,
        }))
        .await
    }

    /// GET /api/recent-videos
    pub async fn get_recent_videos(&self, limit: Option<usize>) -> Response {
        let mut request = self.client.get(self.url("/recent-videos"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        request.send().await.expect("Recent videos request failed")
    }

    /// GET /api/search-videos
    pub async fn search_videos(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/search-videos"))
            .query(params)
            .send()
            .await
            .expect("Search videos request failed")
    }

    /// GET /api/video-categories
    pub async fn get_video_categories(&self) -> Response {
        self.client
            .get(self.url("/video-categories"))
            .send()
            .await
            .expect("Video categories request failed")
    }
}
