use serde::{Deserialize, Serialize};

pub type TrackId = i64;
pub type PlaylistId = i64;

/// The identity used for every request that carries no valid session.
pub const GUEST_USER_ID: &str = "guest";

/// Plays longer than this many seconds count as completed listens.
pub const COMPLETED_PLAY_THRESHOLD_SECS: i64 = 30;

pub const PLAY_INTERACTION: &str = "play";

pub fn is_completed_play(play_duration: i64) -> bool {
    play_duration > COMPLETED_PLAY_THRESHOLD_SECS
}

/// A catalog track along with its genre tags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub url: String,
    /// Seconds.
    pub duration: i64,
    pub cover_image: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
    /// Sorted, never null.
    pub genres: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewTrack {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub album: Option<String>,
    #[serde(default)]
    pub url: String,
    pub duration: Option<i64>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl NewTrack {
    /// Returns the name of the first required field that is blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            Some("title")
        } else if self.artist.trim().is_empty() {
            Some("artist")
        } else if self.url.trim().is_empty() {
            Some("url")
        } else {
            None
        }
    }

    /// Trimmed, non-empty, de-duplicated genre tags.
    pub fn normalized_genres(&self) -> Vec<String> {
        normalize_genres(self.genres.iter().map(String::as_str))
    }
}

pub fn normalize_genres<'a, I: IntoIterator<Item = &'a str>>(genres: I) -> Vec<String> {
    let mut out: Vec<String> = genres
        .into_iter()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_owned)
        .collect();
    out.sort();
    out.dedup();
    out
}

#[derive(Clone, Debug, Serialize)]
pub struct FavoriteTrack {
    #[serde(flatten)]
    pub track: Track,
    pub favorited_at: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecentTrack {
    #[serde(flatten)]
    pub track: Track,
    pub last_played_at: i64,
    pub play_duration: i64,
    /// Plays by the requesting user.
    pub play_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenreSummary {
    pub genre: String,
    pub track_count: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_listening_time: i64,
    pub total_plays: u64,
    pub favorite_count: u64,
    pub top_genres: Vec<GenreCount>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchFilter {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub track: Track,
    pub is_favorited: bool,
}

/// Aggregated counter for one (user, track, interaction type) triple.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interaction {
    pub user_id: String,
    pub track_id: TrackId,
    pub interaction_type: String,
    pub interaction_count: u64,
    pub total_play_time: i64,
    pub last_interaction: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserPlaylist {
    pub id: PlaylistId,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: i64,
    pub track_count: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewPlaylist {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlaylistTrack {
    #[serde(flatten)]
    pub track: Track,
    pub position: i64,
    pub added_at: i64,
}

/// An editorial playlist managed by admins, visible to everyone.
#[derive(Clone, Debug, Serialize)]
pub struct CuratedPlaylist {
    pub id: PlaylistId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewCuratedPlaylist {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PlaylistEdit {
    Done,
    /// The playlist doesn't exist or belongs to someone else.
    AccessDenied,
    TrackNotFound,
}
