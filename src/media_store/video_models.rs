use serde::{Deserialize, Serialize};

pub type VideoId = i64;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub thumbnail: Option<String>,
    /// Seconds.
    pub duration: i64,
    pub category: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewVideo {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    pub thumbnail: Option<String>,
    pub duration: Option<i64>,
    pub category: Option<String>,
}

impl NewVideo {
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            Some("title")
        } else if self.url.trim().is_empty() {
            Some("url")
        } else {
            None
        }
    }
}

/// A video as seen by one user.
#[derive(Clone, Debug, Serialize)]
pub struct VideoHit {
    #[serde(flatten)]
    pub video: Video,
    pub is_favorited: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct FavoriteVideo {
    #[serde(flatten)]
    pub video: Video,
    pub favorited_at: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecentVideo {
    #[serde(flatten)]
    pub video: Video,
    pub last_watched_at: i64,
    /// Duration of the latest watch.
    pub watch_duration: i64,
    /// Watches by the requesting user.
    pub watch_count: u64,
    pub is_favorited: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VideoCategory {
    /// None groups the uncategorized videos.
    pub category: Option<String>,
    pub video_count: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VideoSearchFilter {
    pub q: Option<String>,
    pub category: Option<String>,
}
