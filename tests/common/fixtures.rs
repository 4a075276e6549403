//! Test fixture creation for the media database

use super::constants::*;
use anyhow::{ensure, Result};
use soundwave_server::media_store::{CatalogStore, NewTrack, NewVideo, SqliteMediaStore, VideoStore};
use soundwave_server::user::{AccountStore, PasswordCredentials, UserRole};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_track(title: &str, artist: &str, album: &str, duration: i64, genres: &[&str]) -> NewTrack {
    NewTrack {
        title: title.to_string(),
        artist: artist.to_string(),
        album: Some(album.to_string()),
        url: format!(
            "https://media.test/{}.mp3",
            title.to_lowercase().replace(' ', "-")
        ),
        duration: Some(duration),
        cover_image: None,
        genres: genres.iter().map(|g| g.to_string()).collect(),
    }
}

/// Inserts the 5 fixture tracks, their ids match the TRACK_*_ID constants.
pub fn populate_test_catalog(store: &dyn CatalogStore) -> Result<()> {
    let tracks = [
        (TRACK_1_ID, fixture_track("Opening Track", ARTIST_1_NAME, "First Album", 180, &["Rock", "Indie"])),
        (TRACK_2_ID, fixture_track("Middle Track", ARTIST_1_NAME, "First Album", 200, &["Rock"])),
        (TRACK_3_ID, fixture_track("Closing Track", ARTIST_1_NAME, "First Album", 240, &["Indie"])),
        (TRACK_4_ID, fixture_track("Smooth Jazz", ARTIST_2_NAME, "Jazz Collection", 300, &["Jazz"])),
        (TRACK_5_ID, fixture_track("Upbeat Jazz", ARTIST_2_NAME, "Jazz Collection", 210, &["Jazz", "Swing"])),
    ];
    for (expected_id, track) in tracks.iter() {
        let id = store.add_track(track)?;
        ensure!(
            id == *expected_id,
            "Fixture track {} got id {}, expected {}",
            track.title,
            id,
            expected_id
        );
    }
    Ok(())
}

fn fixture_video(title: &str, description: &str, duration: i64, category: &str) -> NewVideo {
    NewVideo {
        title: title.to_string(),
        description: Some(description.to_string()),
        url: format!(
            "https://media.test/{}.mp4",
            title.to_lowercase().replace(' ', "-")
        ),
        thumbnail: None,
        duration: Some(duration),
        category: Some(category.to_string()),
    }
}

/// Inserts the 3 fixture videos, their ids match the VIDEO_*_ID constants.
pub fn populate_test_videos(store: &dyn VideoStore) -> Result<()> {
    let videos = [
        (VIDEO_1_ID, fixture_video("Mixing Basics", "Getting a clean mix", 600, "Tutorial")),
        (VIDEO_2_ID, fixture_video("Live at the Park", "Open air concert", 3600, "Performance")),
        (VIDEO_3_ID, fixture_video("Mastering Walkthrough", "Loudness and polish", 900, "Tutorial")),
    ];
    for (expected_id, video) in videos.iter() {
        let id = store.add_video(video)?;
        ensure!(
            id == *expected_id,
            "Fixture video {} got id {}, expected {}",
            video.title,
            id,
            expected_id
        );
    }
    Ok(())
}

/// Creates a temporary media database with a regular user, an admin and the fixture
/// track and video catalogs.
/// Returns (temp_dir, db_path)
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("media.db");

    let store = SqliteMediaStore::new(&db_path)?;
    store.create_account(TEST_USER, &PasswordCredentials::from_plain(TEST_PASS)?, UserRole::User)?;
    store.create_account(ADMIN_USER, &PasswordCredentials::from_plain(ADMIN_PASS)?, UserRole::Admin)?;
    populate_test_catalog(&store)?;
    populate_test_videos(&store)?;

    eprintln!("Created test database at {:?}", db_path);
    Ok((dir, db_path))
}
