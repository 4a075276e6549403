use super::models::NewTrack;
use super::store::{CatalogStore, VideoStore};
use super::video_models::NewVideo;
use anyhow::Result;
use tracing::info;

fn demo_tracks() -> Vec<NewTrack> {
    vec![
        NewTrack {
            title: "Sample Audio Track".to_string(),
            artist: "Demo Artist".to_string(),
            album: Some("Test Album".to_string()),
            url: "https://www.learningcontainer.com/wp-content/uploads/2020/02/Kalimba.mp3".to_string(),
            duration: Some(347),
            cover_image: Some(
                "https://via.placeholder.com/300x300/4CAF50/white?text=Demo+Track".to_string(),
            ),
            genres: vec!["Ambient".to_string(), "Instrumental".to_string()],
        },
        NewTrack {
            title: "Test MP3 File".to_string(),
            artist: "Sample Artist".to_string(),
            album: Some("Demo Collection".to_string()),
            url: "https://file-examples.com/storage/fe68c1b7c66f4d2ba13a2b6/2017/11/file_example_MP3_700KB.mp3"
                .to_string(),
            duration: Some(27),
            cover_image: Some(
                "https://via.placeholder.com/300x300/2196F3/white?text=Test+Audio".to_string(),
            ),
            genres: vec!["Demo".to_string(), "Test".to_string()],
        },
    ]
}

fn demo_video(
    title: &str,
    description: &str,
    url: &str,
    thumbnail: &str,
    duration: i64,
    category: &str,
) -> NewVideo {
    NewVideo {
        title: title.to_string(),
        description: Some(description.to_string()),
        url: url.to_string(),
        thumbnail: Some(thumbnail.to_string()),
        duration: Some(duration),
        category: Some(category.to_string()),
    }
}

fn demo_videos() -> Vec<NewVideo> {
    vec![
        demo_video(
            "Sample Podcast Episode",
            "Demo podcast episode showing MP4 video content",
            "https://www.w3schools.com/html/mov_bbb.mp4",
            "https://via.placeholder.com/400x225/FF6B35/white?text=Podcast+EP1",
            300,
            "Podcast",
        ),
        demo_video(
            "Music Production Tutorial",
            "Learn the basics of music production with this comprehensive tutorial",
            "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_1mb.mp4",
            "https://via.placeholder.com/400x225/667EEA/white?text=Tutorial",
            180,
            "Tutorial",
        ),
        demo_video(
            "Live Concert Performance",
            "Amazing live performance from our featured artists",
            "https://www.learningcontainer.com/wp-content/uploads/2020/05/sample-mp4-file.mp4",
            "https://via.placeholder.com/400x225/4CAF50/white?text=Live+Show",
            240,
            "Performance",
        ),
        demo_video(
            "Artist Interview",
            "Exclusive interview with top recording artists",
            "https://www.w3schools.com/html/mov_bbb.mp4",
            "https://via.placeholder.com/400x225/E91E63/white?text=Interview",
            420,
            "Interview",
        ),
    ]
}

/// Fills whichever of the track and video catalogs is empty with demo entries.
/// Returns how many entries were added in total.
pub fn seed_demo_catalog<S>(store: &S) -> Result<usize>
where
    S: CatalogStore + VideoStore + ?Sized,
{
    let mut inserted = 0;
    if store.count_tracks()? == 0 {
        let tracks = demo_tracks();
        for track in &tracks {
            store.add_track(track)?;
        }
        info!("Seeded {} demo tracks", tracks.len());
        inserted += tracks.len();
    }
    if store.count_videos()? == 0 {
        let videos = demo_videos();
        for video in &videos {
            store.add_video(video)?;
        }
        info!("Seeded {} demo videos", videos.len());
        inserted += videos.len();
    }
    Ok(inserted)
}
