mod demo;
mod models;
mod sqlite_media_store;
mod store;
mod video_models;

pub use demo::seed_demo_catalog;
pub use models::*;
pub use sqlite_media_store::SqliteMediaStore;
pub use store::{
    AffinityStore, CatalogStore, DiscoveryStore, EngagementStore, FullMediaStore, PlaylistStore,
    VideoStore,
};
pub use video_models::*;
