mod api_json;
mod catalog_routes;
pub mod config;
pub mod error;
mod http_layers;
mod listening_routes;
mod playlist_routes;
pub mod server;
pub mod session;
pub mod state;
mod video_routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::{GuardedMediaStore, ServerState};
