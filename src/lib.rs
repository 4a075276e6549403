//! SoundWave media catalog server library
//!
//! This library exposes the internal modules for testing and reuse by the binaries.

pub mod config;
pub mod discovery;
pub mod media_store;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use discovery::{discover, Algorithm, Candidate, DiscoveryRequest};
pub use media_store::{FullMediaStore, SqliteMediaStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{AccountStore, PasswordCredentials, UserRole};
