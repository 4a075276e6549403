mod account_store;
pub mod auth;
mod user_models;

pub use account_store::AccountStore;
pub use auth::{PasswordCredentials, PasswordHasherKind, SessionToken, SessionTokenValue};
pub use user_models::{Account, UserRole};
