use super::auth::{PasswordCredentials, SessionToken, SessionTokenValue};
use super::user_models::{Account, UserRole};
use anyhow::Result;

pub trait AccountStore: Send + Sync {
    /// Creates an account with password credentials and returns its id.
    /// Fails if the username is taken.
    fn create_account(
        &self,
        username: &str,
        credentials: &PasswordCredentials,
        role: UserRole,
    ) -> Result<usize>;

    /// Returns the account and its password credentials.
    /// Returns Ok(None) if no account has this username.
    fn get_account_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(Account, PasswordCredentials)>>;

    /// Returns Ok(false) if no account has this username.
    fn update_account_password(
        &self,
        username: &str,
        credentials: &PasswordCredentials,
    ) -> Result<bool>;

    /// Deletes the account together with its credentials and sessions.
    /// Returns Ok(false) if no account has this username.
    fn delete_account(&self, username: &str) -> Result<bool>;

    fn list_accounts(&self) -> Result<Vec<Account>>;

    fn add_session_token(&self, token: &SessionToken) -> Result<()>;

    /// Resolves a session token to its account, refreshing the token's last-used time.
    /// Returns Ok(None) if the token does not exist.
    fn get_session_account(&self, token: &SessionTokenValue) -> Result<Option<Account>>;

    /// Returns Ok(false) if the token does not exist.
    fn delete_session_token(&self, token: &SessionTokenValue) -> Result<bool>;
}
