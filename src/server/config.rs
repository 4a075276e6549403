use super::RequestsLoggingLevel;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub frontend_dir_path: Option<String>,
    /// Lifetime of the session cookie set on login.
    pub session_cookie_max_age_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 10000,
            frontend_dir_path: None,
            session_cookie_max_age_days: 1,
        }
    }
}
