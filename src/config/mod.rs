mod file_config;

pub use file_config::FileConfig;

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const MEDIA_DB_FILE_NAME: &str = "media.db";

/// Settings that can come from the command line.
/// Each of them can be overridden by the TOML config file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub session_cookie_max_age_days: u32,
    pub seed_demo: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub session_cookie_max_age_days: u32,
    pub seed_demo: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Unknown logging_level in config file: {}", s),
            },
            None => cli.logging_level.clone(),
        };

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let session_cookie_max_age_days = file
            .session_cookie_max_age_days
            .unwrap_or(cli.session_cookie_max_age_days);
        if session_cookie_max_age_days == 0 {
            bail!("session_cookie_max_age_days must be at least 1");
        }

        let seed_demo = file.seed_demo.unwrap_or(cli.seed_demo);

        Ok(AppConfig {
            db_dir,
            port,
            logging_level,
            frontend_dir_path,
            session_cookie_max_age_days,
            seed_demo,
        })
    }

    pub fn media_db_path(&self) -> PathBuf {
        self.db_dir.join(MEDIA_DB_FILE_NAME)
    }

    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            frontend_dir_path: self.frontend_dir_path.clone(),
            session_cookie_max_age_days: self.session_cookie_max_age_days,
        }
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
