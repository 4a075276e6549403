use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use soundwave_server::config::{AppConfig, CliConfig, FileConfig};
use soundwave_server::media_store::{
    seed_demo_catalog, CatalogStore, SqliteMediaStore, VideoStore,
};
use soundwave_server::server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite media database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 10000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Path to a TOML config file, its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Lifetime in days of the session cookie set on login.
    #[clap(long, default_value_t = 1)]
    pub session_cookie_max_age_days: u32,

    /// Insert the demo tracks when the catalog is empty.
    #[clap(long)]
    pub seed_demo: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            session_cookie_max_age_days: self.session_cookie_max_age_days,
            seed_demo: self.seed_demo,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {}", err))?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let media_db_path = app_config.media_db_path();
    info!("Opening SQLite media database at {:?}...", media_db_path);
    let media_store = Arc::new(SqliteMediaStore::new(&media_db_path)?);

    if app_config.seed_demo {
        let inserted = seed_demo_catalog(media_store.as_ref())?;
        if inserted > 0 {
            info!("Seeded the catalog with {} demo entries", inserted);
        }
    }
    info!(
        "Catalog holds {} tracks and {} videos",
        media_store.count_tracks()?,
        media_store.count_videos()?
    );

    info!("Ready to serve at port {}!", app_config.port);
    run_server(app_config.to_server_config(), media_store).await
}
