use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use soundwave_server::media_store::SqliteMediaStore;
use soundwave_server::user::{AccountStore, PasswordCredentials, UserRole};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite media database file.
    #[clap(value_parser = parse_path)]
    pub db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates an account with the given username and password.
    Add {
        username: String,
        password: String,
        /// Grants the admin role, needed to manage the catalog.
        #[clap(long)]
        admin: bool,
    },

    /// Changes the password of an existing account.
    SetPassword { username: String, password: String },

    /// Deletes an account together with its sessions.
    Delete { username: String },

    /// Shows all accounts.
    List,
}

fn execute(store: &SqliteMediaStore, command: Command) -> Result<()> {
    match command {
        Command::Add {
            username,
            password,
            admin,
        } => {
            if username.trim().is_empty() || password.is_empty() {
                bail!("Username and password must not be empty");
            }
            let role = if admin { UserRole::Admin } else { UserRole::User };
            let credentials = PasswordCredentials::from_plain(&password)?;
            let id = store
                .create_account(&username, &credentials, role)
                .with_context(|| format!("Could not create account {}", username))?;
            info!("Created {} account {} with id {}", role, username, id);
        }
        Command::SetPassword { username, password } => {
            if password.is_empty() {
                bail!("Password must not be empty");
            }
            let credentials = PasswordCredentials::from_plain(&password)?;
            if !store.update_account_password(&username, &credentials)? {
                bail!("No account named {}", username);
            }
            info!("Updated password of {}", username);
        }
        Command::Delete { username } => {
            if !store.delete_account(&username)? {
                bail!("No account named {}", username);
            }
            info!("Deleted account {}", username);
        }
        Command::List => {
            let accounts = store.list_accounts()?;
            if accounts.is_empty() {
                println!("No accounts.");
            }
            for account in accounts {
                println!("{:>5}  {:<6}  {}", account.id, account.role.to_string(), account.username);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
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
        .map_err(|err| anyhow::anyhow!("Failed to initialize logging: {}", err))?;

    let store = SqliteMediaStore::new(&cli_args.db_path)
        .with_context(|| format!("Could not open database {:?}", cli_args.db_path))?;
    execute(&store, cli_args.command)
}
