use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use streamix::app::{App, AppEvent};
use streamix::catalog::CatalogClient;
use streamix::config::Config;
use streamix::feed::{FeedEvent, FeedQuery};
use streamix::storage::{Database, DatabaseError};
use streamix::ui;

/// Get the config directory path (~/.config/streamix/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("streamix"))
}

#[derive(Parser, Debug)]
#[command(
    name = "streamix",
    about = "Terminal client for browsing a remote video catalog"
)]
struct Args {
    /// Reset the local store (delete and recreate search/watch history)
    #[arg(long)]
    reset_store: bool,

    /// Path to an alternate config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access on Unix: the local store holds personal history
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    let db_path = config_dir.join("streamix.db");

    // Handle --reset-store flag
    if args.reset_store && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete local store")?;
        println!("Local store reset.");
    }

    // The catalog refuses unauthenticated requests; fail early with
    // instructions rather than rendering an empty feed.
    let Some(api_key) = config.resolve_api_key() else {
        eprintln!("Error: No catalog API key configured.");
        eprintln!();
        eprintln!("Set the STREAMIX_API_KEY environment variable, or add to {}:", config_path.display());
        eprintln!();
        eprintln!("  api_key = \"your-key-here\"");
        std::process::exit(1);
    };

    // Open the local store
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of streamix appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open local store: {}", e));
        }
    };

    // No request timeout: a hung fetch shows as a persistent loading
    // indicator, and reqwest imposes none by default.
    let http = reqwest::Client::new();
    let client = Arc::new(CatalogClient::new(
        http,
        config.api_base_url.clone(),
        SecretString::from(api_key),
    ));

    // Channels for background task completions
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    let (feed_tx, feed_rx) = mpsc::channel::<FeedEvent>(32);

    let mut app = App::new(db, client, config, feed_tx)
        .await
        .context("Failed to create application")?;

    // Load the default feed ("All" → trending) on startup
    app.feed.set_query(FeedQuery::default());

    ui::run(&mut app, event_tx, event_rx, feed_rx).await?;

    println!("Goodbye!");
    Ok(())
}
