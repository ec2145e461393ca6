pub mod delete;
pub mod migrate;
pub mod rethumb;
pub mod serve;
pub mod stats;

use crate::services::catalog::{PhotoCatalog, SqliteCatalog};
use crate::services::upload::PhotoStore;
use crate::{Config, Database};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "wedding-photos")]
#[command(version)]
#[command(about = "Photo drop and gallery for wedding guests", long_about = None)]
pub struct Cli {
    /// Optional TOML file; environment variables override its values.
    #[arg(short, long, default_value = "wedding.toml", env = "WEDDING_PHOTOS_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server
    Serve {
        #[arg(short = 'H', long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create or upgrade the photo catalog
    Migrate,
    /// Print photo count and storage used
    Stats,
    /// Remove a photo and its thumbnail
    Delete { filename: String },
    /// Regenerate missing thumbnails
    Rethumb,
}

/// Loads configuration and opens the migrated SQLite catalog.
pub(crate) fn open_store(config_path: &Path) -> Result<(Config, PhotoStore)> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.storage.database_path)?;
    db.migrate()?;

    let catalog: Arc<dyn PhotoCatalog> = Arc::new(SqliteCatalog::new(db));
    let store = PhotoStore::from_config(&config, catalog);
    store.paths().ensure()?;
    Ok((config, store))
}
