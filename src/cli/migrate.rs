use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.storage.database_path)?;

    println!("Running migrations...");
    db.migrate()?;
    println!("Catalog ready at {}", config.storage.database_path);

    Ok(())
}
