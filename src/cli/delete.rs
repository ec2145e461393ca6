use crate::services::upload::PhotoError;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, filename: &str) -> Result<()> {
    let (_, store) = super::open_store(config_path)?;

    match store.delete(filename) {
        Ok(photo) => println!("Deleted {} ({})", photo.filename, photo.original_name),
        Err(PhotoError::NotFound(name)) => println!("No photo named '{}'", name),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
