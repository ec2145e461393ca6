use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let (_, store) = super::open_store(config_path)?;

    println!("Regenerating missing thumbnails...");
    let count = tokio::task::spawn_blocking(move || store.regenerate_thumbnails()).await??;
    println!("Created {} thumbnail(s).", count);

    Ok(())
}
