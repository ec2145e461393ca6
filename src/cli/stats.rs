use crate::services::gallery::{self, format_file_size};
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let (config, store) = super::open_store(config_path)?;
    let stats = gallery::stats(store.catalog())?;
    let without_thumbnail = gallery::list_photos(store.catalog())?
        .iter()
        .filter(|p| p.thumbnail.is_none())
        .count();

    println!("{}", config.site.title);
    println!("  Photos:            {}", stats.count);
    println!(
        "  Storage used:      {}",
        format_file_size(stats.total_bytes.max(0) as u64)
    );
    println!("  Without thumbnail: {}", without_thumbnail);
    println!("  Upload directory:  {}", store.paths().upload_dir().display());

    Ok(())
}
