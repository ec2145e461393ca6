use crate::models::{CatalogStats, Photo};
use crate::services::catalog::{CatalogError, PhotoCatalog};
use serde::Serialize;

/// Entry of the public listing API.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoListing {
    pub filename: String,
    pub url: String,
    pub thumb: Option<String>,
    pub orig_name: String,
    pub uploader_name: Option<String>,
    pub created_at: String,
    pub file_size: i64,
    pub file_type: Option<String>,
}

pub fn list_photos(catalog: &dyn PhotoCatalog) -> Result<Vec<Photo>, CatalogError> {
    catalog.list()
}

pub fn stats(catalog: &dyn PhotoCatalog) -> Result<CatalogStats, CatalogError> {
    catalog.stats()
}

pub fn original_url(base_url: &str, filename: &str) -> String {
    format!("{}/uploads/{}", base_url.trim_end_matches('/'), filename)
}

pub fn thumbnail_url(base_url: &str, thumbnail: &str) -> String {
    format!("{}/thumbs/{}", base_url.trim_end_matches('/'), thumbnail)
}

pub fn listing(photos: Vec<Photo>, base_url: &str) -> Vec<PhotoListing> {
    photos
        .into_iter()
        .map(|photo| PhotoListing {
            url: original_url(base_url, &photo.filename),
            thumb: photo
                .thumbnail
                .as_deref()
                .map(|t| thumbnail_url(base_url, t)),
            filename: photo.filename,
            orig_name: photo.original_name,
            uploader_name: photo.uploader_name,
            created_at: photo.created_at,
            file_size: photo.size_bytes,
            file_type: photo.file_type,
        })
        .collect()
}

pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
