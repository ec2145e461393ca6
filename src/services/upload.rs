use crate::models::{NewPhoto, Photo};
use crate::services::catalog::{CatalogError, PhotoCatalog};
use crate::services::image::{self, ImageError};
use crate::services::storage::{self, StorageError, StoragePaths};
use crate::services::validate::{extension_of, ValidationError, Validator};
use crate::Config;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

const MAX_UPLOADER_NAME_CHARS: usize = 100;
const NAME_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] ImageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("photo '{0}' not found")]
    NotFound(String),
}

impl PhotoError {
    /// Problems with the submitted file rather than with the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PhotoError::Validation(_) | PhotoError::Decode(_))
    }
}

/// One file from an upload submission.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    /// Declared size. Can exceed `data.len()` when an oversized body was
    /// drained without being buffered.
    pub size: u64,
    pub data: Vec<u8>,
}

impl IncomingFile {
    pub fn new(original_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            original_name: original_name.into(),
            size: data.len() as u64,
            data,
        }
    }

    pub fn oversized(original_name: impl Into<String>, size: u64) -> Self {
        Self {
            original_name: original_name.into(),
            size,
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub original_name: String,
    pub reason: String,
}

/// Per-file results of one submission.
#[derive(Debug, Default, Serialize)]
pub struct UploadReport {
    pub saved: Vec<Photo>,
    pub rejected: Vec<Rejection>,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.rejected.is_empty() && !self.saved.is_empty()
    }

    /// Human-readable feedback for the gallery page.
    pub fn summary(&self) -> String {
        let saved = self.saved.len();
        let errors = self.rejected.len();
        let details = || {
            self.rejected
                .iter()
                .map(|r| format!("'{}': {}", r.original_name, r.reason))
                .collect::<Vec<_>>()
                .join("; ")
        };
        let photos = |n: usize| if n == 1 { "photo" } else { "photos" };

        match (saved, errors) {
            (0, 0) => "No files selected.".to_string(),
            (0, e) if e <= 3 => format!("Upload failed: {}", details()),
            (0, e) => format!("Upload failed: {} file(s) could not be uploaded.", e),
            (s, 0) => format!("Success! {} {} uploaded.", s, photos(s)),
            (s, e) if e <= 2 => format!("{} {} uploaded. Errors: {}", s, photos(s), details()),
            (s, e) => format!("{} {} uploaded. {} file(s) had problems.", s, photos(s), e),
        }
    }
}

/// Writes validated uploads to disk and records them in the catalog.
#[derive(Clone)]
pub struct PhotoStore {
    catalog: Arc<dyn PhotoCatalog>,
    paths: StoragePaths,
    validator: Validator,
    thumb_size: u32,
}

impl PhotoStore {
    pub fn new(
        catalog: Arc<dyn PhotoCatalog>,
        paths: StoragePaths,
        validator: Validator,
        thumb_size: u32,
    ) -> Self {
        Self {
            catalog,
            paths,
            validator,
            thumb_size,
        }
    }

    pub fn from_config(config: &Config, catalog: Arc<dyn PhotoCatalog>) -> Self {
        Self::new(
            catalog,
            StoragePaths::from_config(config),
            Validator::from_config(&config.upload),
            config.upload.thumb_size,
        )
    }

    pub fn catalog(&self) -> &dyn PhotoCatalog {
        self.catalog.as_ref()
    }

    pub fn catalog_handle(&self) -> &Arc<dyn PhotoCatalog> {
        &self.catalog
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Processes each file independently; one failure never aborts the rest.
    pub fn save_batch(&self, files: Vec<IncomingFile>, uploader_name: Option<&str>) -> UploadReport {
        let mut report = UploadReport::default();
        for file in files {
            match self.save(&file, uploader_name) {
                Ok(photo) => report.saved.push(photo),
                Err(e) => {
                    if e.is_client_error() {
                        tracing::info!("Rejected upload '{}': {}", file.original_name, e);
                    } else {
                        tracing::error!("Failed to store upload '{}': {}", file.original_name, e);
                    }
                    report.rejected.push(Rejection {
                        original_name: file.original_name,
                        reason: rejection_reason(&e),
                    });
                }
            }
        }
        report
    }

    pub fn save(&self, file: &IncomingFile, uploader_name: Option<&str>) -> Result<Photo, PhotoError> {
        self.validator.check(&file.original_name, file.size)?;
        let processed = image::process(&file.data, self.thumb_size)?;

        let now = Utc::now();
        let filename = self.claim_name(&file.original_name, now)?;
        let original_path = self.paths.original_path(&filename)?;
        if let Err(e) = storage::write_atomic(&original_path, &file.data) {
            self.discard_files(&filename, None);
            return Err(e.into());
        }

        let thumbnail = processed.thumbnail.and_then(|thumb| {
            let name = storage::thumbnail_name(&filename);
            let written = self
                .paths
                .thumbnail_path(&name)
                .and_then(|path| storage::write_atomic(&path, &thumb.data));
            match written {
                Ok(()) => Some(name),
                Err(e) => {
                    tracing::warn!("Storing '{}' without thumbnail: {}", filename, e);
                    None
                }
            }
        });

        let new_photo = NewPhoto {
            filename: filename.clone(),
            original_name: file.original_name.clone(),
            uploader_name: clean_uploader_name(uploader_name),
            created_at: now.to_rfc3339_opts(SecondsFormat::Micros, true),
            size_bytes: file.data.len() as i64,
            file_type: extension_of(&file.original_name),
            thumbnail: thumbnail.clone(),
        };

        match self.catalog.add(new_photo) {
            Ok(photo) => {
                tracing::info!(
                    "Stored '{}' as {} ({}x{})",
                    photo.original_name,
                    photo.filename,
                    processed.width,
                    processed.height
                );
                Ok(photo)
            }
            Err(e) => {
                self.discard_files(&filename, thumbnail.as_deref());
                Err(e.into())
            }
        }
    }

    /// Removes the catalog entry and both files. Unknown names report
    /// `NotFound`; files that are already gone are ignored.
    pub fn delete(&self, filename: &str) -> Result<Photo, PhotoError> {
        let not_found = || PhotoError::NotFound(filename.to_string());
        if !storage::is_safe_name(filename) {
            return Err(not_found());
        }

        let photo = self.catalog.get(filename)?.ok_or_else(not_found)?;

        storage::remove_if_exists(&self.paths.original_path(&photo.filename)?)?;
        let thumb = photo
            .thumbnail
            .clone()
            .unwrap_or_else(|| storage::thumbnail_name(&photo.filename));
        storage::remove_if_exists(&self.paths.thumbnail_path(&thumb)?)?;

        let removed = self.catalog.remove(filename)?.ok_or_else(not_found)?;
        tracing::info!("Deleted photo {}", removed.filename);
        Ok(removed)
    }

    /// Recreates thumbnails for photos that lack one. Returns how many were
    /// produced; photos whose original cannot be decoded are skipped.
    pub fn regenerate_thumbnails(&self) -> Result<usize, PhotoError> {
        let mut produced = 0;
        for photo in self.catalog.list()? {
            let present = match &photo.thumbnail {
                Some(name) => self.paths.thumbnail_path(name)?.is_file(),
                None => false,
            };
            if present {
                continue;
            }

            match self.rebuild_thumbnail(&photo) {
                Ok(name) => {
                    self.catalog.set_thumbnail(&photo.filename, Some(&name))?;
                    produced += 1;
                }
                Err(e) => {
                    tracing::warn!("No thumbnail for {}: {}", photo.filename, e);
                    if photo.thumbnail.is_some() {
                        self.catalog.set_thumbnail(&photo.filename, None)?;
                    }
                }
            }
        }
        Ok(produced)
    }

    fn rebuild_thumbnail(&self, photo: &Photo) -> Result<String, PhotoError> {
        let original_path = self.paths.original_path(&photo.filename)?;
        let data = std::fs::read(&original_path).map_err(|source| StorageError::Io {
            path: original_path.clone(),
            source,
        })?;
        let img = image::decode_oriented(&data)?;
        let thumb = image::generate_thumbnail(&img, self.thumb_size)?;

        let name = storage::thumbnail_name(&photo.filename);
        storage::write_atomic(&self.paths.thumbnail_path(&name)?, &thumb.data)?;
        Ok(name)
    }

    /// Reserves a fresh stored name by creating its file exclusively, so two
    /// uploads drawing the same name cannot overwrite each other.
    fn claim_name(&self, original_name: &str, now: chrono::DateTime<Utc>) -> Result<String, StorageError> {
        for _ in 0..NAME_ATTEMPTS {
            let name = storage::generate_stored_name(original_name, now);
            let thumb_taken = self
                .paths
                .thumbnail_path(&storage::thumbnail_name(&name))?
                .exists();
            if !thumb_taken && storage::claim(&self.paths.original_path(&name)?)? {
                return Ok(name);
            }
        }
        Err(StorageError::NameExhausted(original_name.to_string()))
    }

    fn discard_files(&self, filename: &str, thumbnail: Option<&str>) {
        let mut paths = vec![self.paths.original_path(filename)];
        if let Some(thumb) = thumbnail {
            paths.push(self.paths.thumbnail_path(thumb));
        }
        for path in paths.into_iter().flatten() {
            if let Err(e) = storage::remove_if_exists(&path) {
                tracing::warn!("Could not clean up {}: {}", path.display(), e);
            }
        }
    }
}

fn clean_uploader_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().take(MAX_UPLOADER_NAME_CHARS).collect())
}

fn rejection_reason(error: &PhotoError) -> String {
    match error {
        PhotoError::Validation(e) => e.to_string(),
        PhotoError::Decode(_) => "unsupported or corrupt image".to_string(),
        PhotoError::Storage(_) | PhotoError::Catalog(_) => "could not be saved".to_string(),
        PhotoError::NotFound(_) => error.to_string(),
    }
}
