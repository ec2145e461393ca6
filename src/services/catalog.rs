use crate::models::{CatalogStats, NewPhoto, Photo};
use crate::Database;
use rusqlite::{ErrorCode, OptionalExtension, Row};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("photo '{0}' is already in the catalog")]
    Duplicate(String),
    #[error("catalog query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("catalog unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// The record set mapping stored files to their metadata.
///
/// Upload and gallery code only talk to this trait, so the backing store can
/// change without touching them.
pub trait PhotoCatalog: Send + Sync {
    fn add(&self, photo: NewPhoto) -> Result<Photo, CatalogError>;

    fn get(&self, filename: &str) -> Result<Option<Photo>, CatalogError>;

    /// Most recent first.
    fn list(&self) -> Result<Vec<Photo>, CatalogError>;

    /// Returns the removed entry, or `None` if nothing matched.
    fn remove(&self, filename: &str) -> Result<Option<Photo>, CatalogError>;

    fn stats(&self) -> Result<CatalogStats, CatalogError>;

    /// Used by thumbnail regeneration only. Returns whether an entry matched.
    fn set_thumbnail(&self, filename: &str, thumbnail: Option<&str>) -> Result<bool, CatalogError>;
}

const PHOTO_COLUMNS: &str =
    "id, filename, original_name, uploader_name, created_at, size_bytes, file_type, thumbnail";

pub struct SqliteCatalog {
    db: Database,
}

impl SqliteCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        uploader_name: row.get(3)?,
        created_at: row.get(4)?,
        size_bytes: row.get(5)?,
        file_type: row.get(6)?,
        thumbnail: row.get(7)?,
    })
}

impl PhotoCatalog for SqliteCatalog {
    fn add(&self, photo: NewPhoto) -> Result<Photo, CatalogError> {
        let conn = self.db.get()?;
        let inserted = conn.execute(
            "INSERT INTO photos (filename, original_name, uploader_name, created_at, size_bytes, file_type, thumbnail) VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                &photo.filename,
                &photo.original_name,
                &photo.uploader_name,
                &photo.created_at,
                photo.size_bytes,
                &photo.file_type,
                &photo.thumbnail,
            ),
        );

        match inserted {
            Ok(_) => Ok(photo.into_photo(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(CatalogError::Duplicate(photo.filename))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, filename: &str) -> Result<Option<Photo>, CatalogError> {
        let conn = self.db.get()?;
        let photo = conn
            .query_row(
                &format!("SELECT {} FROM photos WHERE filename = ?", PHOTO_COLUMNS),
                [filename],
                photo_from_row,
            )
            .optional()?;
        Ok(photo)
    }

    fn list(&self) -> Result<Vec<Photo>, CatalogError> {
        let conn = self.db.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM photos ORDER BY created_at DESC, id DESC",
            PHOTO_COLUMNS
        ))?;
        let photos = stmt
            .query_map([], photo_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    fn remove(&self, filename: &str) -> Result<Option<Photo>, CatalogError> {
        let mut conn = self.db.get()?;
        let tx = conn.transaction()?;
        let photo = tx
            .query_row(
                &format!("SELECT {} FROM photos WHERE filename = ?", PHOTO_COLUMNS),
                [filename],
                photo_from_row,
            )
            .optional()?;
        if photo.is_some() {
            tx.execute("DELETE FROM photos WHERE filename = ?", [filename])?;
        }
        tx.commit()?;
        Ok(photo)
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.db.get()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM photos",
            [],
            |row| {
                Ok(CatalogStats {
                    count: row.get(0)?,
                    total_bytes: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }

    fn set_thumbnail(&self, filename: &str, thumbnail: Option<&str>) -> Result<bool, CatalogError> {
        let conn = self.db.get()?;
        let updated = conn.execute(
            "UPDATE photos SET thumbnail = ? WHERE filename = ?",
            (thumbnail, filename),
        )?;
        Ok(updated > 0)
    }
}

/// Process-local catalog; contents are lost on restart.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    photos: Vec<Photo>,
    next_id: i64,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhotoCatalog for MemoryCatalog {
    fn add(&self, photo: NewPhoto) -> Result<Photo, CatalogError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.photos.iter().any(|p| p.filename == photo.filename) {
            return Err(CatalogError::Duplicate(photo.filename));
        }
        inner.next_id += 1;
        let photo = photo.into_photo(inner.next_id);
        inner.photos.push(photo.clone());
        Ok(photo)
    }

    fn get(&self, filename: &str) -> Result<Option<Photo>, CatalogError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.photos.iter().find(|p| p.filename == filename).cloned())
    }

    fn list(&self) -> Result<Vec<Photo>, CatalogError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut photos = inner.photos.clone();
        photos.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(photos)
    }

    fn remove(&self, filename: &str) -> Result<Option<Photo>, CatalogError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let index = inner.photos.iter().position(|p| p.filename == filename);
        Ok(index.map(|i| inner.photos.remove(i)))
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(CatalogStats {
            count: inner.photos.len() as i64,
            total_bytes: inner.photos.iter().map(|p| p.size_bytes).sum(),
        })
    }

    fn set_thumbnail(&self, filename: &str, thumbnail: Option<&str>) -> Result<bool, CatalogError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.photos.iter_mut().find(|p| p.filename == filename) {
            Some(photo) => {
                photo.thumbnail = thumbnail.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
