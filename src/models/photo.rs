use serde::Serialize;

/// One stored guest photo. Created on upload, removed by an admin delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub id: i64,
    /// Unique stored name; doubles as the public identifier.
    pub filename: String,
    pub original_name: String,
    pub uploader_name: Option<String>,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub size_bytes: i64,
    pub file_type: Option<String>,
    /// Stored thumbnail name, absent when no thumbnail could be produced.
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub filename: String,
    pub original_name: String,
    pub uploader_name: Option<String>,
    pub created_at: String,
    pub size_bytes: i64,
    pub file_type: Option<String>,
    pub thumbnail: Option<String>,
}

impl NewPhoto {
    pub fn into_photo(self, id: i64) -> Photo {
        Photo {
            id,
            filename: self.filename,
            original_name: self.original_name,
            uploader_name: self.uploader_name,
            created_at: self.created_at,
            size_bytes: self.size_bytes,
            file_type: self.file_type,
            thumbnail: self.thumbnail,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub count: i64,
    pub total_bytes: i64,
}
