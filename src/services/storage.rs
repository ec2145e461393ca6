use crate::Config;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid stored file name '{0}'")]
    InvalidName(String),
    #[error("could not generate an unused file name for '{0}'")]
    NameExhausted(String),
    #[error("thumbnail directory {} is the upload directory", .0.display())]
    SharedDirectory(PathBuf),
    #[error("storage I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Upload and thumbnail directories on disk.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    upload_dir: PathBuf,
    thumb_dir: PathBuf,
}

impl StoragePaths {
    pub fn new(upload_dir: impl Into<PathBuf>, thumb_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            thumb_dir: thumb_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.storage.upload_dir(), config.storage.thumb_dir())
    }

    /// Creates both directories. Fails when they resolve to the same place,
    /// since a `.jpg` original and its thumbnail share a file name.
    pub fn ensure(&self) -> Result<(), StorageError> {
        for dir in [&self.upload_dir, &self.thumb_dir] {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
        }
        if same_directory(&self.upload_dir, &self.thumb_dir) {
            return Err(StorageError::SharedDirectory(self.thumb_dir.clone()));
        }
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn thumb_dir(&self) -> &Path {
        &self.thumb_dir
    }

    pub fn original_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        checked_join(&self.upload_dir, name)
    }

    pub fn thumbnail_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        checked_join(&self.thumb_dir, name)
    }
}

/// Compares resolved paths when both exist, else their lexical form
/// without `.` components.
pub fn same_directory(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (a.canonicalize(), b.canonicalize()) {
        return a == b;
    }
    let lexical = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    lexical(a) == lexical(b)
}

/// Resolves `path` and returns it only if it is a regular file inside
/// `root`. `None` when either side cannot be resolved.
pub fn resolve_within(root: &Path, path: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let resolved = path.canonicalize().ok()?;
    (resolved.starts_with(&root) && resolved.is_file()).then_some(resolved)
}

fn checked_join(dir: &Path, name: &str) -> Result<PathBuf, StorageError> {
    if is_safe_name(name) {
        Ok(dir.join(name))
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

/// Stored names are flat, ASCII and never hidden or relative.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Lower-cased ASCII extension of a client-supplied file name.
pub fn sanitized_extension(original_name: &str) -> Option<String> {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
    let (_, ext) = base.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// `<yyyymmdd-HHMMSS>-<8 hex chars>.<ext>`
pub fn generate_stored_name(original_name: &str, now: DateTime<Utc>) -> String {
    let ext = sanitized_extension(original_name).unwrap_or_else(|| "jpg".to_string());
    let mut suffix = [0u8; 4];
    rand::thread_rng().fill(&mut suffix);
    format!(
        "{}-{}.{}",
        now.format("%Y%m%d-%H%M%S"),
        hex::encode(suffix),
        ext
    )
}

pub fn thumbnail_name(stored_name: &str) -> String {
    let stem = Path::new(stored_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(stored_name);
    format!("{}.jpg", stem)
}

/// Creates an empty placeholder at `path` unless something already exists
/// there. Returns whether this call claimed the name.
pub fn claim(path: &Path) -> Result<bool, StorageError> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Writes to a hidden temporary sibling, then renames into place so readers
/// never observe a partial file.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidName(path.display().to_string()))?;

    let mut token = [0u8; 4];
    rand::thread_rng().fill(&mut token);
    let tmp = dir.join(format!(".{}.tmp-{}", file_name, hex::encode(token)));

    std::fs::write(&tmp, data).map_err(|e| StorageError::io(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(StorageError::io(path, e));
    }
    Ok(())
}

/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> Result<bool, StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::io(path, e)),
    }
}
