use crate::config::{UploadConfig, MIB};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file selected")]
    MissingFilename,
    #[error("file type .{0} is not allowed")]
    DisallowedExtension(String),
    #[error("file is empty")]
    Empty,
    #[error("file too large ({} MB, limit {} MB)", mib(.size), mib(.max))]
    TooLarge { size: u64, max: u64 },
}

fn mib(bytes: &u64) -> String {
    let value = *bytes as f64 / MIB as f64;
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Checks a declared file name and byte size against the configured limits.
/// Content is not inspected here; decoding rejects spoofed files later.
#[derive(Debug, Clone)]
pub struct Validator {
    allowed_extensions: Vec<String>,
    max_bytes: u64,
}

impl Validator {
    pub fn new<I, S>(allowed_extensions: I, max_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(&config.allowed_extensions, config.max_upload_bytes())
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        extension_of(filename)
            .map(|ext| self.allowed_extensions.iter().any(|a| *a == ext))
            .unwrap_or(false)
    }

    pub fn check(&self, filename: &str, size: u64) -> Result<(), ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::MissingFilename);
        }
        if !self.is_allowed(filename) {
            let ext = extension_of(filename).unwrap_or_else(|| "unknown".to_string());
            return Err(ValidationError::DisallowedExtension(ext));
        }
        if size == 0 {
            return Err(ValidationError::Empty);
        }
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Value for the upload form's `accept` attribute.
    pub fn accept_attribute(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Text after the last `.`, lower-cased. `None` when there is no dot.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}
