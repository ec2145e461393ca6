use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MIB: u64 = 1024 * 1024;

/// Process-wide settings, read once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Externally reachable URL used for QR codes and absolute links.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Signs flash cookies. A random key is generated when unset.
    #[serde(default = "default_secret_key", skip_serializing)]
    pub secret_key: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            public_base_url: None,
            secret_key: default_secret_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Defaults to `<upload_dir>/thumbs`.
    #[serde(default)]
    pub thumb_dir: Option<String>,
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            thumb_dir: None,
            database_path: default_database_path(),
        }
    }
}

impl StorageConfig {
    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.upload_dir)
    }

    pub fn thumb_dir(&self) -> PathBuf {
        match &self.thumb_dir {
            Some(dir) => PathBuf::from(dir),
            None => self.upload_dir().join("thumbs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Per-file limit in MiB.
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,
    /// Limit for a whole multipart submission in MiB.
    #[serde(default = "default_max_request_size_mb")]
    pub max_request_size_mb: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Longer edge of generated thumbnails, in pixels.
    #[serde(default = "default_thumb_size")]
    pub thumb_size: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size_mb(),
            max_request_size_mb: default_max_request_size_mb(),
            allowed_extensions: default_allowed_extensions(),
            thumb_size: default_thumb_size(),
        }
    }
}

impl UploadConfig {
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(MIB)
    }

    pub fn max_request_bytes(&self) -> usize {
        usize::try_from(self.max_request_size_mb.saturating_mul(MIB)).unwrap_or(usize::MAX)
    }
}

/// Shared secrets. `None` disables the corresponding check.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccessConfig {
    #[serde(default, skip_serializing)]
    pub upload_code: Option<String>,
    #[serde(default, skip_serializing)]
    pub admin_code: Option<String>,
}

fn default_title() -> String {
    "Share Our Wedding Photos".to_string()
}

fn default_secret_key() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_database_path() -> String {
    "uploads.db".to_string()
}

fn default_max_upload_size_mb() -> u64 {
    32
}

fn default_max_request_size_mb() -> u64 {
    512
}

fn default_allowed_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_thumb_size() -> u32 {
    640
}

impl Config {
    /// Reads the optional TOML file, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Could not read config file '{}': {}", path.display(), e)
            })?;
            toml::from_str(&content)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults and environment",
                path.display()
            );
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from environment-style variables. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = var(&["SECRET_KEY", "FLASK_SECRET"]) {
            self.site.secret_key = v;
        }
        if let Some(v) = var(&["TITLE"]) {
            self.site.title = v;
        }
        if let Some(v) = var(&["PUBLIC_BASE_URL"]) {
            self.site.public_base_url = Some(v);
        }
        if let Some(v) = var(&["DEBUG"]) {
            self.server.debug = matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes");
        }
        if let Some(v) = var(&["HOST"]) {
            self.server.host = v;
        }
        if let Some(v) = var(&["PORT"]) {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = var(&["UPLOAD_DIR"]) {
            self.storage.upload_dir = v;
        }
        if let Some(v) = var(&["THUMB_DIR"]) {
            self.storage.thumb_dir = Some(v);
        }
        if let Some(v) = var(&["DB_PATH"]) {
            self.storage.database_path = v;
        }
        if let Some(v) = var(&["MAX_CONTENT_LENGTH_MB", "MAX_UPLOAD_MB"]) {
            self.upload.max_upload_size_mb = parse_var("MAX_CONTENT_LENGTH_MB", &v)?;
        }
        if let Some(v) = var(&["MAX_REQUEST_MB"]) {
            self.upload.max_request_size_mb = parse_var("MAX_REQUEST_MB", &v)?;
        }
        if let Some(v) = var(&["THUMB_SIZE"]) {
            self.upload.thumb_size = parse_var("THUMB_SIZE", &v)?;
        }
        if let Some(v) = var(&["UPLOAD_CODE"]) {
            self.access.upload_code = Some(v);
        }
        if let Some(v) = var(&["ADMIN_TOKEN", "ADMIN_CODE"]) {
            self.access.admin_code = Some(v);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.upload.max_upload_size_mb == 0 {
            bail!("upload.max_upload_size_mb must be greater than 0");
        }
        if self.upload.max_request_size_mb < self.upload.max_upload_size_mb {
            bail!("upload.max_request_size_mb must be at least upload.max_upload_size_mb");
        }
        if self.upload.thumb_size == 0 {
            bail!("upload.thumb_size must be greater than 0");
        }
        if self.upload.thumb_size > 8192 {
            bail!("upload.thumb_size must be 8192 or less");
        }
        if self.upload.allowed_extensions.is_empty() {
            bail!("upload.allowed_extensions must not be empty");
        }
        if let Some(ext) = self
            .upload
            .allowed_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains('.'))
        {
            bail!("Invalid extension '{}' in upload.allowed_extensions", ext);
        }
        if crate::services::storage::same_directory(
            &self.storage.upload_dir(),
            &self.storage.thumb_dir(),
        ) {
            bail!("storage.thumb_dir must differ from storage.upload_dir");
        }
        if self.site.secret_key.is_empty() {
            bail!("site.secret_key must not be empty");
        }
        if let Some(base) = &self.site.public_base_url {
            let parsed = url::Url::parse(base)
                .map_err(|e| anyhow::anyhow!("Invalid public_base_url '{}': {}", base, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("public_base_url must use http or https, got '{}'", parsed.scheme());
            }
        }
        Ok(())
    }

    pub fn upload_code_required(&self) -> bool {
        self.access
            .upload_code
            .as_deref()
            .is_some_and(|code| !code.is_empty())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", value, key, e))
}
