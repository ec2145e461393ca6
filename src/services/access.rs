use crate::config::AccessConfig;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("an access code is required")]
    Missing,
    #[error("incorrect access code")]
    Incorrect,
}

/// Gates uploads and admin operations behind shared codes. A gate without a
/// configured code is open.
#[derive(Clone)]
pub struct AccessGate {
    key: [u8; 32],
    upload_tag: Option<Vec<u8>>,
    admin_tag: Option<Vec<u8>>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("upload_code", &self.upload_required())
            .field("admin_code", &self.admin_required())
            .finish()
    }
}

impl AccessGate {
    pub fn new(upload_code: Option<&str>, admin_code: Option<&str>) -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);

        let tag_for = |code: Option<&str>| {
            code.filter(|c| !c.is_empty())
                .map(|c| tag(&key, c.as_bytes()))
        };
        let upload_tag = tag_for(upload_code);
        let admin_tag = tag_for(admin_code);

        Self {
            key,
            upload_tag,
            admin_tag,
        }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(config.upload_code.as_deref(), config.admin_code.as_deref())
    }

    pub fn upload_required(&self) -> bool {
        self.upload_tag.is_some()
    }

    pub fn admin_required(&self) -> bool {
        self.admin_tag.is_some()
    }

    pub fn check_upload(&self, supplied: Option<&str>) -> Result<(), AccessError> {
        self.check(self.upload_tag.as_deref(), supplied)
    }

    pub fn check_admin(&self, supplied: Option<&str>) -> Result<(), AccessError> {
        self.check(self.admin_tag.as_deref(), supplied)
    }

    fn check(&self, expected: Option<&[u8]>, supplied: Option<&str>) -> Result<(), AccessError> {
        let Some(expected) = expected else {
            return Ok(());
        };
        let supplied = supplied
            .filter(|s| !s.is_empty())
            .ok_or(AccessError::Missing)?;

        // Comparing MACs keeps the comparison constant-time.
        let mut mac = match HmacSha256::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => return Err(AccessError::Incorrect),
        };
        mac.update(supplied.as_bytes());
        mac.verify_slice(expected)
            .map_err(|_| AccessError::Incorrect)
    }
}

fn tag(key: &[u8], code: &[u8]) -> Vec<u8> {
    match HmacSha256::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(code);
            mac.finalize().into_bytes().to_vec()
        }
        // HMAC accepts keys of any length.
        Err(_) => Vec::new(),
    }
}
