//
// src/storage/mod.rs
//
mod s3;
mod signing;

pub use s3::S3Client;

use async_trait::async_trait;
use std::fmt;

/// Read-only view of an object store: the key names under a prefix.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<Vec<String>, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage responded with {status}: {code}")]
    Status { status: u16, code: String },

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("invalid listing pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_secret() {
        let credentials = Credentials::new("AKIDEXAMPLE", "very-secret");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("AKIDEXAMPLE"));
        assert!(!rendered.contains("very-secret"));
    }
}
