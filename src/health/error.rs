// src/health/error.rs
use super::report::Vital;
use crate::storage::StorageError;

/// Why a probe could not produce its own vital.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Connection Error")]
    Connection(#[source] reqwest::Error),

    #[error("Request Timed Out")]
    Timeout { note: Option<String> },

    #[error("response body is not JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("`{collection}` holds no records")]
    EmptyCollection { collection: String },

    #[error("no object under `{prefix}` matches `{pattern}`")]
    NoBackups { prefix: String, pattern: String },

    #[error(transparent)]
    Storage(StorageError),

    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("{0}")]
    Internal(String),
}

impl ProbeError {
    /// Sort a transport error into the classes the vitals distinguish.
    pub fn from_reqwest(err: reqwest::Error, timeout_note: Option<&str>) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout {
                note: timeout_note.map(str::to_string),
            }
        } else if err.is_connect() {
            ProbeError::Connection(err)
        } else {
            ProbeError::Http(err)
        }
    }

    /// The failure vital reported in place of the probe's own result.
    pub fn to_vital(&self) -> Vital {
        match self {
            ProbeError::Connection(_) => Vital::failure("Connection Error"),
            ProbeError::Timeout { note: Some(note) } => {
                Vital::failure(format!("Request Timed Out {note}"))
            }
            ProbeError::Timeout { note: None } => Vital::failure("Request Timed Out"),
            _ => Vital::failure("Unknown Error"),
        }
    }
}

impl From<StorageError> for ProbeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Http(err) => ProbeError::from_reqwest(err, None),
            other => ProbeError::Storage(other),
        }
    }
}
