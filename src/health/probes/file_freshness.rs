// src/health/probes/file_freshness.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tracing::debug;

use crate::config::FileFreshnessConfig;
use crate::health::elapsed::format_elapsed;
use crate::health::{Probe, ProbeError, Vital};

/// A local file was modified within the freshness window.
pub struct FileFreshnessProbe {
    name: String,
    path: PathBuf,
    display_name: String,
    window: Duration,
}

impl FileFreshnessProbe {
    pub fn new(config: &FileFreshnessConfig) -> Result<Self, ProbeError> {
        let window = Duration::from_std(config.window())
            .map_err(|err| ProbeError::Internal(format!("freshness window: {err}")))?;

        Ok(Self {
            name: format!("mtime {}", config.path.display()),
            path: config.path.clone(),
            display_name: config.display_name(),
            window,
        })
    }
}

#[async_trait]
impl Probe for FileFreshnessProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<Vital, ProbeError> {
        let modified = match tokio::fs::metadata(&self.path)
            .await
            .and_then(|meta| meta.modified())
        {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(err) => {
                debug!(path = %self.path.display(), %err, "cannot stat file");
                return Ok(Vital::failure(format!("unable to read {}", self.display_name)));
            }
        };

        let elapsed = Utc::now().signed_duration_since(modified);
        let detail = format!("last updated {} ago.", format_elapsed(elapsed));
        if elapsed < self.window {
            Ok(Vital::success(detail))
        } else {
            Ok(Vital::failure(detail))
        }
    }
}
