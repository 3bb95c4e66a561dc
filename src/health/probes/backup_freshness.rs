// src/health/probes/backup_freshness.rs
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use std::sync::Arc;
use tracing::debug;

use crate::config::BackupFreshnessConfig;
use crate::health::elapsed::format_elapsed;
use crate::health::{Probe, ProbeError, Vital};
use crate::storage::ObjectLister;

/// The newest timestamped backup in a bucket is within the window.
pub struct BackupFreshnessProbe {
    name: String,
    lister: Arc<dyn ObjectLister>,
    bucket: String,
    prefix: String,
    pattern: String,
    window: Duration,
}

impl BackupFreshnessProbe {
    pub fn new(
        config: &BackupFreshnessConfig,
        lister: Arc<dyn ObjectLister>,
    ) -> Result<Self, ProbeError> {
        let window = Duration::from_std(config.window())
            .map_err(|err| ProbeError::Internal(format!("freshness window: {err}")))?;
        let prefix = format!("{}/", config.prefix.trim_end_matches('/'));

        Ok(Self {
            name: format!("s3://{}/{}", config.bucket, prefix),
            lister,
            bucket: config.bucket.clone(),
            pattern: format!("{prefix}{}", config.key_pattern),
            prefix,
            window,
        })
    }

    /// Backup time encoded in `key`, read as local time.
    fn key_time(&self, key: &str) -> Option<NaiveDateTime> {
        match NaiveDateTime::parse_from_str(key, &self.pattern) {
            Ok(time) => Some(time),
            Err(err) => {
                debug!(key, %err, "skipping object outside the backup naming scheme");
                None
            }
        }
    }
}

#[async_trait]
impl Probe for BackupFreshnessProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<Vital, ProbeError> {
        let keys = self
            .lister
            .list_keys(&self.bucket, &self.prefix, Some("/"))
            .await?;

        let last_backup = keys
            .iter()
            .filter(|key| !key.ends_with('/'))
            .filter_map(|key| self.key_time(key))
            .max()
            .ok_or_else(|| ProbeError::NoBackups {
                prefix: self.prefix.clone(),
                pattern: self.pattern.clone(),
            })?;

        let elapsed = Local::now().naive_local().signed_duration_since(last_backup);
        let detail = format!("last backed up {} ago", format_elapsed(elapsed));
        if elapsed < self.window {
            Ok(Vital::success(detail))
        } else {
            Ok(Vital::failure(detail))
        }
    }
}
