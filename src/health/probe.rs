// src/health/probe.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::probes::{
    BackupFreshnessProbe, FileFreshnessProbe, HttpStatusProbe, JsonFieldProbe, JsonRecordsProbe,
};
use super::{ProbeError, Vital};
use crate::config::CheckConfig;
use crate::storage::S3Client;

/// A single bounded check against one dependency.
///
/// Outcomes the probe can phrase itself (a bad status, a stale file) come
/// back as `Ok` vitals. Anything else is an `Err`, which the aggregator turns
/// into a failure vital so no dependency can fail the whole report.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> Result<Vital, ProbeError>;
}

/// Build the probe for one configured check. Reads storage credentials from
/// the environment; a missing variable is a start-up error.
pub fn build_probe(check: &CheckConfig) -> Result<Arc<dyn Probe>> {
    let probe: Arc<dyn Probe> = match check {
        CheckConfig::HttpStatus(config) => Arc::new(
            HttpStatusProbe::new(config).context("Failed to create HTTP client")?,
        ),
        CheckConfig::JsonField(config) => Arc::new(
            JsonFieldProbe::new(config).context("Failed to create HTTP client")?,
        ),
        CheckConfig::JsonRecords(config) => Arc::new(
            JsonRecordsProbe::new(config).context("Failed to create HTTP client")?,
        ),
        CheckConfig::FileFreshness(config) => Arc::new(FileFreshnessProbe::new(config)?),
        CheckConfig::BackupFreshness(config) => {
            let credentials = config.credentials()?;
            let client = S3Client::new(
                config.endpoint.clone(),
                config.region.clone(),
                credentials,
                config.timeout(),
            )
            .context("Failed to create storage client")?;
            Arc::new(BackupFreshnessProbe::new(config, Arc::new(client))?)
        }
    };
    Ok(probe)
}
