// src/health/checker.rs
use crate::config::Config;
use crate::metrics::MetricsCollector;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::probe::{build_probe, Probe};
use super::report::{HealthReport, StatusGroup, Vital};

/// A named product and the probes that make up its vitals, in order.
pub struct ProbeGroup {
    pub name: String,
    pub probes: Vec<Arc<dyn Probe>>,
}

/// Runs every group of one profile and assembles the report.
pub struct Aggregator {
    profile: String,
    groups: Vec<ProbeGroup>,
    fan_out: bool,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Aggregator {
    pub fn new(profile: impl Into<String>, groups: Vec<ProbeGroup>, fan_out: bool) -> Self {
        Self {
            profile: profile.into(),
            groups,
            fan_out,
            metrics: None,
        }
    }

    /// Build the probes of the configured profile.
    pub fn from_config(config: &Config) -> Result<Self> {
        let profile = config.active_profile()?;
        let mut groups = Vec::with_capacity(profile.groups.len());

        for group in &profile.groups {
            let probes = group
                .checks
                .iter()
                .map(build_probe)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Failed to build probes for group `{}`", group.name))?;
            groups.push(ProbeGroup {
                name: group.name.clone(),
                probes,
            });
        }

        Ok(Self::new(config.profile.clone(), groups, config.fan_out))
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn report(&self) -> HealthReport {
        let span = info_span!(
            "health_report",
            profile = %self.profile,
            request_id = %Uuid::new_v4(),
        );

        async {
            let products = if self.fan_out {
                join_all(self.groups.iter().map(|group| self.run_group(group))).await
            } else {
                let mut products = Vec::with_capacity(self.groups.len());
                for group in &self.groups {
                    products.push(self.run_group(group).await);
                }
                products
            };

            let report = HealthReport { products };
            let unhealthy = report.unhealthy_groups();
            if let Some(metrics) = &self.metrics {
                metrics.record_report(&self.profile, unhealthy);
            }
            info!(
                groups = report.products.len(),
                unhealthy, "Health report assembled"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn run_group(&self, group: &ProbeGroup) -> StatusGroup {
        let vitals = if self.fan_out {
            join_all(
                group
                    .probes
                    .iter()
                    .map(|probe| self.run_probe(&group.name, probe.as_ref())),
            )
            .await
        } else {
            let mut vitals = Vec::with_capacity(group.probes.len());
            for probe in &group.probes {
                vitals.push(self.run_probe(&group.name, probe.as_ref()).await);
            }
            vitals
        };

        StatusGroup {
            name: group.name.clone(),
            vitals,
        }
    }

    async fn run_probe(&self, group: &str, probe: &dyn Probe) -> Vital {
        let start = Instant::now();

        let vital = match probe.check().await {
            Ok(vital) => vital,
            Err(err) => {
                warn!(group, probe = probe.name(), error = %err, "Probe could not complete");
                err.to_vital()
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_probe(group, probe.name(), vital.is_success(), start.elapsed());
        }
        if vital.is_success() {
            debug!(group, probe = probe.name(), %vital, "Probe passed");
        } else {
            warn!(group, probe = probe.name(), %vital, "Probe failed");
        }
        vital
    }
}
